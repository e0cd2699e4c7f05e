//! Application state and the message loop controller.
//!
//! [`App`] is the single owner of the connection, the stored snapshot and
//! the painted surface. All mutation happens in [`App::handle`], one
//! [`AppEvent`] at a time, so a snapshot replacement and the render pass it
//! triggers complete before any timer or fetch result is looked at.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::{ConnectionManager, ConnectionPhase};
use crate::data::{
    CategoryView, ComponentCard, DashboardView, PodFetchOutcome, PodFetcher, PodStateReport,
    SnapshotStore,
};
use crate::error::FetchError;
use crate::source::{Category, ChannelEvent, LiveChannel};
use crate::ui::detail::AgentDetail;
use crate::ui::{Hitbox, Surface, Theme};

/// The timers driving periodic work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Advances the staleness label.
    Display,
    /// Asks the producer for a fresh snapshot.
    Refresh,
}

/// Every message the controller reacts to.
#[derive(Debug)]
pub enum AppEvent {
    Channel(ChannelEvent),
    Tick(TimerKind),
    PodsFetched {
        generation: u64,
        report: PodStateReport,
    },
    PodsFetchFailed {
        generation: u64,
        error: FetchError,
    },
    RefreshRequested,
}

impl From<PodFetchOutcome> for AppEvent {
    fn from(outcome: PodFetchOutcome) -> Self {
        match outcome.result {
            Ok(report) => AppEvent::PodsFetched {
                generation: outcome.generation,
                report,
            },
            Err(error) => AppEvent::PodsFetchFailed {
                generation: outcome.generation,
                error,
            },
        }
    }
}

/// A fixed-interval timer polled by the main loop.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    last: Instant,
}

impl Ticker {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    /// True once per elapsed interval. Missed ticks are not replayed.
    pub fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// A cloneable "refresh now" entry point usable from anywhere.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl RefreshHandle {
    /// Queue a refresh. Returns false once the dashboard has exited.
    pub fn refresh(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Which list the arrow keys move through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Agents,
    Telemetry,
}

impl Focus {
    pub fn toggle(self) -> Self {
        match self {
            Focus::Agents => Focus::Telemetry,
            Focus::Telemetry => Focus::Agents,
        }
    }

    fn category(self) -> Category {
        match self {
            Focus::Agents => Category::Agents,
            Focus::Telemetry => Category::Telemetry,
        }
    }
}

/// Launches an external link in the platform's default handler.
pub type LinkOpener = fn(&str) -> io::Result<()>;

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    connection: ConnectionManager,
    store: SnapshotStore,
    pub surface: Surface,

    pods: Option<PodFetcher>,
    pod_results: Option<mpsc::UnboundedReceiver<PodFetchOutcome>>,
    last_pod_generation: u64,

    refresh_tx: mpsc::UnboundedSender<()>,
    refresh_rx: mpsc::UnboundedReceiver<()>,
    display_timer: Ticker,
    refresh_timer: Ticker,

    // Interaction
    pub focus: Focus,
    pub selected_agent: usize,
    pub selected_telemetry: usize,
    detail_agent: Option<String>,
    pub hitboxes: Vec<Hitbox>,
    opener: LinkOpener,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an app around a live channel with the default 1s/10s timers.
    pub fn new(channel: Box<dyn LiveChannel>) -> Self {
        let now = Instant::now();
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        Self {
            running: true,
            show_help: false,
            connection: ConnectionManager::new(channel),
            store: SnapshotStore::new(),
            surface: Surface::new(),
            pods: None,
            pod_results: None,
            last_pod_generation: 0,
            refresh_tx,
            refresh_rx,
            display_timer: Ticker::new(Duration::from_secs(1), now),
            refresh_timer: Ticker::new(Duration::from_secs(10), now),
            focus: Focus::Agents,
            selected_agent: 0,
            selected_telemetry: 0,
            detail_agent: None,
            hitboxes: Vec::new(),
            opener: open_with_platform,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    /// Attach the pod-status side channel.
    pub fn with_pod_fetcher(
        mut self,
        fetcher: PodFetcher,
        results: mpsc::UnboundedReceiver<PodFetchOutcome>,
    ) -> Self {
        self.pods = Some(fetcher);
        self.pod_results = Some(results);
        self
    }

    /// Override the display and refresh intervals.
    pub fn with_intervals(mut self, display: Duration, refresh: Duration) -> Self {
        let now = Instant::now();
        self.display_timer = Ticker::new(display, now);
        self.refresh_timer = Ticker::new(refresh, now);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_link_opener(mut self, opener: LinkOpener) -> Self {
        self.opener = opener;
        self
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        RefreshHandle {
            tx: self.refresh_tx.clone(),
        }
    }

    pub fn phase(&self) -> &ConnectionPhase {
        self.connection.phase()
    }

    /// Returns a description of the live channel.
    pub fn source_description(&self) -> &str {
        self.connection.description()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Collect every pending message without blocking: channel events,
    /// finished pod fetches, refresh requests and due timers, in that order.
    pub fn poll_events(&mut self, now: Instant) -> Vec<AppEvent> {
        let mut events = Vec::new();

        while let Some(event) = self.connection.poll() {
            events.push(AppEvent::Channel(event));
        }
        if let Some(results) = self.pod_results.as_mut() {
            while let Ok(outcome) = results.try_recv() {
                events.push(outcome.into());
            }
        }
        while self.refresh_rx.try_recv().is_ok() {
            events.push(AppEvent::RefreshRequested);
        }
        if self.display_timer.due(now) {
            events.push(AppEvent::Tick(TimerKind::Display));
        }
        if self.refresh_timer.due(now) {
            events.push(AppEvent::Tick(TimerKind::Refresh));
        }

        events
    }

    /// Process one message to completion.
    pub fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::Channel(event) => {
                if let Some(raw) = self.connection.handle_event(event) {
                    self.store.apply_snapshot(&raw);
                    self.render_pass();
                }
            }
            AppEvent::Tick(TimerKind::Display) => {
                self.surface.refresh_staleness(&self.store, Instant::now());
            }
            AppEvent::Tick(TimerKind::Refresh) => {
                self.connection.request_snapshot();
            }
            AppEvent::PodsFetched { generation, report } => {
                if generation > self.last_pod_generation {
                    self.last_pod_generation = generation;
                    self.surface.paint_pods(report);
                } else {
                    debug!(
                        "Ignoring pod states from pass {} (showing pass {})",
                        generation, self.last_pod_generation
                    );
                }
            }
            AppEvent::PodsFetchFailed { generation, error } => {
                warn!("Error fetching pod states for pass {}: {}", generation, error);
            }
            AppEvent::RefreshRequested => self.refresh(),
        }
    }

    /// Full render pass for the stored snapshot.
    fn render_pass(&mut self) {
        let Some(view) = DashboardView::project(&self.store) else {
            return;
        };
        let pass = self.surface.paint(view);
        self.surface.refresh_staleness(&self.store, Instant::now());
        self.clamp_selection();

        if let Some(fetcher) = &self.pods {
            fetcher.dispatch(pass);
        }
    }

    /// Manual refresh; skipped when not connected.
    pub fn refresh(&mut self) {
        if self.connection.request_snapshot() {
            info!("Manual refresh requested");
            self.set_status_message("Refresh requested".to_string());
        } else {
            self.set_status_message(format!("Not connected ({})", self.phase().label()));
        }
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Cards of one category in the painted view.
    pub fn cards(&self, category: Category) -> &[ComponentCard] {
        self.surface
            .view()
            .and_then(|v| v.category(category))
            .map(CategoryView::cards)
            .unwrap_or(&[])
    }

    /// Agents in display order.
    pub fn agent_cards(&self) -> &[ComponentCard] {
        self.cards(Category::Agents)
    }

    /// Telemetry items in display order.
    pub fn telemetry_cards(&self) -> &[ComponentCard] {
        self.cards(Category::Telemetry)
    }

    fn clamp_selection(&mut self) {
        self.selected_agent = self
            .selected_agent
            .min(self.agent_cards().len().saturating_sub(1));
        self.selected_telemetry = self
            .selected_telemetry
            .min(self.telemetry_cards().len().saturating_sub(1));
    }

    pub fn toggle_focus(&mut self) {
        self.focus = self.focus.toggle();
    }

    /// Move selection down by one item in the focused list.
    pub fn select_next(&mut self) {
        let count = self.cards(self.focus.category()).len();
        let selected = self.selected_mut();
        *selected = (*selected + 1).min(count.saturating_sub(1));
        self.show_agent_tooltip();
    }

    /// Move selection up by one item in the focused list.
    pub fn select_prev(&mut self) {
        let selected = self.selected_mut();
        *selected = selected.saturating_sub(1);
        self.show_agent_tooltip();
    }

    /// Agents show their hover text when selected.
    fn show_agent_tooltip(&mut self) {
        if self.focus == Focus::Agents {
            self.show_tooltip(Category::Agents, self.selected_agent);
        }
    }

    fn selected_mut(&mut self) -> &mut usize {
        match self.focus {
            Focus::Agents => &mut self.selected_agent,
            Focus::Telemetry => &mut self.selected_telemetry,
        }
    }

    /// Enter on the focused list: agent details or the telemetry link.
    pub fn activate_selected(&mut self) {
        match self.focus {
            Focus::Agents => {
                if let Some(name) = self.agent_cards().get(self.selected_agent).map(|c| c.name.clone())
                {
                    self.open_agent_detail(&name);
                }
            }
            Focus::Telemetry => {
                let url = self
                    .telemetry_cards()
                    .get(self.selected_telemetry)
                    .and_then(|c| c.url.clone());
                match url {
                    Some(url) => self.open_link(&url),
                    None => self.set_status_message("No link for this item".to_string()),
                }
            }
        }
    }

    /// Focus the telemetry list on row `index` and follow its link.
    pub fn click_telemetry(&mut self, index: usize) {
        if index >= self.telemetry_cards().len() {
            return;
        }
        self.focus = Focus::Telemetry;
        self.selected_telemetry = index;
        self.activate_selected();
    }

    /// Show a component's hover text in the status bar.
    pub fn show_tooltip(&mut self, category: Category, index: usize) {
        if let Some(tooltip) = self.cards(category).get(index).map(|c| c.tooltip.clone()) {
            self.set_status_message(tooltip);
        }
    }

    /// Show the detail overlay for an agent, looked up by display name.
    pub fn open_agent_detail(&mut self, name: &str) {
        if let Some(index) = self.agent_cards().iter().position(|c| c.name == name) {
            self.selected_agent = index;
            self.show_tooltip(Category::Agents, index);
        }
        if self.agent_detail_for(name).is_some() {
            self.detail_agent = Some(name.to_string());
        }
    }

    fn agent_detail_for(&self, name: &str) -> Option<AgentDetail> {
        let agent = self.store.current()?.agents.find_by_name(name)?;
        Some(AgentDetail::from_component(agent))
    }

    /// Details of the agent in the overlay, read from the stored snapshot.
    pub fn agent_detail(&self) -> Option<AgentDetail> {
        self.agent_detail_for(self.detail_agent.as_deref()?)
    }

    pub fn detail_open(&self) -> bool {
        self.detail_agent.is_some()
    }

    /// Close the detail overlay if open.
    pub fn close_overlay(&mut self) {
        self.detail_agent = None;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Open an external link.
    pub fn open_link(&mut self, url: &str) {
        match (self.opener)(url) {
            Ok(()) => self.set_status_message(format!("Opened {}", url)),
            Err(e) => {
                warn!("Failed to open {}: {}", url, e);
                self.set_status_message(format!("Could not open {}: {}", url, e));
            }
        }
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the painted dashboard to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let Some(view) = self.surface.view() else {
            anyhow::bail!("No data to export");
        };
        write_export(path, view, self.surface.pods())
    }
}

/// JSON summary of a projected dashboard.
pub fn export_summary(view: &DashboardView, pods: Option<&PodStateReport>) -> Value {
    let categories: serde_json::Map<String, Value> = view
        .categories
        .iter()
        .map(|(category, listing)| {
            let value = match listing {
                CategoryView::Empty { message } => json!({ "empty": message }),
                CategoryView::Components { cards } => json!(cards),
            };
            (category.key().to_string(), value)
        })
        .collect();

    json!({
        "health": {
            "percent": view.health.percent,
            "band": view.health.band.map(|b| b.label()),
            "breathing": view.health.breathing,
            "total_pods": view.health.total_pods,
            "ready_pods": view.health.ready_pods,
            "failing_pods": view.health.failing_pods,
        },
        "components": categories,
        "traffic": {
            "request_rate": view.connectivity.request_rate,
            "error_rate": view.connectivity.error_rate,
            "active_flows": view.connectivity.active_flows,
            "top_flows": view.top_flows,
        },
        "problematic_pods": pods.map(|p| &p.problematic_pods),
        "pod_summary": pods.and_then(|p| p.summary.as_ref()),
    })
}

/// Write [`export_summary`] as pretty JSON.
pub fn write_export(path: &Path, view: &DashboardView, pods: Option<&PodStateReport>) -> Result<()> {
    let json = serde_json::to_string_pretty(&export_summary(view, pods))?;
    std::fs::write(path, json)?;
    Ok(())
}

fn open_with_platform(url: &str) -> io::Result<()> {
    spawn_reaped(platform_opener(url)).map(|_| ())
}

fn platform_opener(url: &str) -> Command {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    command
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

/// Start `command` and wait for it on a background thread, so the finished
/// child never lingers as a zombie.
fn spawn_reaped(mut command: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command.spawn()?;
    Ok(thread::spawn(move || child.wait()))
}
