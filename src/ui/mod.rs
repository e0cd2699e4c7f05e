//! Terminal UI rendering using ratatui.
//!
//! Every panel reads from the [`Surface`], never from the raw snapshot, so a
//! frame always shows one consistent render pass.
//!
//! ## Submodules
//!
//! - [`components`]: Agent field and the per-category panels
//! - [`traffic`]: Traffic overview, ranked flows, agent-to-agent overlay
//! - [`health`]: Cluster health gauge
//! - [`pods`]: Problematic pods list
//! - [`detail`]: Modal overlay with one agent's details
//! - [`common`]: Shared components (header, status bar, help overlay)
//! - [`surface`]: The painted regions the frame is drawn from
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Header (common::render_header)                           │
//! ├─────────────────────────────────┬────────────────────────┤
//! │                                 │ health::render_health  │
//! │ Agents                          ├────────────────────────┤
//! │ (components::render_agents,     │ traffic::render_traffic│
//! │  then traffic::render_flow_     ├────────────────────────┤
//! │  overlay on top)                │ pods::render_pods      │
//! ├──────────┬──────────┬───────────┼────────────────────────┤
//! │ Ingress  │ Models   │ Memory    │ Telemetry              │
//! ├──────────┴──────────┴───────────┴────────────────────────┤
//! │ Status Bar (common::render_status_bar)                   │
//! └──────────────────────────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - detail::render_overlay
//!    - common::render_help
//! ```

pub mod common;
pub mod components;
pub mod detail;
pub mod health;
pub mod pods;
pub mod surface;
pub mod theme;
pub mod traffic;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

pub use surface::Surface;
pub use theme::Theme;

use crate::app::{App, Focus};
use crate::data::project_flow_edges;
use crate::source::Category;

/// Minimum terminal size for usable display.
pub const MIN_WIDTH: u16 = 80;
pub const MIN_HEIGHT: u16 = 24;

/// What a mouse click on a hitbox refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    /// An agent node, by display name.
    Agent(String),
    /// A telemetry row, by index.
    Telemetry(usize),
    /// A row in one of the other category panels.
    Component(Category, usize),
}

/// A clickable screen region recorded while drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Hitbox {
    pub area: Rect,
    pub target: HitTarget,
}

impl Hitbox {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.area.x
            && column < self.area.x.saturating_add(self.area.width)
            && row >= self.area.y
            && row < self.area.y.saturating_add(self.area.height)
    }
}

/// Where each panel goes on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regions {
    pub header: Rect,
    pub agents: Rect,
    pub health: Rect,
    pub traffic: Rect,
    pub pods: Rect,
    pub ingress: Rect,
    pub models: Rect,
    pub memory: Rect,
    pub telemetry: Rect,
    pub status: Rect,
}

impl Regions {
    /// At the minimum size the side column is filled exactly.
    pub fn split(area: Rect) -> Self {
        let [header, body, status] = Layout::vertical([
            Constraint::Length(1), // Header bar
            Constraint::Min(10),   // Panels
            Constraint::Length(1), // Status bar
        ])
        .areas(area);

        let [top, bottom] =
            Layout::vertical([Constraint::Min(8), Constraint::Length(6)]).areas(body);
        let [agents, side] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(top);
        let [health, traffic, pods] = Layout::vertical([
            Constraint::Length(5),
            Constraint::Min(5),
            Constraint::Length(6),
        ])
        .areas(side);
        let [ingress, models, memory, telemetry] = Layout::horizontal([
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(40),
        ])
        .areas(bottom);

        Self {
            header,
            agents,
            health,
            traffic,
            pods,
            ingress,
            models,
            memory,
            telemetry,
            status,
        }
    }
}

/// Draw one full frame and return the clickable regions it produced.
pub fn draw(frame: &mut Frame, app: &App) -> Vec<Hitbox> {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5)
            .intersection(area);
        frame.render_widget(paragraph, centered);
        return Vec::new();
    }

    let Regions {
        header: header_area,
        agents: agents_area,
        health: health_area,
        traffic: traffic_area,
        pods: pods_area,
        ingress: ingress_area,
        models: models_area,
        memory: memory_area,
        telemetry: telemetry_area,
        status: status_area,
    } = Regions::split(area);

    common::render_header(frame, app, header_area);

    let view = app.surface.view();
    let listing = |category: Category| view.and_then(|v| v.category(category));
    let theme = &app.theme;

    // Agents first: the overlay needs to know where they landed
    let agent_selection = (app.focus == Focus::Agents).then_some(app.selected_agent);
    let layout = components::render_agents(
        frame,
        agents_area,
        listing(Category::Agents),
        agent_selection,
        theme,
    );
    if let Some(view) = view {
        let edges = project_flow_edges(&view.flows, &layout.positions);
        traffic::render_flow_overlay(frame, &layout, &edges, theme);
    }

    let mut hitboxes = layout.hitboxes;
    for (category, panel_area) in [
        (Category::Ingress, ingress_area),
        (Category::Models, models_area),
        (Category::MemorySystems, memory_area),
    ] {
        hitboxes.extend(components::render_category(
            frame,
            panel_area,
            category,
            listing(category),
            None,
            theme,
        ));
    }
    let telemetry_selection = (app.focus == Focus::Telemetry).then_some(app.selected_telemetry);
    hitboxes.extend(components::render_category(
        frame,
        telemetry_area,
        Category::Telemetry,
        listing(Category::Telemetry),
        telemetry_selection,
        theme,
    ));

    health::render_health(frame, health_area, view.map(|v| &v.health), theme);
    traffic::render_traffic(
        frame,
        traffic_area,
        view.map(|v| &v.connectivity),
        view.map(|v| v.top_flows.as_slice()).unwrap_or(&[]),
        theme,
    );
    pods::render_pods(frame, pods_area, app.surface.pods(), theme);

    common::render_status_bar(frame, app, status_area);

    if app.detail_open() {
        detail::render_overlay(frame, app, area);
    }
    if app.show_help {
        common::render_help(frame, app, area);
    }

    hitboxes
}
