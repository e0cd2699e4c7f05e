use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use sanctuary_watch::app::{write_export, App, RefreshHandle};
use sanctuary_watch::config::{Overrides, Settings};
use sanctuary_watch::data::{DashboardView, HttpPodStatusClient, PodFetcher, SnapshotStore};
use sanctuary_watch::source::{FileSource, LiveChannel, StreamChannel, WebSocketChannel};
use sanctuary_watch::ui::Theme;
use sanctuary_watch::{events, logging, ui};

#[derive(Parser, Debug)]
#[command(name = "sanctuary-watch")]
#[command(about = "Live terminal dashboard for a sanctuary agent cluster")]
struct Args {
    /// WebSocket endpoint of the snapshot producer
    #[arg(short, long, conflicts_with_all = ["connect", "file"])]
    url: Option<String>,

    /// Connect to a TCP endpoint for newline-delimited snapshots (host:port)
    #[arg(short, long, conflicts_with_all = ["url", "file"])]
    connect: Option<String>,

    /// Replay a snapshot JSON file instead of a live endpoint
    #[arg(short, long, conflicts_with_all = ["url", "connect"])]
    file: Option<PathBuf>,

    /// Root of the HTTP API serving /api/pod-states
    #[arg(long)]
    api_base: Option<String>,

    /// Do not fetch problematic pods
    #[arg(long)]
    no_pods: bool,

    /// Snapshot refresh interval (e.g. "10s")
    #[arg(short, long)]
    refresh: Option<String>,

    /// Staleness label update interval (e.g. "1s")
    #[arg(long)]
    tick: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Color theme: auto, dark or light
    #[arg(long)]
    theme: Option<String>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Export the dashboard state of --file to JSON and exit
    #[arg(short, long, requires = "file")]
    export: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            endpoint: self.url.clone(),
            api_base: self.api_base.clone(),
            pods_enabled: self.no_pods.then_some(false),
            refresh_interval: self.refresh.clone(),
            display_interval: self.tick.clone(),
            theme: self.theme.clone(),
            log_file: self
                .log_file
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref(), &args.overrides())?;
    logging::init(&settings.log_level, settings.log_file.as_deref())?;

    // Handle export mode (non-interactive)
    if let (Some(export_path), Some(file)) = (&args.export, &args.file) {
        return export_to_file(file, export_path);
    }

    // The live channels and pod fetches run on this runtime while the UI
    // loop stays on the main thread
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let channel: Box<dyn LiveChannel> = if let Some(path) = &args.file {
        Box::new(FileSource::new(path))
    } else if let Some(addr) = &args.connect {
        Box::new(StreamChannel::connect_tcp(addr))
    } else {
        Box::new(WebSocketChannel::connect(&settings.endpoint))
    };
    info!("Watching {}", channel.description());

    let mut app = App::new(channel)
        .with_intervals(settings.display_interval, settings.refresh_interval)
        .with_theme(Theme::from_choice(settings.theme));

    if settings.pods_enabled {
        let client = HttpPodStatusClient::new(&settings.api_base, settings.request_timeout)?;
        info!("Fetching pod states from {}", client.url());
        let (fetcher, results) = PodFetcher::new(Arc::new(client), runtime.handle().clone());
        app = app.with_pod_fetcher(fetcher, results);
    }

    #[cfg(unix)]
    refresh_on_signal(app.refresh_handle())?;

    run_tui(&mut app)
}

/// SIGUSR1 asks for a fresh snapshot, like pressing `r`.
#[cfg(unix)]
fn refresh_on_signal(handle: RefreshHandle) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = signal(SignalKind::user_defined1())?;
    tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            if !handle.refresh() {
                break;
            }
        }
    });
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    // Run the main loop
    let result = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        // Draw UI, keeping the clickable regions for the next mouse event
        terminal.draw(|frame| {
            let hitboxes = ui::draw(frame, app);
            app.hitboxes = hitboxes;
        })?;

        // Poll for terminal events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Channel events, pod fetches, refresh requests, timers
        for event in app.poll_events(Instant::now()) {
            app.handle(event);
        }
    }

    info!("Dashboard exiting");
    Ok(())
}

/// Export the dashboard state of a snapshot file to JSON
fn export_to_file(snapshot_path: &Path, export_path: &Path) -> Result<()> {
    let raw = FileSource::new(snapshot_path)
        .read_snapshot()
        .map_err(|e| anyhow!("{}: {}", snapshot_path.display(), e))?;

    let mut store = SnapshotStore::new();
    store.apply_snapshot(&raw);
    let view = DashboardView::project(&store).context("No snapshot to export")?;
    write_export(export_path, &view, None)?;

    println!("Exported dashboard state to: {}", export_path.display());
    Ok(())
}
