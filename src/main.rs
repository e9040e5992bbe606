use std::io::stdout;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, LeaveAlternateScreen};
use ratatui::prelude::CrosstermBackend;
use ratatui::{DefaultTerminal, Terminal};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

mod actions;
mod app;
mod config;
mod error;
mod interaction;
mod kitty;
mod poller;
mod session;

use actions::{Action, Command};
use app::App;
use config::Config;
use kitty::{identify, KittyClient, WindowSource};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();

    if config.debug_dump {
        init_logging(None)?;
        return run_debug(&config).await;
    }

    let _log_guard = init_logging(Some(&config))?;
    info!(?config, "starting");

    let terminal = init_terminal(config.alt_screen)?;
    let result = run(terminal, config).await;
    restore_terminal();
    result
}

/// Log to stderr in debug mode, otherwise to a file so the UI stays clean.
/// RUST_LOG overrides the default `info` level.
fn init_logging(config: Option<&Config>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(config) = config else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let (writer, guard) = tracing_appender::non_blocking(log_appender(&config.log_file)?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

/// Open `path` for appending without rotation
fn log_appender(path: &Path) -> Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("lazyccg-tui.log");

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&dir)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

fn init_terminal(alt_screen: bool) -> Result<DefaultTerminal> {
    if alt_screen {
        return Ok(ratatui::try_init()?);
    }
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal() {
    // LeaveAlternateScreen is harmless when the alternate screen was never entered
    if let Err(e) = disable_raw_mode().and_then(|_| execute!(stdout(), LeaveAlternateScreen)) {
        warn!(error = %e, "failed to restore terminal");
    }
}

async fn run(mut terminal: DefaultTerminal, config: Config) -> Result<()> {
    let config = Arc::new(config);
    let client = Arc::new(KittyClient::new(config.kitty_socket.clone()));

    // Create event channel
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

    // Spawn input handler
    let input_tx = tx.clone();
    tokio::task::spawn_blocking(move || loop {
        if event::poll(Duration::from_millis(100)).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind == KeyEventKind::Press && input_tx.send(Action::KeyPress(key)).is_err() {
                    break;
                }
            }
        }
        if input_tx.is_closed() {
            break;
        }
    });

    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Create app state
    let mut app = App::new();

    // Main event loop
    loop {
        terminal.draw(|f| app.render(f))?;

        // Dispatch side effects requested by the last input
        for command in app.take_pending_commands() {
            spawn_command(Arc::clone(&client), command, tx.clone());
        }

        let action = tokio::select! {
            Some(action) = rx.recv() => action,
            _ = ticker.tick() => {
                spawn_poll(Arc::clone(&client), Arc::clone(&config), &app, tx.clone());
                continue;
            }
        };

        if app.handle_action(action)? {
            break;
        }
    }

    Ok(())
}

/// Start one poll in the background. Each poll works from the fingerprints
/// known when it was issued and reports a complete replacement snapshot.
fn spawn_poll(
    client: Arc<KittyClient>,
    config: Arc<Config>,
    app: &App,
    tx: mpsc::UnboundedSender<Action>,
) {
    let previous = app.fingerprints.clone();
    tokio::spawn(async move {
        let action = match poller::poll(client.as_ref(), &config, &previous).await {
            Ok(outcome) => Action::SessionsUpdated(outcome),
            Err(e) => {
                warn!(error = %e, parse = e.is_parse(), "poll failed");
                Action::PollFailed(e.to_string())
            }
        };
        let _ = tx.send(action);
    });
}

/// Fire-and-forget a focus or rename call, reporting the result back
fn spawn_command(client: Arc<KittyClient>, command: Command, tx: mpsc::UnboundedSender<Action>) {
    tokio::spawn(async move {
        info!(command = %command.describe(), "dispatching");
        let result = match &command {
            Command::FocusWindow(id) => client.focus_window(*id).await,
            Command::RenameWindow { window_id, title } => client.rename_window(*window_id, title).await,
        };
        let _ = tx.send(Action::CommandFinished {
            command,
            result: result.map_err(|e| e.to_string()),
        });
    });
}

/// Print what kitty reports and what the detector makes of it
async fn run_debug(config: &Config) -> Result<()> {
    let client = KittyClient::new(config.kitty_socket.clone());

    println!("=== lazyccg debug ===");
    println!("prefixes: {:?}", config.prefixes);
    println!("socket:   {:?}", config.kitty_socket);
    println!();

    let windows = client.list_windows().await.context("kitty @ ls")?;

    println!("=== windows: {} ===", windows.len());
    for win in &windows {
        println!(
            "window id={} tab={} ({:?}) title={:?} cwd={}",
            win.id, win.tab_id, win.tab_title, win.title, win.cwd
        );
        for proc in &win.processes {
            println!("    pid={} cmdline={:?}", proc.pid, proc.cmdline);
        }
        println!("    identify: {:?}", identify(win, &config.prefixes));
    }
    println!();

    let outcome = poller::poll(&client, config, &Default::default()).await?;
    println!("=== detected sessions: {} ===", outcome.sessions.len());
    if outcome.sessions.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for (i, s) in outcome.sessions.all().iter().enumerate() {
        println!(
            "  [{i}] ai={} title={:?} status={} window={}",
            s.ai, s.title, s.status, s.window_id
        );
    }
    println!();
    println!("=== sessions as json ===");
    println!("{}", serde_json::to_string_pretty(outcome.sessions.all())?);

    Ok(())
}
