//! eduadmin binary entry point.
//!
//! Parses flags, sets up file logging, loads config and data, then runs the
//! TUI event loop with the terminal in raw mode and restores it on exit.
//!
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eduadmin::api::InMemoryApi;
use eduadmin::app::keymap::Keymap;
use eduadmin::app::{self, AppState, Theme};

#[derive(Debug, Parser)]
#[command(name = "eduadmin", version, about = "Manage education platform records from the terminal")]
struct Cli {
    /// JSON file backing the records; seeded with sample data when missing.
    #[arg(long, env = "EDUADMIN_DATA")]
    data: Option<PathBuf>,

    /// Directory holding theme.conf and keybinds.conf.
    #[arg(long, env = "EDUADMIN_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Simulated latency of every save, in milliseconds.
    #[arg(long, env = "EDUADMIN_LATENCY_MS", default_value_t = 250)]
    latency_ms: u64,

    /// Write logs to this file. The terminal is owned by the UI, so nothing is logged without it.
    #[arg(long, env = "EDUADMIN_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn init_tracing(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eduadmin=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_tracing(path)?;
    }

    let dir = app::config_dir(cli.config_dir.as_deref());
    let theme = Theme::load_or_init(&app::config_file_path(&dir, "theme.conf"));
    let keymap = Keymap::load_or_init(&app::config_file_path(&dir, "keybinds.conf"));
    let api = match &cli.data {
        Some(path) => InMemoryApi::load_or_init(path)
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("load data from {}", path.display()))?,
        None => InMemoryApi::with_sample_data(),
    };
    info!(config_dir = %dir.display(), latency_ms = cli.latency_ms, "starting");

    let mut state = AppState::new(api, theme, keymap);
    state.save_latency = Duration::from_millis(cli.latency_ms);

    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, &mut state);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        eprintln!("application error: {err:#}");
    }
    Ok(())
}
