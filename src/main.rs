mod api;
mod app;
mod auth;
mod components;
mod config;
mod error;
mod models;
mod policy;
mod schedule;
mod session;
mod storage;
mod tui;
mod views;

use anyhow::{Context, Result};
use api::HttpGateway;
use app::App;
use config::Config;
use session::Session;
use std::fs::{self, File};
use std::sync::Mutex;
use storage::Storage;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tui::Tui;

fn main() -> Result<()> {
    let _guard = CleanupGuard;

    let config = Config::load()?;
    fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.data_dir.display()
        )
    })?;
    init_logging(&config)?;
    info!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "starting");

    let storage = Storage::in_dir(&config.data_dir).context("Failed to open local storage")?;
    info!(path = %storage.path().display(), "local storage opened");
    let gateway = HttpGateway::new(&config.api_url, storage.clone())?;
    let session = Session::new(storage);

    let mut tui = Tui::new(config.tick_rate)?;
    tui.init()?;

    let mut app = App::new(Box::new(gateway), session);
    let res = app.run(&mut tui);

    tui.exit()?;

    if let Err(e) = res {
        error!(error = %e, "application error");
        eprintln!("Application Error: {e:#}");
    }
    Ok(())
}

/// Logs go to a file: the terminal belongs to the UI while the app runs.
fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_file();
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Ignore errors during cleanup
        let _ = tui::restore();
    }
}
