//! Runtime configuration, read from the environment with logged defaults.

use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

pub const APP_NAME: &str = "clinica";

/// Backend address used when `CLINICA_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:5555";

pub const DEFAULT_LOG_FILTER: &str = "clinica=info";

const DEFAULT_TICK_RATE: &str = "30";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the clinic backend.
    pub api_url: String,
    /// Holds local storage and the log file.
    pub data_dir: PathBuf,
    /// UI frames per second.
    pub tick_rate: f64,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            api_url: try_load("CLINICA_API_URL", DEFAULT_API_URL)?,
            data_dir: match env::var_os("CLINICA_DATA_DIR") {
                Some(dir) => PathBuf::from(dir),
                None => default_data_dir(),
            },
            tick_rate: load_tick_rate("CLINICA_TICK_RATE", DEFAULT_TICK_RATE)?,
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(format!("{APP_NAME}.log"))
    }
}

/// `<platform data dir>/clinica`, or `./.clinica` when the platform has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{APP_NAME}")))
}

/// Frames per second, kept between 1 and 120.
fn load_tick_rate(key: &str, default: &str) -> Result<f64> {
    let rate = try_load::<f64>(key, default)?;
    if !rate.is_finite() {
        anyhow::bail!("Invalid {key} value: {rate} is not a finite number");
    }
    Ok(rate.clamp(1.0, 120.0))
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw}"))
}
