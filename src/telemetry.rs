//! Tracing setup: INFO to the console, DEBUG to `<log_dir>/agent.log`

use crate::error::AdvisorError;
use crate::Result;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE: &str = "agent.log";

const FILE_FILTER: &str = "debug,hyper=info,hyper_util=info,reqwest=info,h2=info,rustls=info";

/// Install the global subscriber. `RUST_LOG` overrides the console level.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let console_layer = fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AdvisorError::Config(format!("Logging already initialised: {}", e)))?;

    Ok(log_path)
}
