//! Structured logging.
//!
//! # Responsibilities
//! - Open the agent log once at startup, append-only
//! - Install the global `tracing` subscriber writing to it
//!
//! Log level comes from `RUST_LOG` when set, otherwise [`DEFAULT_FILTER`].

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default log destination, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "agent.log";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "proxy_config_agent=info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Open `path` for appending, creating parent directories as needed.
pub fn open_log_file(path: &Path) -> Result<fs::File, LoggingError> {
    let open = || -> io::Result<fs::File> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    };
    open().map_err(|source| LoggingError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Initialize the process-wide subscriber. Call once, before anything logs.
pub fn init_logging(path: &Path) -> Result<(), LoggingError> {
    let file = open_log_file(path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))
}
