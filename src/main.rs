//! Proxy configuration agent.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                 PROXY CONFIG AGENT                    │
//!                 │                                                       │
//!  config.json ──▶│  config ──▶ lifecycle::startup ──▶ sync::bootstrap ───┼──▶ PUT item
//!                 │                    │                                  ├──▶ POST release
//!                 │                    ▼                                  │
//!                 │            sync::reconciler (every 60s)               │
//!                 │     ┌──────────┬───────────┬──────────┬──────────┐    │
//!                 │     ▼          ▼           ▼          ▼          ▼    │
//!                 │  backup     remote      writer     digest    process ─┼──▶ nginx -t
//!                 │  (.bak)     fetch ◀─────────────────────────────────── ┼──  GET item
//!                 │                                                       │     nginx -s reload
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use proxy_config_agent::lifecycle::{self, signals, Shutdown};
use proxy_config_agent::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "proxy-config-agent")]
#[command(about = "Keeps a local nginx config in sync with a remote configuration authority", long_about = None)]
struct Cli {
    /// Agent configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Append-only operational log.
    #[arg(short, long, default_value = logging::DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(&cli.log_file) {
        eprintln!("proxy-config-agent: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "proxy-config-agent starting");

    if let Some(addr) = cli.metrics_address {
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint");
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    match lifecycle::run(&cli.config, &shutdown).await {
        Ok(stats) => {
            tracing::info!(cycles = stats.cycles, "Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("proxy-config-agent: {}", e);
            ExitCode::FAILURE
        }
    }
}
