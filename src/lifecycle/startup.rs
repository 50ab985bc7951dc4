//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration before touching files or network
//! - Push the local file to the authority and publish it
//! - Hand over to the reconciler until shutdown
//!
//! Every step returns a `Result`; the first failure ends startup.

use std::path::Path;

use thiserror::Error;

use crate::config::{load_config, AgentConfig, ConfigError};
use crate::lifecycle::Shutdown;
use crate::process::{CommandController, ProcessController};
use crate::remote::{ConfigClient, RemoteError};
use crate::sync::{bootstrap, BootstrapError, CycleStats, Reconciler};

/// Errors that stop the agent before the loop starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create authority client: {0}")]
    Client(#[from] RemoteError),

    #[error("failed to sync local configuration to the authority: {0}")]
    Bootstrap(#[from] BootstrapError),
}

/// Load config, bootstrap, and return a reconciler ready to run.
pub async fn prepare<P: ProcessController>(
    config_path: &Path,
    controller: P,
) -> Result<(AgentConfig, Reconciler<P>), StartupError> {
    let config = load_config(config_path)?;
    tracing::info!(
        authority = %config.authority(),
        env = %config.env,
        app_id = %config.app_id,
        managed = %config.managed_path().display(),
        "Configuration loaded"
    );

    let client = ConfigClient::new(&config)?;
    bootstrap(&config, &client).await?;
    tracing::info!("Local configuration synced to authority");

    let reconciler = Reconciler::new(&config, client, controller);
    Ok((config, reconciler))
}

/// Full agent lifecycle with the nginx controller.
pub async fn run(config_path: &Path, shutdown: &Shutdown) -> Result<CycleStats, StartupError> {
    let stop = shutdown.subscribe();
    let (_, reconciler) = prepare(config_path, CommandController::nginx()).await?;
    Ok(reconciler.run(stop).await)
}
