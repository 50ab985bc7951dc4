//! The reconciliation loop.
//!
//! # Responsibilities
//! - Run one backup → fetch → write → compare → apply cycle per interval
//! - Roll the managed file back when validate or reload fails
//! - Keep running whatever a cycle's outcome
//!
//! # States
//! ```text
//! Idle (sleeping RECONCILE_INTERVAL) ──timer──▶ Cycle ──done──▶ Idle
//! Idle ──shutdown──▶ Stopped
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::local::{self, BackupError, DigestError, WriteError};
use crate::observability::metrics;
use crate::process::{self, ControllerError, ProcessController};
use crate::remote::{decode_item, ConfigClient, RemoteError};

/// Sleep between the end of one cycle and the start of the next.
pub const RECONCILE_INTERVAL: Duration = Duration::from_secs(60);

/// How a completed cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Fetched value matched what was already active.
    Unchanged,
    /// New value validated and reloaded.
    Applied,
    /// Apply failed; the previous file is back in place.
    RolledBack { cause: ControllerError },
    /// Apply failed and the backup could not be restored either.
    RollbackFailed {
        cause: ControllerError,
        rollback: BackupError,
    },
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Unchanged => "unchanged",
            CycleOutcome::Applied => "applied",
            CycleOutcome::RolledBack { .. } => "rolled_back",
            CycleOutcome::RollbackFailed { .. } => "rollback_failed",
        }
    }
}

/// Stage at which a cycle was abandoned.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("backup failed: {0}")]
    Backup(#[source] BackupError),

    #[error("fetch failed: {0}")]
    Fetch(#[source] RemoteError),

    #[error("decode failed: {0}")]
    Decode(#[source] RemoteError),

    #[error("authority returned an empty value")]
    EmptyValue,

    #[error("write failed: {0}")]
    Write(#[source] WriteError),

    #[error("digest failed: {0}")]
    Digest(#[source] DigestError),
}

impl CycleError {
    pub fn stage(&self) -> &'static str {
        match self {
            CycleError::Backup(_) => "backup",
            CycleError::Fetch(_) => "fetch",
            CycleError::Decode(_) => "decode",
            CycleError::EmptyValue => "empty_value",
            CycleError::Write(_) => "write",
            CycleError::Digest(_) => "digest",
        }
    }
}

/// Tally of cycles run by [`Reconciler::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub unchanged: u64,
    pub applied: u64,
    pub rolled_back: u64,
    pub aborted: u64,
}

impl CycleStats {
    fn record(&mut self, result: &Result<CycleOutcome, CycleError>) {
        self.cycles += 1;
        match result {
            Ok(CycleOutcome::Unchanged) => self.unchanged += 1,
            Ok(CycleOutcome::Applied) => self.applied += 1,
            Ok(CycleOutcome::RolledBack { .. } | CycleOutcome::RollbackFailed { .. }) => {
                self.rolled_back += 1
            }
            Err(_) => self.aborted += 1,
        }
    }
}

/// Drives reconciliation of one managed file against the authority.
pub struct Reconciler<P> {
    client: ConfigClient,
    controller: P,
    managed: PathBuf,
    backup: PathBuf,
}

impl<P: ProcessController> Reconciler<P> {
    pub fn new(config: &AgentConfig, client: ConfigClient, controller: P) -> Self {
        Self {
            client,
            controller,
            managed: config.managed_path().to_path_buf(),
            backup: config.backup_path(),
        }
    }

    pub fn managed_path(&self) -> &Path {
        &self.managed
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Loop until `shutdown` fires, one cycle per interval.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> CycleStats {
        tracing::info!(
            managed = %self.managed.display(),
            backup = %self.backup.display(),
            interval_secs = RECONCILE_INTERVAL.as_secs(),
            "Reconciler starting"
        );

        let mut stats = CycleStats::default();
        loop {
            tokio::select! {
                _ = time::sleep(RECONCILE_INTERVAL) => {
                    let result = self.tick().await;
                    stats.record(&result);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reconciler received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        tracing::info!(
            cycles = stats.cycles,
            applied = stats.applied,
            rolled_back = stats.rolled_back,
            aborted = stats.aborted,
            "Reconciler stopped"
        );
        stats
    }

    /// One cycle with its log line and metrics.
    async fn tick(&self) -> Result<CycleOutcome, CycleError> {
        let span = tracing::info_span!("cycle", id = %Uuid::new_v4());
        async {
            let started = Instant::now();
            let result = self.run_cycle().await;

            match &result {
                Ok(CycleOutcome::Unchanged) => tracing::info!("No configuration change detected"),
                Ok(CycleOutcome::Applied) => tracing::info!("Configuration updated and reloaded"),
                Ok(CycleOutcome::RolledBack { cause }) => tracing::warn!(
                    error = %cause,
                    "Configuration rejected, previous file restored"
                ),
                Ok(CycleOutcome::RollbackFailed { cause, rollback }) => tracing::error!(
                    error = %cause,
                    rollback_error = %rollback,
                    "Configuration rejected and restore failed"
                ),
                Err(e) => tracing::error!(stage = e.stage(), error = %e, "Cycle aborted"),
            }

            let label = match &result {
                Ok(outcome) => outcome.label(),
                Err(e) => e.stage(),
            };
            metrics::record_cycle(label, started.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    /// Run a single reconciliation cycle.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        local::snapshot(&self.managed, &self.backup)
            .await
            .map_err(CycleError::Backup)?;

        let body = self.client.fetch().await.map_err(CycleError::Fetch)?;
        let item = decode_item(&body).map_err(CycleError::Decode)?;
        if item.value.is_empty() {
            return Err(CycleError::EmptyValue);
        }

        local::write_config(&self.managed, &item.value)
            .await
            .map_err(CycleError::Write)?;

        // Compare files, not strings: a short or corrupted write shows up here.
        let current = local::file_digest(&self.managed)
            .await
            .map_err(CycleError::Digest)?;
        let previous = local::file_digest(&self.backup)
            .await
            .map_err(CycleError::Digest)?;
        if current == previous {
            return Ok(CycleOutcome::Unchanged);
        }

        tracing::info!(
            %previous,
            %current,
            modified_by = item.data_change_last_modified_by.as_deref().unwrap_or("unknown"),
            "Configuration changed, validating and reloading"
        );

        let cause = match process::apply(&self.controller).await {
            Ok(_) => return Ok(CycleOutcome::Applied),
            Err(cause) => cause,
        };

        tracing::warn!(step = %cause.step(), error = %cause, "Apply failed, restoring backup");
        match local::restore(&self.backup, &self.managed).await {
            Ok(_) => {
                tracing::info!("Backup restored");
                Ok(CycleOutcome::RolledBack { cause })
            }
            Err(rollback) => Ok(CycleOutcome::RollbackFailed { cause, rollback }),
        }
    }
}
