//! One-time push of the local file to the authority.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::AgentConfig;
use crate::observability::metrics;
use crate::remote::{ConfigClient, ConfigItem, Release, RemoteError};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to read managed file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to push local configuration to the authority: {0}")]
    Push(#[source] RemoteError),

    #[error("failed to publish release: {0}")]
    Publish(#[source] RemoteError),
}

/// Seed the authority with the managed file and publish it.
///
/// Returns the release that was published.
pub async fn bootstrap(config: &AgentConfig, client: &ConfigClient) -> Result<Release, BootstrapError> {
    let result = push_and_publish(config, client).await;
    metrics::record_bootstrap(if result.is_ok() { "ok" } else { "error" });
    result
}

async fn push_and_publish(config: &AgentConfig, client: &ConfigClient) -> Result<Release, BootstrapError> {
    let path = config.managed_path();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BootstrapError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let item = ConfigItem::nginx_conf(config.item_key(), content, config.created_by.trim());
    client.upsert(&item).await.map_err(BootstrapError::Push)?;
    tracing::info!(
        key = %item.key,
        bytes = item.value.len(),
        "Local configuration pushed to authority"
    );

    let release = Release::now(config.created_by.trim());
    client.publish(&release).await.map_err(BootstrapError::Publish)?;
    tracing::info!(title = %release.release_title, "Release published");

    Ok(release)
}
