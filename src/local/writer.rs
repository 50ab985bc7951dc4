//! Persisting fetched content to the managed file.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
#[error("failed to write {}: {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Replace the managed file's content with `content`, creating it if absent.
pub async fn write_config(path: &Path, content: &str) -> Result<(), WriteError> {
    fs::write(path, content.as_bytes())
        .await
        .map_err(|source| WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "Managed file written");
    Ok(())
}
