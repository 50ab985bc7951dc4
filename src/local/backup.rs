//! Backup and rollback of the managed file.
//!
//! # Responsibilities
//! - Copy the managed file to its backup before it is overwritten
//! - Copy the backup back over the managed file when an apply fails
//!
//! A copy is staged next to its destination and renamed into place, so a
//! crash mid-copy leaves the previous destination intact. A destination that
//! is a symlink is resolved first; the link itself is never replaced.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

/// Errors raised while copying between the managed file and its backup.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Source file is absent.
    #[error("source file does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    /// Copy failed part-way.
    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Copy `src` over `dst` byte for byte.
pub async fn snapshot(src: &Path, dst: &Path) -> Result<u64, BackupError> {
    match fs::metadata(src).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(BackupError::SourceMissing(src.to_path_buf()));
        }
        Err(source) => {
            return Err(BackupError::Copy {
                from: src.to_path_buf(),
                to: dst.to_path_buf(),
                source,
            });
        }
    }

    let target = match resolve_target(dst).await {
        Ok(target) => target,
        Err(source) => {
            return Err(BackupError::Copy {
                from: src.to_path_buf(),
                to: dst.to_path_buf(),
                source,
            });
        }
    };

    let staging = staging_path(&target);
    let copied = async {
        let bytes = fs::copy(src, &staging).await?;
        fs::rename(&staging, &target).await?;
        Ok::<u64, io::Error>(bytes)
    }
    .await;

    match copied {
        Ok(bytes) => {
            tracing::debug!(from = %src.display(), to = %dst.display(), bytes, "File copied");
            Ok(bytes)
        }
        Err(source) => {
            let _ = fs::remove_file(&staging).await;
            Err(BackupError::Copy {
                from: src.to_path_buf(),
                to: dst.to_path_buf(),
                source,
            })
        }
    }
}

/// Put the backup back in place of the managed file.
pub async fn restore(backup: &Path, managed: &Path) -> Result<u64, BackupError> {
    snapshot(backup, managed).await
}

/// Final file a copy to `dst` should land in, following symlinks.
async fn resolve_target(dst: &Path) -> io::Result<PathBuf> {
    match fs::canonicalize(dst).await {
        Ok(target) => Ok(target),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(dst.to_path_buf()),
        Err(e) => Err(e),
    }
}

fn staging_path(dst: &Path) -> PathBuf {
    let mut name = dst
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("backup"));
    name.push(".tmp");
    dst.with_file_name(name)
}
