//! Content fingerprints for change detection.
//!
//! Digests are only compared for equality within a cycle. They are never
//! persisted or sent anywhere.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// SHA-256 of a file's full content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(bytes));
        Self(out)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Debug, Error)]
#[error("failed to digest {}: {source}", .path.display())]
pub struct DigestError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Read `path` completely and fingerprint it.
pub async fn file_digest(path: &Path) -> Result<ContentDigest, DigestError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| DigestError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ContentDigest::of_bytes(&bytes))
}
