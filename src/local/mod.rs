//! Local file state: the managed file and its backup.
//!
//! # Data Flow
//! ```text
//! managed file ──snapshot──▶ backup        (start of every cycle)
//! fetched value ──write────▶ managed file
//! digest(managed) == digest(backup) ?      (change detection)
//! backup ───────restore────▶ managed file  (after a failed apply)
//! ```
//!
//! Only the reconciler mutates these files, one cycle at a time.

pub mod backup;
pub mod digest;
pub mod writer;

pub use backup::{restore, snapshot, BackupError};
pub use digest::{file_digest, ContentDigest, DigestError};
pub use writer::{write_config, WriteError};
