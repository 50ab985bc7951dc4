//! Synchronization between the managed file and the authority.
//!
//! # Data Flow
//! ```text
//! Startup (bootstrap.rs, once):
//!     managed file → upsert item → publish release
//!
//! Every interval (reconciler.rs):
//!     backup → fetch → decode → guard empty → write
//!         → digest(managed) vs digest(backup)
//!             equal:   done, nothing to apply
//!             differs: validate + reload
//!                          failure → restore backup
//! ```
//!
//! # Design Decisions
//! - Bootstrap failure is fatal; a cycle failure never is
//! - One cycle at a time, fixed sleep between cycles, no backoff
//! - Shutdown is observed between cycles, never mid-cycle

pub mod bootstrap;
pub mod reconciler;

pub use bootstrap::{bootstrap, BootstrapError};
pub use reconciler::{CycleError, CycleOutcome, CycleStats, Reconciler, RECONCILE_INTERVAL};
