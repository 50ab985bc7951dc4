//! Proxy configuration agent library.
//!
//! Keeps a local nginx configuration file in step with an item held by an
//! Apollo-compatible configuration authority, validating and reloading nginx
//! on change and rolling back when the new file is rejected.

pub mod config;
pub mod lifecycle;
pub mod local;
pub mod observability;
pub mod process;
pub mod remote;
pub mod sync;

pub use config::AgentConfig;
pub use lifecycle::Shutdown;
pub use remote::ConfigClient;
pub use sync::Reconciler;
