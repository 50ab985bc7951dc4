//! Agent startup configuration.
//!
//! # Data Flow
//! ```text
//! config.json
//!     → loader.rs (read & deserialize)
//!     → validation.rs (every required field present, authority is a URL)
//!     → AgentConfig (validated, immutable)
//!     → shared by reference with bootstrap, client and reconciler
//! ```
//!
//! # Design Decisions
//! - Config is loaded once; there is no hot reload of the agent's own settings
//! - Validation collects every problem instead of stopping at the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AgentConfig;
pub use validation::ValidationError;
