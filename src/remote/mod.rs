//! Remote configuration authority (Apollo open API).
//!
//! # Data Flow
//! ```text
//! bootstrap:  managed file → ConfigItem → PUT item (createIfNotExists)
//!                          → Release    → POST releases
//! reconcile:  GET item → raw body → decode → ConfigItem.value
//! ```

pub mod client;
pub mod types;

pub use client::{ConfigClient, RemoteError, REQUEST_TIMEOUT};
pub use types::{decode_item, ConfigItem, Release, NGINX_CONF_COMMENT};
