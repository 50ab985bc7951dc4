//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! bootstrap, reconciler, client:
//!     → logging.rs (structured events into the append-only agent log)
//!     → metrics.rs (cycle and request counters)
//!
//! Consumers:
//!     → Operators reading agent.log
//!     → Prometheus scrape (only when a metrics address is given)
//! ```

pub mod logging;
pub mod metrics;
