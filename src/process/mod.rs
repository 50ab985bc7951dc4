//! Control of the managed proxy process.
//!
//! # Data Flow
//! ```text
//! apply():
//!     validate (nginx -t) ──fail──▶ ControllerError (reload never attempted)
//!         │ ok
//!         ▼
//!     reload (nginx -s reload) ──fail──▶ ControllerError
//!         │ ok
//!         ▼
//!     ApplyReport (both outputs)
//! ```

pub mod controller;

pub use controller::{
    apply, ApplyReport, CommandController, CommandOutput, CommandSpec, ControllerError,
    ProcessController, Step,
};
