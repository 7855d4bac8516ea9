//! Core types for the runtime.
//!
//! - [`id`]: Identifier and timestamp types (`TaskId`, `Time`)
//! - [`cancel`]: Cancellation reason and kind types
//! - [`outcome`]: Terminal task outcomes and lifecycle status

pub mod cancel;
pub mod id;
pub mod outcome;

pub use cancel::{CancelKind, CancelReason};
pub use id::{TaskId, Time};
pub use outcome::{Outcome, TaskStatus};
