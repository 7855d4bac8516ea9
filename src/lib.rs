//! coop-timeout: deadline-bounded cancellation over a single-threaded
//! cooperative task scheduler.
//!
//! # Overview
//!
//! A [`Timeout`] guard wraps a region of a task's code with a deadline. If the
//! region is still running when the deadline passes, a timer task cancels the
//! owner; the guard's exit recognises its own timer as the cause and reports
//! [`ErrorKind::DeadlineExceeded`] rather than a plain cancellation.
//!
//! # Core Guarantees
//!
//! - **No leaked timers**: every timer task a guard spawns has terminated
//!   before the guard's exit returns
//! - **Attributed expiry**: only a guard whose own timer fired reports
//!   `DeadlineExceeded`; cancellation from anywhere else passes through
//! - **Explicit context**: the owner is the task whose [`Cx`] enters the
//!   guard; there is no ambient "current task" lookup
//! - **Deterministic testing**: a virtual clock that jumps to the next timer
//!
//! # Module Structure
//!
//! - [`types`]: Identifiers, time, cancel reasons, outcomes
//! - [`error`]: Error types
//! - [`runtime`]: Cooperative scheduler, builder, handles, configuration
//! - [`cx`]: Per-task capability context
//! - [`time`]: Clock sources, sleep and yield
//! - [`timeout`]: The guard and its timer task
//! - [`tracing_compat`]: Logging that compiles away without `tracing-integration`
//!
//! # Example
//!
//! ```
//! use coop_timeout::{runtime::RuntimeBuilder, timeout, ErrorKind};
//! use std::time::Duration;
//!
//! let runtime = RuntimeBuilder::virtual_time().build()?;
//! let err = runtime
//!     .block_on(|cx| async move {
//!         timeout(&cx, Some(Duration::from_millis(50)), async {
//!             cx.sleep(Duration::from_secs(1)).await
//!         })
//!         .await
//!     })
//!     .unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
//! # Ok::<(), coop_timeout::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]

pub mod cx;
pub mod error;
pub mod runtime;
pub mod time;
pub mod timeout;
pub mod tracing_compat;
pub mod types;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use cx::Cx;
pub use error::{Error, ErrorKind, Result};
pub use runtime::{Handle, Runtime, RuntimeBuilder, TaskHandle};
pub use timeout::{
    make_timeout, make_timeout_at, timeout, timeout_at, CompletionAction, CompletionStatus,
    Timeout,
};
pub use types::{CancelKind, CancelReason, Outcome, TaskId, TaskStatus, Time};
