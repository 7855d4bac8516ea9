//! Deadline-bounded cancellation.
//!
//! A [`Timeout`] guard wraps a region of an owner task's code. If the region
//! has not finished by the deadline, a timer task cancels the owner; the
//! guard's exit then recognises its own timer as the cause and reports
//! `DeadlineExceeded` instead of a plain cancellation.
//!
//! Cancellation from any other source passes through a guard unchanged, so
//! nested guards each report only their own expiry.
//!
//! ```
//! use coop_timeout::{runtime::RuntimeBuilder, timeout};
//! use std::time::Duration;
//!
//! let runtime = RuntimeBuilder::virtual_time().build()?;
//! let value = runtime.block_on(|cx| async move {
//!     timeout(&cx, Some(Duration::from_secs(2)), async {
//!         cx.sleep(Duration::from_secs(1)).await?;
//!         Ok(5)
//!     })
//!     .await
//! })?;
//! assert_eq!(value, 5);
//! # Ok::<(), coop_timeout::Error>(())
//! ```

mod controller;
mod timer;

pub use controller::{make_timeout, make_timeout_at, timeout, timeout_at, Timeout};
pub use timer::{CompletionAction, CompletionStatus};
