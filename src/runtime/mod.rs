//! Runtime state and scheduling.
//!
//! This module contains the cooperative runtime machinery:
//!
//! - [`config`]: Runtime configuration types
//! - [`env_config`]: Environment variable and TOML overrides
//! - [`builder`]: Runtime builder and the run loop
//! - `state`: Task table, pending cancellations, and timers
//! - `scheduler`: FIFO ready queue
//! - `waker`: Wakers that re-queue their task
//! - [`handle`]: The scheduler surface tasks consume
//! - [`task_handle`]: `TaskHandle` for observing and awaiting spawned tasks
//!
//! # Runtime Builder
//!
//! The runtime is configured with a fluent, move-based builder API. Each
//! builder method consumes `self` and returns an updated builder.
//!
//! ```
//! use coop_timeout::runtime::RuntimeBuilder;
//!
//! let runtime = RuntimeBuilder::virtual_time().max_steps(10_000).build()?;
//! let answer = runtime.block_on(|cx| async move {
//!     let child = cx.spawn(|_| async { Ok(21) });
//!     Ok(child.join().await? * 2)
//! })?;
//! assert_eq!(answer, 42);
//! # Ok::<(), coop_timeout::Error>(())
//! ```
//!
//! ## Environment Overrides
//!
//! ```no_run
//! use coop_timeout::runtime::RuntimeBuilder;
//!
//! // COOP_TIMEOUT_CLOCK=wall COOP_TIMEOUT_MAX_STEPS=none
//! let runtime = RuntimeBuilder::new().from_env()?.build()?;
//! # Ok::<(), coop_timeout::Error>(())
//! ```
//!
//! # Error Handling
//!
//! `build()` fails with a `Config` error for invalid settings.
//! `block_on` fails with the root task's own error, or with `Deadlock` /
//! `StepLimitExceeded` when the run loop cannot make progress.

pub mod builder;
pub mod config;
pub mod env_config;
pub mod handle;
pub(crate) mod scheduler;
pub(crate) mod state;
pub mod task_handle;
pub(crate) mod waker;

pub use builder::{Runtime, RuntimeBuilder};
pub use config::{ClockKind, ConfigError, RuntimeConfig};
pub use handle::Handle;
pub use task_handle::{Join, TaskHandle, WaitShielded};
