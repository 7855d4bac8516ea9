//! Time primitives: clock sources, sleep, and yield.
//!
//! - [`TimeSource`]: where the runtime reads "now" from
//! - [`VirtualClock`] / [`WallClock`]: the two built-in sources
//! - [`Sleep`]: a cancellable suspension until a deadline
//! - [`YieldNow`]: a cancellable single suspension
//!
//! # Example
//!
//! ```
//! use coop_timeout::runtime::RuntimeBuilder;
//! use std::time::Duration;
//!
//! let runtime = RuntimeBuilder::virtual_time().build().unwrap();
//! runtime
//!     .block_on(|cx| async move {
//!         cx.sleep(Duration::from_millis(100)).await?;
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(runtime.now().as_millis(), 100);
//! ```

mod clock;
mod sleep;

pub use clock::{TimeSource, VirtualClock, WallClock};
pub use sleep::{Sleep, YieldNow};
