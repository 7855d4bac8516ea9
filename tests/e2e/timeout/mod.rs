//! Timeout guard E2E test modules.
//!
//! Test organization:
//! - `expiry` - Deadline arithmetic, rescheduling and worker pools
//! - `cancel_correctness` - Error chaining and foreign cancellation

pub mod cancel_correctness;
pub mod expiry;
pub mod util;
