//! Tracing compatibility layer for structured logging.
//!
//! Runtime and guard events go through this module so the crate logs with
//! `tracing` when the `tracing-integration` feature is enabled (the default)
//! and compiles the calls away otherwise:
//!
//! - **With feature enabled**: Re-exports from the `tracing` crate.
//! - **Without feature**: No-op macros that expand to nothing.
//!
//! # Usage
//!
//! ```rust,ignore
//! use coop_timeout::tracing_compat::{debug, debug_span};
//!
//! debug!(task_id = %id, "task spawned");
//! let span = debug_span!("block_on", root = %id);
//! let _guard = span.enter();
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, debug_span, info, trace, warn, Span};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    //! No-op implementations when tracing is disabled.

    /// No-op trace-level logging macro.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op debug-level logging macro.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op info-level logging macro.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// No-op warn-level logging macro.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// No-op debug_span macro.
    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::tracing_compat::NoopSpan
        };
    }

    pub use crate::{debug, debug_span, info, trace, warn};
}

#[cfg(not(feature = "tracing-integration"))]
pub use noop::*;

/// A span that does nothing, returned by the span macros when tracing is
/// disabled.
#[cfg(not(feature = "tracing-integration"))]
#[derive(Debug, Clone, Copy)]
pub struct NoopSpan;

#[cfg(not(feature = "tracing-integration"))]
impl NoopSpan {
    /// Returns a guard that does nothing on drop.
    #[inline]
    #[must_use]
    pub fn enter(&self) -> NoopGuard {
        NoopGuard
    }

    /// Returns true: a no-op span is always disabled.
    #[inline]
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        true
    }
}

/// Guard returned by [`NoopSpan::enter`].
#[cfg(not(feature = "tracing-integration"))]
#[derive(Debug)]
pub struct NoopGuard;

/// Alias for `NoopSpan` when tracing is disabled.
#[cfg(not(feature = "tracing-integration"))]
pub type Span = NoopSpan;
