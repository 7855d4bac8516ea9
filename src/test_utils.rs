//! Test utilities for coop-timeout.
//!
//! Shared helpers for unit and integration tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Virtual-time runtime constructors
//!
//! # Example
//! ```ignore
//! use coop_timeout::test_utils::{init_test_logging, test_runtime};
//!
//! init_test_logging();
//! let runtime = test_runtime();
//! runtime.block_on(|_| async { Ok(()) }).unwrap();
//! ```

use crate::runtime::{Runtime, RuntimeBuilder};
use crate::time::VirtualClock;
use crate::types::Time;
use std::sync::{Arc, Mutex, Once};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Step cap for test runtimes; generous, but ends runaway loops quickly.
pub const TEST_MAX_STEPS: u64 = 100_000;

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Acquire the global environment lock for tests that mutate env vars.
pub fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Create a virtual-time runtime with the test step cap.
#[must_use]
pub fn test_runtime() -> Runtime {
    test_runtime_at(Time::ZERO)
}

/// Create a virtual-time runtime whose clock starts at `start`.
#[must_use]
pub fn test_runtime_at(start: Time) -> Runtime {
    let built = RuntimeBuilder::virtual_time()
        .time_source(Arc::new(VirtualClock::starting_at(start)))
        .max_steps(TEST_MAX_STEPS)
        .build();
    match built {
        Ok(runtime) => runtime,
        Err(err) => panic!("test runtime config is valid: {err}"),
    }
}

/// Log a test phase header.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}
