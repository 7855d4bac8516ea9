//! Runtime configuration types.
//!
//! These types hold the concrete values that drive runtime behavior. In most
//! cases you should use [`RuntimeBuilder`](super::builder::RuntimeBuilder) to
//! construct a runtime rather than creating a [`RuntimeConfig`] directly.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `clock` | [`ClockKind::Virtual`] |
//! | `max_steps` | `Some(1_000_000)` |

use crate::error::{Error, ErrorKind};
use std::fmt;
use std::str::FromStr;

/// Default cap on task polls per `block_on` call.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// Which clock the runtime reads time from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(rename_all = "lowercase"))]
pub enum ClockKind {
    /// Deterministic time that jumps to the next timer when the run loop idles.
    #[default]
    Virtual,
    /// Monotonic wall-clock time; idle periods block the thread.
    Wall,
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Virtual => f.write_str("virtual"),
            Self::Wall => f.write_str("wall"),
        }
    }
}

impl FromStr for ClockKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "virtual" | "lab" => Ok(Self::Virtual),
            "wall" | "real" => Ok(Self::Wall),
            _ => Err(ConfigError::UnknownClock {
                value: s.to_string(),
            }),
        }
    }
}

/// Error raised for an invalid runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A step limit of zero would abort before the root task is polled.
    #[error("max_steps must be at least 1 (use no limit instead of 0)")]
    ZeroStepLimit,
    /// Unrecognised clock name.
    #[error("unknown clock {value:?}: expected \"virtual\" or \"wall\"")]
    UnknownClock {
        /// The rejected value.
        value: String,
    },
    /// An environment variable held an unparseable value.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// What was wrong with it.
        reason: String,
    },
    /// The configuration file could not be read or parsed.
    #[error("config file: {0}")]
    File(String),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config)
            .with_message(err.to_string())
            .with_source(err)
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Clock the runtime reads (default: virtual).
    pub clock: ClockKind,
    /// Maximum task polls per `block_on` call; `None` disables the limit.
    pub max_steps: Option<u64>,
}

impl RuntimeConfig {
    /// Checks the configuration for values the runtime cannot honour.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroStepLimit`] for `max_steps == Some(0)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_steps == Some(0) {
            return Err(ConfigError::ZeroStepLimit);
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            clock: ClockKind::Virtual,
            max_steps: Some(DEFAULT_MAX_STEPS),
        }
    }
}
