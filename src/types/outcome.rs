//! Terminal outcomes and lifecycle status of tasks.
//!
//! A task body returns `Result<T, Error>`. When it finishes, the runtime
//! classifies that result into an [`Outcome`]:
//!
//! - `Ok(T)`: the body ran to completion
//! - `Err(Error)`: the body failed with an application or runtime error
//! - `Cancelled(CancelReason)`: the body unwound because of a cancellation signal
//!
//! [`TaskStatus`] is the payload-free view of the same lattice, plus the
//! non-terminal `Running` state.

use super::cancel::CancelReason;
use crate::error::Error;
use core::fmt;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Spawned and not yet terminal.
    Running,
    /// Returned `Ok`.
    Completed,
    /// Unwound because of cancellation.
    Cancelled,
    /// Returned a non-cancellation error.
    Failed,
}

impl TaskStatus {
    /// Returns true for every status except `Running`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The terminal outcome of a task.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// Success with a value.
    Ok(T),
    /// The task failed.
    Err(Error),
    /// The task was cancelled.
    Cancelled(CancelReason),
}

impl<T> Outcome<T> {
    /// Returns the status this outcome leaves the task in.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        match self {
            Self::Ok(_) => TaskStatus::Completed,
            Self::Err(_) => TaskStatus::Failed,
            Self::Cancelled(_) => TaskStatus::Cancelled,
        }
    }

    /// Returns true if this outcome is `Ok`.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns true if this outcome is `Err`.
    #[must_use]
    pub const fn is_err(&self) -> bool {
        matches!(self, Self::Err(_))
    }

    /// Returns true if this outcome is `Cancelled`.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Converts back into a `Result`, turning cancellation into a
    /// cancellation error so it unwinds the awaiting task in turn.
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Err(e) => Err(e),
            Self::Cancelled(r) => Err(Error::cancelled(r)),
        }
    }

    /// Maps the success value using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Ok(v) => Outcome::Ok(f(v)),
            Self::Err(e) => Outcome::Err(e),
            Self::Cancelled(r) => Outcome::Cancelled(r),
        }
    }
}

impl<T> From<Result<T, Error>> for Outcome<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(v) => Self::Ok(v),
            Err(e) if e.is_cancelled() => {
                Self::Cancelled(e.cancel_reason().cloned().unwrap_or_default())
            }
            Err(e) => Self::Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CancelKind;

    #[test]
    fn classifies_results() {
        let ok: Outcome<u8> = Ok(1).into();
        assert_eq!(ok.status(), TaskStatus::Completed);

        let failed: Outcome<u8> = Err(Error::user("boom")).into();
        assert_eq!(failed.status(), TaskStatus::Failed);

        let cancelled: Outcome<u8> = Err(Error::cancelled(CancelReason::timeout())).into();
        assert_eq!(cancelled.status(), TaskStatus::Cancelled);
        match cancelled {
            Outcome::Cancelled(reason) => assert_eq!(reason.kind, CancelKind::Timeout),
            other => unreachable!("expected cancellation, got {other:?}"),
        }
    }

    #[test]
    fn deadline_exceeded_is_a_failure_not_a_cancellation() {
        let outcome: Outcome<()> =
            Err(Error::deadline_exceeded(crate::types::Time::from_secs(1))).into();
        assert!(outcome.is_err());
    }

    #[test]
    fn into_result_reraises_cancellation() {
        let outcome: Outcome<()> = Outcome::Cancelled(CancelReason::user("stop"));
        let err = outcome.into_result().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.cancel_reason(), Some(&CancelReason::user("stop")));
    }

    #[test]
    fn status_terminality() {
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn map_preserves_variant() {
        let outcome: Outcome<u8> = Outcome::Ok(2);
        assert!(matches!(outcome.map(|v| v * 2), Outcome::Ok(4)));
    }
}
