//! Cancellation reason and kind types.
//!
//! Cancellation is a cooperative signal: a request is recorded on the target
//! task and delivered at its next suspension point. The reason travels with
//! the request so that whoever catches the signal can tell where it came from.

use super::TaskId;
use core::fmt;

/// The kind of cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CancelKind {
    /// Explicit cancellation requested by user code.
    User,
    /// Cancellation issued by a deadline timer.
    Timeout,
    /// Cancellation due to runtime shutdown.
    Shutdown,
}

impl fmt::Display for CancelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Timeout => write!(f, "timeout"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// The reason for a cancellation, including kind and optional context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason {
    /// The kind of cancellation.
    pub kind: CancelKind,
    /// Optional human-readable message (static for determinism).
    pub message: Option<&'static str>,
    /// The task that issued the request, if it came from inside the runtime.
    pub origin: Option<TaskId>,
}

impl CancelReason {
    /// Creates a new cancellation reason with the given kind.
    #[must_use]
    pub const fn new(kind: CancelKind) -> Self {
        Self {
            kind,
            message: None,
            origin: None,
        }
    }

    /// Creates a user cancellation reason with a message.
    #[must_use]
    pub const fn user(message: &'static str) -> Self {
        Self {
            kind: CancelKind::User,
            message: Some(message),
            origin: None,
        }
    }

    /// Creates a timeout cancellation reason.
    #[must_use]
    pub const fn timeout() -> Self {
        Self::new(CancelKind::Timeout)
    }

    /// Creates a shutdown cancellation reason.
    #[must_use]
    pub const fn shutdown() -> Self {
        Self::new(CancelKind::Shutdown)
    }

    /// Records which task issued the request.
    #[must_use]
    pub const fn with_origin(mut self, origin: TaskId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Returns true if this reason was issued by a deadline timer.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, CancelKind::Timeout)
    }
}

impl Default for CancelReason {
    fn default() -> Self {
        Self::new(CancelKind::User)
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(message) = self.message {
            write!(f, ": {message}")?;
        }
        if let Some(origin) = self.origin {
            write!(f, " (from {origin})")?;
        }
        Ok(())
    }
}
