//! Error types and error handling strategy.
//!
//! One crate-wide [`Error`] carries an [`ErrorKind`], an optional message, an
//! optional chained source, and structured [`ErrorContext`].
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - Cancellation is an error *kind*, not a separate channel: it unwinds a
//!   task's await chain through ordinary `?` propagation
//! - `DeadlineExceeded` is only produced by a timeout guard whose own timer
//!   fired; the unwinding error it replaced is kept as its `source()`
//!
//! # Error Categories
//!
//! - **Usage**: A guard or runtime API was called in the wrong state
//! - **Cancellation**: Cooperative unwind signal
//! - **Budget**: Deadline exceeded
//! - **Runtime**: The run loop could not make progress
//! - **Config**: Invalid runtime configuration
//! - **User**: Application-provided failures

use core::fmt;
use std::sync::Arc;

use crate::types::{CancelReason, TaskId, Time};

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // === Usage ===
    /// A guard or runtime API was used out of order.
    Usage,

    // === Cancellation ===
    /// Operation was cancelled.
    Cancelled,

    // === Budgets ===
    /// A timeout guard's own deadline fired.
    DeadlineExceeded,

    // === Runtime ===
    /// The root task is waiting but no task is ready and no timer is armed.
    Deadlock,
    /// The configured scheduling step limit was hit.
    StepLimitExceeded,

    // === Configuration ===
    /// Invalid runtime configuration.
    Config,

    // === Internal / user ===
    /// Internal runtime error (bug).
    Internal,
    /// User-provided error.
    User,
}

impl ErrorKind {
    /// Returns the error category for this kind.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Usage => ErrorCategory::Usage,
            Self::Cancelled => ErrorCategory::Cancellation,
            Self::DeadlineExceeded => ErrorCategory::Budget,
            Self::Deadlock | Self::StepLimitExceeded => ErrorCategory::Runtime,
            Self::Config => ErrorCategory::Config,
            Self::Internal => ErrorCategory::Internal,
            Self::User => ErrorCategory::User,
        }
    }

    /// Returns the recoverability classification for this error kind.
    ///
    /// Nothing in this crate retries automatically; the classification is
    /// advice for callers.
    #[must_use]
    pub const fn recoverability(&self) -> Recoverability {
        match self {
            Self::Usage
            | Self::Cancelled
            | Self::Deadlock
            | Self::StepLimitExceeded
            | Self::Config
            | Self::Internal => Recoverability::Permanent,
            Self::DeadlineExceeded | Self::User => Recoverability::Unknown,
        }
    }

    /// Returns true if this error is typically retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.recoverability(), Recoverability::Transient)
    }
}

/// Classification of error recoverability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recoverability {
    /// Temporary failure that may succeed on retry.
    Transient,
    /// Permanent failure that will not succeed on retry.
    Permanent,
    /// Recoverability depends on context and cannot be determined
    /// from the error kind alone.
    Unknown,
}

/// High-level error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Programmer errors in API usage.
    Usage,
    /// Cancellation signals.
    Cancellation,
    /// Deadline failures.
    Budget,
    /// Run loop failures.
    Runtime,
    /// Configuration failures.
    Config,
    /// Internal runtime errors.
    Internal,
    /// User-originated errors.
    User,
}

/// Diagnostic context for an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The task where the error originated.
    pub task_id: Option<TaskId>,
    /// The deadline involved, for deadline failures.
    pub deadline: Option<Time>,
    /// The cancellation reason, for cancellation errors.
    pub cancel_reason: Option<CancelReason>,
}

/// The main error type.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    context: ErrorContext,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
            context: ErrorContext {
                task_id: None,
                deadline: None,
                cancel_reason: None,
            },
        }
    }

    /// Creates a usage error. These are programmer errors and are never retried.
    #[must_use]
    pub fn usage(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage).with_message(detail)
    }

    /// Creates a cancellation error from a structured reason.
    #[must_use]
    pub fn cancelled(reason: CancelReason) -> Self {
        let mut err = Self::new(ErrorKind::Cancelled).with_message(reason.to_string());
        err.context.cancel_reason = Some(reason);
        err
    }

    /// Creates a deadline-exceeded error for the given deadline.
    #[must_use]
    pub fn deadline_exceeded(deadline: Time) -> Self {
        let mut err = Self::new(ErrorKind::DeadlineExceeded)
            .with_message(format!("deadline {deadline} exceeded"));
        err.context.deadline = Some(deadline);
        err
    }

    /// Creates a user error.
    #[must_use]
    pub fn user(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::User).with_message(detail)
    }

    /// Creates an internal error (runtime bug).
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal).with_message(detail)
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if this error represents cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Returns true if this error is a deadline condition.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::DeadlineExceeded)
    }

    /// Returns true if this error is an API usage error.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self.kind, ErrorKind::Usage)
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Records the task the error originated in.
    #[must_use]
    pub fn with_task(mut self, task_id: TaskId) -> Self {
        self.context.task_id = Some(task_id);
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Returns the cancellation reason, if this is a cancellation error.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<&CancelReason> {
        self.context.cancel_reason.as_ref()
    }

    /// Returns the deadline, if this is a deadline error.
    #[must_use]
    pub const fn deadline(&self) -> Option<Time> {
        self.context.deadline
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns the recoverability classification.
    #[must_use]
    pub const fn recoverability(&self) -> Recoverability {
        self.kind.recoverability()
    }

    /// Returns true if this error is typically retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the error context.
    #[must_use]
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Returns the chained source as a crate error, if it is one.
    #[must_use]
    pub fn source_error(&self) -> Option<&Self> {
        self.source
            .as_deref()
            .and_then(|e| e.downcast_ref::<Self>())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = core::result::Result<T, Error>;
