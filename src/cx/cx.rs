//! The per-task capability context.
//!
//! Every task body receives a [`Cx`]. It names the task it belongs to and
//! carries the runtime [`Handle`], so code that needs "the current task"
//! (a timeout guard binding its owner, for instance) gets it from an explicit
//! parameter rather than from ambient global state.

use crate::error::Result;
use crate::runtime::{Handle, TaskHandle};
use crate::time::{Sleep, YieldNow};
use crate::timeout::{make_timeout, Timeout};
use crate::types::{CancelReason, TaskId, Time};
use std::future::Future;
use std::time::Duration;

/// The capability context for a task.
#[derive(Clone)]
pub struct Cx {
    task_id: Option<TaskId>,
    handle: Handle,
}

impl Cx {
    pub(crate) fn new(task_id: Option<TaskId>, handle: Handle) -> Self {
        Self { task_id, handle }
    }

    /// Returns the task this context belongs to, or `None` for a detached
    /// context created outside any task.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the runtime handle.
    #[must_use]
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Returns the current time in the runtime's clock domain.
    #[must_use]
    pub fn now(&self) -> Time {
        self.handle.now()
    }

    /// Suspends the task for `duration`.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        self.sleep_until(self.now() + duration)
    }

    /// Suspends the task until `deadline`.
    pub fn sleep_until(&self, deadline: Time) -> Sleep {
        Sleep::new(self.handle.clone(), deadline)
    }

    /// Suspends the task once, letting every other ready task run first.
    pub fn yield_now(&self) -> YieldNow {
        YieldNow::new(self.handle.clone())
    }

    /// Spawns a sibling task. See [`Handle::spawn`].
    pub fn spawn<F, Fut, T>(&self, f: F) -> TaskHandle<T>
    where
        F: FnOnce(Cx) -> Fut,
        Fut: Future<Output = Result<T>> + 'static,
        T: 'static,
    {
        self.handle.spawn(f)
    }

    /// Requests cancellation of another task, recording this task as origin.
    pub fn cancel(&self, task_id: TaskId) -> bool {
        let reason = match self.task_id {
            Some(origin) => CancelReason::default().with_origin(origin),
            None => CancelReason::default(),
        };
        self.handle.cancel_with_reason(task_id, reason)
    }

    /// Returns true if this task has a cancellation request pending.
    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.task_id
            .is_some_and(|task_id| self.handle.is_cancel_requested(task_id))
    }

    /// Runs `fut` under a guard that cancels it `delay` from now.
    ///
    /// `None` disables the deadline.
    ///
    /// # Errors
    ///
    /// `DeadlineExceeded` if the guard's own timer fired, otherwise whatever
    /// `fut` returned.
    pub async fn timeout<F, T>(&self, delay: Option<Duration>, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        make_timeout(self, delay).run(self, fut).await
    }

    /// Runs `fut` under a guard that cancels it at `deadline`.
    ///
    /// # Errors
    ///
    /// Same as [`timeout`](Self::timeout).
    pub async fn timeout_at<F, T>(&self, deadline: Option<Time>, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        Timeout::new(deadline).run(self, fut).await
    }
}

impl std::fmt::Debug for Cx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cx")
            .field("task_id", &self.task_id)
            .finish_non_exhaustive()
    }
}
