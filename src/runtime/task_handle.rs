//! `TaskHandle` for observing and awaiting spawned tasks.
//!
//! `TaskHandle<T>` is returned by spawn operations. It does not own the task:
//! dropping the handle leaves the task running. It offers two ways to wait:
//!
//! - [`join`](TaskHandle::join) is an ordinary suspension point. It observes
//!   cancellation of the *awaiting* task, and a cancelled *target* surfaces as
//!   a cancellation error in the awaiter.
//! - [`wait_shielded`](TaskHandle::wait_shielded) ignores cancellation of the
//!   awaiting task, leaving any request pending for its next suspension point.
//!   Cleanup code uses it to guarantee that a child is retired before moving on.

use super::handle::Handle;
use crate::error::{Error, Result};
use crate::types::{Outcome, TaskId, TaskStatus};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Where a task leaves its terminal status and outcome.
pub(crate) struct TaskSlot<T> {
    status: Cell<TaskStatus>,
    outcome: RefCell<Option<Outcome<T>>>,
}

impl<T> TaskSlot<T> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            status: Cell::new(TaskStatus::Running),
            outcome: RefCell::new(None),
        })
    }

    pub(crate) fn finish(&self, outcome: Outcome<T>) -> TaskStatus {
        let status = outcome.status();
        self.status.set(status);
        *self.outcome.borrow_mut() = Some(outcome);
        status
    }
}

/// A handle to a spawned task.
pub struct TaskHandle<T> {
    task_id: TaskId,
    slot: Rc<TaskSlot<T>>,
    handle: Handle,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(task_id: TaskId, slot: Rc<TaskSlot<T>>, handle: Handle) -> Self {
        Self {
            task_id,
            slot,
            handle,
        }
    }

    /// Returns the task ID of the spawned task.
    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the task's current status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.slot.status.get()
    }

    /// Returns true once the task has terminated.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Requests cancellation of the task.
    ///
    /// Returns true iff the request is new.
    pub fn cancel(&self) -> bool {
        self.handle.cancel(self.task_id)
    }

    pub(crate) fn cancel_quietly(&self, reason: crate::types::CancelReason) -> bool {
        self.handle.cancel_quietly(self.task_id, reason)
    }

    /// Inspects the terminal outcome without taking it.
    ///
    /// Returns `None` while the task runs or after the outcome was taken.
    pub fn peek<R>(&self, f: impl FnOnce(&Outcome<T>) -> R) -> Option<R> {
        self.slot.outcome.borrow().as_ref().map(f)
    }

    /// Takes the terminal outcome, if the task has finished.
    pub fn try_take(&self) -> Option<Outcome<T>> {
        self.slot.outcome.borrow_mut().take()
    }

    /// Waits for the task to terminate and returns its result.
    ///
    /// # Errors
    ///
    /// - a cancellation error if the awaiting task is cancelled while waiting,
    ///   or if the target task was cancelled
    /// - the target's own error if it failed
    /// - a usage error if the outcome was already taken
    pub fn join(&self) -> Join<'_, T> {
        Join { task: self }
    }

    /// Waits for the task to terminate, ignoring cancellation of the
    /// awaiting task, and returns the terminal status.
    pub fn wait_shielded(&self) -> WaitShielded<'_, T> {
        WaitShielded { task: self }
    }

    fn register(&self, cx: &Context<'_>) {
        if !self.handle.add_join_waiter(self.task_id, cx.waker()) {
            // Terminated between the status check and registration.
            cx.waker().wake_by_ref();
        }
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("task_id", &self.task_id)
            .field("status", &self.status())
            .finish()
    }
}

/// Future returned by [`TaskHandle::join`].
#[must_use = "futures do nothing unless awaited"]
pub struct Join<'a, T> {
    task: &'a TaskHandle<T>,
}

impl<T> Future for Join<'_, T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let task = self.task;
        if let Some(reason) = task.handle.take_cancel_for_current() {
            return Poll::Ready(Err(Error::cancelled(reason)));
        }
        if task.is_finished() {
            return Poll::Ready(match task.try_take() {
                Some(outcome) => outcome.into_result(),
                None => Err(Error::usage("task output already taken").with_task(task.task_id)),
            });
        }
        task.register(cx);
        Poll::Pending
    }
}

/// Future returned by [`TaskHandle::wait_shielded`].
#[must_use = "futures do nothing unless awaited"]
pub struct WaitShielded<'a, T> {
    task: &'a TaskHandle<T>,
}

impl<T> Future for WaitShielded<'_, T> {
    type Output = TaskStatus;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let task = self.task;
        if task.is_finished() {
            return Poll::Ready(task.status());
        }
        task.register(cx);
        Poll::Pending
    }
}
