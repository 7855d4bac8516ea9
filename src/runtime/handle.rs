//! Runtime handle: the scheduler surface that tasks and guards consume.
//!
//! A [`Handle`] is cheap to clone and single-threaded. It exposes exactly what
//! the timeout guard needs from the scheduler: read the clock, spawn a task,
//! identify the running task, request cancellation, and observe completion.

use super::scheduler::ReadyQueue;
use super::state::{RuntimeState, TimerKey};
use super::task_handle::{TaskHandle, TaskSlot};
use crate::cx::Cx;
use crate::error::Result;
use crate::time::TimeSource;
use crate::tracing_compat::{debug, trace};
use crate::types::{CancelReason, Outcome, TaskId, Time};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::task::Waker;

/// State shared by the runtime and all of its handles.
pub(crate) struct Shared {
    pub(crate) state: RefCell<RuntimeState>,
    pub(crate) ready: Arc<ReadyQueue>,
    pub(crate) clock: Arc<dyn TimeSource>,
}

/// Handle to a running cooperative runtime.
#[derive(Clone)]
pub struct Handle {
    shared: Rc<Shared>,
}

impl Handle {
    pub(crate) fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(RuntimeState::new()),
                ready: Arc::new(ReadyQueue::new()),
                clock,
            }),
        }
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    /// Returns the current time in the runtime's clock domain.
    #[must_use]
    pub fn now(&self) -> Time {
        self.shared.clock.now()
    }

    /// Spawns a task running the routine built by `f`.
    ///
    /// The routine receives the new task's [`Cx`]. It does not start running
    /// until the run loop polls it.
    pub fn spawn<F, Fut, T>(&self, f: F) -> TaskHandle<T>
    where
        F: FnOnce(Cx) -> Fut,
        Fut: Future<Output = Result<T>> + 'static,
        T: 'static,
    {
        let task_id = self.shared.state.borrow_mut().next_task_id();
        let slot = TaskSlot::new();
        let routine = f(Cx::new(Some(task_id), self.clone()));
        let writer = Rc::clone(&slot);
        let future = Box::pin(async move {
            let outcome = Outcome::from(routine.await);
            writer.finish(outcome)
        });

        self.shared.state.borrow_mut().insert_task(task_id, future);
        self.shared.ready.schedule(task_id);
        debug!(task_id = %task_id, "task spawned");
        TaskHandle::new(task_id, slot, self.clone())
    }

    /// Requests cancellation of a task with a user reason.
    ///
    /// Returns true iff the request is new: false for a finished task or one
    /// whose previous request has not been delivered yet.
    pub fn cancel(&self, task_id: TaskId) -> bool {
        self.cancel_with_reason(task_id, CancelReason::default())
    }

    /// Requests cancellation of a task with an explicit reason.
    ///
    /// The task observes the request at its next suspension point.
    pub fn cancel_with_reason(&self, task_id: TaskId, reason: CancelReason) -> bool {
        let requested = self
            .shared
            .state
            .borrow_mut()
            .request_cancel(task_id, reason.clone());
        if requested {
            self.shared.ready.schedule(task_id);
            debug!(task_id = %task_id, reason = %reason, "cancellation requested");
        }
        requested
    }

    /// Same as [`cancel_with_reason`](Self::cancel_with_reason), but a no-op
    /// when the runtime state is already borrowed. For use from `Drop`.
    pub(crate) fn cancel_quietly(&self, task_id: TaskId, reason: CancelReason) -> bool {
        let Ok(mut state) = self.shared.state.try_borrow_mut() else {
            return false;
        };
        let requested = state.request_cancel(task_id, reason);
        drop(state);
        if requested {
            self.shared.ready.schedule(task_id);
        }
        requested
    }

    /// Withdraws a still-undelivered cancellation request issued by `origin`.
    ///
    /// Returns true if a request was withdrawn.
    pub fn withdraw_cancel(&self, task_id: TaskId, origin: TaskId) -> bool {
        let withdrawn = self
            .shared
            .state
            .borrow_mut()
            .withdraw_cancel(task_id, origin);
        if withdrawn {
            debug!(task_id = %task_id, origin = %origin, "cancellation withdrawn");
        }
        withdrawn
    }

    /// Same as [`withdraw_cancel`](Self::withdraw_cancel), but a no-op when
    /// the runtime state is already borrowed. For use from `Drop`.
    pub(crate) fn withdraw_cancel_quietly(&self, task_id: TaskId, origin: TaskId) -> bool {
        self.shared
            .state
            .try_borrow_mut()
            .is_ok_and(|mut state| state.withdraw_cancel(task_id, origin))
    }

    /// Returns true if a cancellation request is pending for the task.
    #[must_use]
    pub fn is_cancel_requested(&self, task_id: TaskId) -> bool {
        self.shared.state.borrow().has_pending_cancel(task_id)
    }

    /// Returns the task currently being polled, if any.
    #[must_use]
    pub fn current_task(&self) -> Option<TaskId> {
        self.shared.state.borrow().current()
    }

    /// Returns true if the task has not terminated yet.
    #[must_use]
    pub fn is_live(&self, task_id: TaskId) -> bool {
        self.shared.state.borrow().is_live(task_id)
    }

    /// Returns the number of tasks that have not terminated yet.
    #[must_use]
    pub fn live_tasks(&self) -> usize {
        self.shared.state.borrow().live_tasks()
    }

    /// Returns the number of armed sleep timers.
    #[must_use]
    pub fn armed_timers(&self) -> usize {
        self.shared.state.borrow().armed_timers()
    }

    /// Returns the number of task polls performed so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.shared.state.borrow().steps()
    }

    /// Returns a context that is not bound to any task.
    ///
    /// Useful for reading the clock or spawning from outside the run loop.
    /// Guards cannot be entered with it.
    #[must_use]
    pub fn detached_cx(&self) -> Cx {
        Cx::new(None, self.clone())
    }

    /// Consumes the pending cancellation of the task being polled.
    ///
    /// Every suspension point calls this first; it is how a cancellation
    /// request turns into an error in the cancelled task.
    pub(crate) fn take_cancel_for_current(&self) -> Option<CancelReason> {
        let mut state = self.shared.state.borrow_mut();
        let task_id = state.current()?;
        let reason = state.take_cancel(task_id);
        if let Some(reason) = reason.as_ref() {
            trace!(task_id = %task_id, reason = %reason, "cancellation delivered");
        }
        reason
    }

    pub(crate) fn register_timer(&self, deadline: Time, waker: Waker) -> TimerKey {
        trace!(deadline = ?deadline, "timer armed");
        self.shared
            .state
            .borrow_mut()
            .register_timer(deadline, waker)
    }

    pub(crate) fn cancel_timer(&self, key: TimerKey) {
        if let Ok(mut state) = self.shared.state.try_borrow_mut() {
            state.cancel_timer(key);
        }
    }

    pub(crate) fn add_join_waiter(&self, task_id: TaskId, waker: &Waker) -> bool {
        self.shared
            .state
            .borrow_mut()
            .add_join_waiter(task_id, waker)
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Handle");
        debug.field("now", &self.now());
        if let Ok(state) = self.shared.state.try_borrow() {
            debug
                .field("live_tasks", &state.live_tasks())
                .field("current", &state.current());
        }
        debug.finish_non_exhaustive()
    }
}
