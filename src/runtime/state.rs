//! Mutable runtime state: the task table, pending cancellations, and timers.
//!
//! All access goes through the runtime's `RefCell`. No borrow is held while a
//! task future is polled or dropped, so futures may freely call back into the
//! runtime (spawn, cancel, register timers) from inside `poll` and `Drop`.

use crate::types::{CancelReason, TaskId, TaskStatus, Time};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::task::Waker;

/// Type-erased task future. Resolves to the task's terminal status; the
/// typed outcome is written to the task's slot before it resolves.
pub(crate) type TaskFuture = Pin<Box<dyn Future<Output = TaskStatus>>>;

/// Record for a live (non-terminal) task.
pub(crate) struct TaskRecord {
    /// `None` while the task is being polled.
    future: Option<TaskFuture>,
    /// Cancellation requested but not yet observed at a suspension point.
    pending_cancel: Option<CancelReason>,
    /// Wakers of tasks waiting for this one to terminate.
    join_waiters: Vec<Waker>,
}

impl std::fmt::Debug for TaskRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRecord")
            .field("polling", &self.future.is_none())
            .field("pending_cancel", &self.pending_cancel)
            .field("join_waiters", &self.join_waiters.len())
            .finish()
    }
}

/// Key of an armed timer. Ordered by deadline, then by arming order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct TimerKey {
    deadline: Time,
    seq: u64,
}

impl TimerKey {
    pub(crate) const fn deadline(self) -> Time {
        self.deadline
    }
}

/// Runtime state.
#[derive(Debug, Default)]
pub(crate) struct RuntimeState {
    tasks: HashMap<TaskId, TaskRecord>,
    timers: BTreeMap<TimerKey, Waker>,
    next_task: u64,
    next_timer: u64,
    current: Option<TaskId>,
    steps: u64,
}

impl RuntimeState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocates the next task id.
    pub(crate) fn next_task_id(&mut self) -> TaskId {
        self.next_task += 1;
        TaskId::from_raw(self.next_task)
    }

    pub(crate) fn insert_task(&mut self, task_id: TaskId, future: TaskFuture) {
        self.tasks.insert(
            task_id,
            TaskRecord {
                future: Some(future),
                pending_cancel: None,
                join_waiters: Vec::new(),
            },
        );
    }

    /// Takes a task's future out for polling and marks it current.
    ///
    /// Returns `None` if the task is gone or already being polled.
    pub(crate) fn begin_poll(&mut self, task_id: TaskId) -> Option<TaskFuture> {
        let future = self.tasks.get_mut(&task_id)?.future.take()?;
        self.current = Some(task_id);
        self.steps += 1;
        Some(future)
    }

    /// Puts a still-pending future back after a poll.
    pub(crate) fn suspend(&mut self, task_id: TaskId, future: TaskFuture) {
        self.current = None;
        if let Some(record) = self.tasks.get_mut(&task_id) {
            record.future = Some(future);
        }
    }

    /// Retires a task that resolved. Returns the wakers of its joiners.
    pub(crate) fn complete(&mut self, task_id: TaskId) -> Vec<Waker> {
        self.current = None;
        self.tasks
            .remove(&task_id)
            .map(|record| record.join_waiters)
            .unwrap_or_default()
    }

    /// Removes every task, for teardown. The caller drops them after
    /// releasing its borrow.
    pub(crate) fn drain_tasks(&mut self) -> Vec<TaskRecord> {
        self.timers.clear();
        self.tasks.drain().map(|(_, record)| record).collect()
    }

    pub(crate) const fn current(&self) -> Option<TaskId> {
        self.current
    }

    pub(crate) const fn steps(&self) -> u64 {
        self.steps
    }

    pub(crate) fn is_live(&self, task_id: TaskId) -> bool {
        self.tasks.contains_key(&task_id)
    }

    pub(crate) fn live_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Records a cancellation request.
    ///
    /// Returns false if the task is gone or already has a request pending.
    /// A request from a different origin joins the pending one: its origin
    /// is cleared, so no single requester can withdraw it any more.
    pub(crate) fn request_cancel(&mut self, task_id: TaskId, reason: CancelReason) -> bool {
        let Some(record) = self.tasks.get_mut(&task_id) else {
            return false;
        };
        match record.pending_cancel.as_mut() {
            None => {
                record.pending_cancel = Some(reason);
                true
            }
            Some(pending) => {
                if pending.origin != reason.origin {
                    pending.origin = None;
                }
                false
            }
        }
    }

    /// Consumes the pending cancellation of a task, if any.
    pub(crate) fn take_cancel(&mut self, task_id: TaskId) -> Option<CancelReason> {
        self.tasks.get_mut(&task_id)?.pending_cancel.take()
    }

    pub(crate) fn has_pending_cancel(&self, task_id: TaskId) -> bool {
        self.tasks
            .get(&task_id)
            .is_some_and(|record| record.pending_cancel.is_some())
    }

    /// Drops a still-undelivered request that `origin` issued.
    pub(crate) fn withdraw_cancel(&mut self, task_id: TaskId, origin: TaskId) -> bool {
        match self.tasks.get_mut(&task_id) {
            Some(record)
                if record
                    .pending_cancel
                    .as_ref()
                    .is_some_and(|reason| reason.origin == Some(origin)) =>
            {
                record.pending_cancel = None;
                true
            }
            _ => false,
        }
    }

    /// Registers a waker to run when `task_id` terminates.
    ///
    /// Returns false if the task is already gone.
    pub(crate) fn add_join_waiter(&mut self, task_id: TaskId, waker: &Waker) -> bool {
        let Some(record) = self.tasks.get_mut(&task_id) else {
            return false;
        };
        if !record.join_waiters.iter().any(|w| w.will_wake(waker)) {
            record.join_waiters.push(waker.clone());
        }
        true
    }

    pub(crate) fn register_timer(&mut self, deadline: Time, waker: Waker) -> TimerKey {
        self.next_timer += 1;
        let key = TimerKey {
            deadline,
            seq: self.next_timer,
        };
        self.timers.insert(key, waker);
        key
    }

    pub(crate) fn cancel_timer(&mut self, key: TimerKey) {
        self.timers.remove(&key);
    }

    pub(crate) fn next_deadline(&self) -> Option<Time> {
        self.timers.keys().next().map(|key| key.deadline)
    }

    pub(crate) fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    /// Removes every timer due at `now`, in deadline order.
    pub(crate) fn expire_timers(&mut self, now: Time) -> Vec<Waker> {
        let mut due = Vec::new();
        while let Some(entry) = self.timers.first_entry() {
            if entry.key().deadline > now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }
}
