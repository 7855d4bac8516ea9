//! The timer task behind a timeout guard.
//!
//! A timer task sleeps until its deadline and then, if its completion action
//! is still [`CompletionAction::Armed`], cancels the owner task with a
//! timeout reason whose origin is the timer itself. Retiring a timer both
//! disarms the tag and cancels the task: cancellation stops a timer that is
//! still asleep, the tag stops one that has already woken but not yet run.

use crate::error::Error;
use crate::runtime::{Handle, TaskHandle};
use crate::tracing_compat::debug;
use crate::types::{CancelReason, Outcome, TaskId, TaskStatus, Time};
use std::cell::Cell;
use std::rc::Rc;

/// What a timer does when it completes without being cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionAction {
    /// Cancel the owner.
    Armed,
    /// Do nothing.
    Disarmed,
}

/// Terminal status of a timer task as the guard sees it.
#[derive(Debug, Clone)]
pub enum CompletionStatus {
    /// Still sleeping or queued.
    Pending,
    /// Ran to completion with the given action in effect.
    CompletedNormally(CompletionAction),
    /// Cancelled before it woke.
    Cancelled,
    /// Terminated with an error other than cancellation.
    Failed(Error),
}

impl CompletionStatus {
    /// Returns true if the timer fired while armed.
    #[must_use]
    pub const fn fired(&self) -> bool {
        matches!(self, Self::CompletedNormally(CompletionAction::Armed))
    }

    /// Returns true once the timer has terminated.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A spawned timer task together with its completion-action tag.
pub(crate) struct TimerTask {
    task: TaskHandle<CompletionAction>,
    action: Rc<Cell<CompletionAction>>,
    deadline: Time,
}

impl TimerTask {
    /// Spawns a timer that cancels `owner` at `deadline`.
    pub(crate) fn spawn(handle: &Handle, owner: TaskId, deadline: Time) -> Self {
        let action = Rc::new(Cell::new(CompletionAction::Armed));
        let tag = Rc::clone(&action);
        let task = handle.spawn(move |cx| async move {
            cx.sleep_until(deadline).await?;
            let action = tag.get();
            if action == CompletionAction::Armed {
                let reason = match cx.task_id() {
                    Some(timer) => CancelReason::timeout().with_origin(timer),
                    None => CancelReason::timeout(),
                };
                let requested = cx.handle().cancel_with_reason(owner, reason);
                debug!(owner = %owner, deadline = ?deadline, requested, "timeout fired");
            }
            Ok(action)
        });
        Self {
            task,
            action,
            deadline,
        }
    }

    pub(crate) fn task_id(&self) -> TaskId {
        self.task.task_id()
    }

    pub(crate) const fn deadline(&self) -> Time {
        self.deadline
    }

    pub(crate) fn status(&self) -> CompletionStatus {
        match self.task.status() {
            TaskStatus::Running => CompletionStatus::Pending,
            TaskStatus::Cancelled => CompletionStatus::Cancelled,
            TaskStatus::Completed => {
                let action = self.task.peek(|outcome| match outcome {
                    Outcome::Ok(action) => *action,
                    _ => CompletionAction::Disarmed,
                });
                CompletionStatus::CompletedNormally(action.unwrap_or(CompletionAction::Disarmed))
            }
            TaskStatus::Failed => {
                let err = self.task.peek(|outcome| match outcome {
                    Outcome::Err(err) => err.clone(),
                    _ => Error::internal("timer outcome mismatch"),
                });
                CompletionStatus::Failed(
                    err.unwrap_or_else(|| Error::internal("timer outcome missing")),
                )
            }
        }
    }

    /// Disarms and cancels the timer if it is still pending.
    pub(crate) fn retire(&self) {
        if self.task.is_finished() {
            return;
        }
        self.action.set(CompletionAction::Disarmed);
        self.task.cancel();
        debug!(timer = %self.task_id(), deadline = ?self.deadline, "timer retired");
    }

    /// [`retire`](Self::retire) for use from `Drop`.
    pub(crate) fn retire_quietly(&self) {
        if self.task.is_finished() {
            return;
        }
        self.action.set(CompletionAction::Disarmed);
        self.task.cancel_quietly(CancelReason::default());
    }

    /// Waits for the timer to terminate, ignoring cancellation of the caller.
    pub(crate) async fn wait(&self) -> TaskStatus {
        self.task.wait_shielded().await
    }
}

impl std::fmt::Debug for TimerTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerTask")
            .field("task_id", &self.task_id())
            .field("deadline", &self.deadline)
            .field("action", &self.action.get())
            .field("status", &self.task.status())
            .finish()
    }
}
