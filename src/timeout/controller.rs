//! The timeout guard.
//!
//! A [`Timeout`] brackets a region of an owner task's code with a deadline.
//! Entering binds the owner and arms a timer task; exiting retires every
//! timer, waits for each to terminate, and reports `DeadlineExceeded` only
//! when this guard's own timer fired.
//!
//! # Lifecycle
//!
//! ```text
//! new ──enter──▶ entered ──reschedule*──▶ entered ──exit──▶ finished
//! ```
//!
//! Entering twice, rescheduling before entering, and rescheduling after exit
//! are usage errors that leave the timers untouched.

use super::timer::{CompletionStatus, TimerTask};
use crate::cx::Cx;
use crate::error::{Error, Result};
use crate::runtime::Handle;
use crate::tracing_compat::{debug, trace};
use crate::types::{TaskId, Time};
use std::future::Future;
use std::time::Duration;

/// Creates a guard whose deadline is `delay` from now on `cx`'s clock.
///
/// `None` disables the deadline: no timer is ever spawned.
#[must_use]
pub fn make_timeout(cx: &Cx, delay: Option<Duration>) -> Timeout {
    Timeout::new(delay.map(|delay| cx.now() + delay))
}

/// Creates a guard with an absolute deadline in the runtime's clock domain.
#[must_use]
pub fn make_timeout_at(deadline: Option<Time>) -> Timeout {
    Timeout::new(deadline)
}

/// A deadline-bounded cancellation guard.
///
/// The guard is bound to exactly one owner task. It owns its timer tasks
/// exclusively and references the owner only to cancel it.
///
/// # Example
///
/// ```
/// use coop_timeout::{make_timeout, runtime::RuntimeBuilder, ErrorKind};
/// use std::time::Duration;
///
/// let runtime = RuntimeBuilder::virtual_time().build()?;
/// let err = runtime
///     .block_on(|cx| async move {
///         let mut guard = make_timeout(&cx, Some(Duration::from_secs(1)));
///         guard.enter(&cx)?;
///         let slept = cx.sleep(Duration::from_secs(5)).await;
///         guard.exit(slept.err()).await
///     })
///     .unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
/// # Ok::<(), coop_timeout::Error>(())
/// ```
#[derive(Debug)]
pub struct Timeout {
    deadline: Option<Time>,
    owner: Option<TaskId>,
    handle: Option<Handle>,
    /// Every timer not yet known to be terminal, plus the most recent one.
    /// Only the last can be live; the rest are retired.
    timers: Vec<TimerTask>,
    finished: bool,
}

impl Timeout {
    /// Creates a guard with an absolute deadline. `None` means no timeout.
    #[must_use]
    pub const fn new(deadline: Option<Time>) -> Self {
        Self {
            deadline,
            owner: None,
            handle: None,
            timers: Vec::new(),
            finished: false,
        }
    }

    /// Returns the current deadline.
    #[must_use]
    pub const fn when(&self) -> Option<Time> {
        self.deadline
    }

    /// Returns the owner task, once entered.
    #[must_use]
    pub const fn owner(&self) -> Option<TaskId> {
        self.owner
    }

    /// Returns true once [`enter`](Self::enter) has succeeded.
    #[must_use]
    pub const fn is_entered(&self) -> bool {
        self.owner.is_some()
    }

    /// Returns true once [`exit`](Self::exit) has run.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the status of the most recent timer, or `None` if this guard
    /// never spawned one.
    #[must_use]
    pub fn timer_status(&self) -> Option<CompletionStatus> {
        self.timers.last().map(TimerTask::status)
    }

    /// Returns true iff the most recent timer fired while armed.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.timers.last().is_some_and(|timer| timer.status().fired())
    }

    /// Binds the guard to `cx`'s task and arms the initial timer.
    ///
    /// # Errors
    ///
    /// - `Usage("already entered")` on a second call
    /// - `Usage("no current task")` for a context not bound to a task
    pub fn enter(&mut self, cx: &Cx) -> Result<&mut Self> {
        if self.owner.is_some() {
            return Err(Error::usage("already entered"));
        }
        let owner = cx.task_id().ok_or_else(|| Error::usage("no current task"))?;
        self.owner = Some(owner);
        self.handle = Some(cx.handle().clone());
        trace!(owner = %owner, deadline = ?self.deadline, "timeout entered");
        self.reschedule(self.deadline)?;
        Ok(self)
    }

    /// Moves the deadline, retiring the current timer.
    ///
    /// A deadline at or before now fires at the next scheduling opportunity.
    /// `None` leaves no timer armed.
    ///
    /// # Errors
    ///
    /// - `Usage("already finished")` after [`exit`](Self::exit)
    /// - `Usage("not entered")` before [`enter`](Self::enter)
    /// - `Usage("already expired")` once the timer has fired; the owner's
    ///   cancellation is on its way and [`exit`](Self::exit) will report it
    pub fn reschedule(&mut self, deadline: Option<Time>) -> Result<()> {
        if self.finished {
            return Err(Error::usage("already finished"));
        }
        let (Some(owner), Some(handle)) = (self.owner, self.handle.as_ref()) else {
            return Err(Error::usage("not entered"));
        };
        if self.expired() {
            return Err(Error::usage("already expired"));
        }

        if let Some(current) = self.timers.last() {
            current.retire();
        }
        self.deadline = deadline;
        if let Some(deadline) = deadline {
            self.timers.retain(|timer| !timer.status().is_terminal());
            let timer = TimerTask::spawn(handle, owner, deadline);
            debug!(
                owner = %owner,
                timer = %timer.task_id(),
                deadline = ?deadline,
                "timeout armed"
            );
            self.timers.push(timer);
        }
        Ok(())
    }

    /// Leaves the guarded region.
    ///
    /// Retires every timer and waits for each to terminate, shielded from
    /// cancellation of the owner. If the guard's own timer fired, returns
    /// `DeadlineExceeded` with `error` chained as its source; otherwise
    /// returns `error` unchanged, or `Ok(())` if there is none.
    ///
    /// A second call does nothing beyond returning `error`.
    ///
    /// # Errors
    ///
    /// As described above, plus `Usage("not entered")` if the guard was
    /// never entered, with `error` chained as its source.
    pub async fn exit(&mut self, error: Option<Error>) -> Result<()> {
        match self.finish(error).await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Runs `fut` as the guarded region: enter, await, exit.
    ///
    /// # Errors
    ///
    /// Any error from [`enter`](Self::enter) or [`exit`](Self::exit); the
    /// region's own error when the deadline did not fire.
    pub async fn run<F, T>(mut self, cx: &Cx, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.enter(cx)?;
        let result = fut.await;
        match self.finish(result.as_ref().err().cloned()).await {
            Some(err) => Err(err),
            None => result,
        }
    }

    async fn finish(&mut self, error: Option<Error>) -> Option<Error> {
        if self.finished {
            return error;
        }
        let (Some(owner), Some(handle)) = (self.owner, self.handle.clone()) else {
            return Some(chain(Error::usage("not entered"), error));
        };
        self.finished = true;

        for timer in &self.timers {
            timer.retire();
        }
        for timer in &self.timers {
            let status = timer.wait().await;
            trace!(timer = %timer.task_id(), status = %status, "timer terminated");
        }
        for timer in &self.timers {
            handle.withdraw_cancel(owner, timer.task_id());
        }

        match self.timers.last() {
            Some(last) if last.status().fired() => {
                debug!(owner = %owner, deadline = ?last.deadline(), "deadline exceeded");
                let err = Error::deadline_exceeded(last.deadline()).with_task(owner);
                Some(chain(err, error))
            }
            _ => error,
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        if self.finished || self.owner.is_none() {
            return;
        }
        debug!(owner = ?self.owner, timers = self.timers.len(), "timeout dropped without exit");
        for timer in &self.timers {
            timer.retire_quietly();
        }
        if let (Some(owner), Some(handle)) = (self.owner, self.handle.as_ref()) {
            for timer in &self.timers {
                handle.withdraw_cancel_quietly(owner, timer.task_id());
            }
        }
    }
}

/// Attaches the region's own error, if any, as the source of `err`.
fn chain(err: Error, source: Option<Error>) -> Error {
    match source {
        Some(source) => err.with_source(source),
        None => err,
    }
}

/// Runs `fut` under a guard that cancels it `delay` from now.
///
/// # Errors
///
/// `DeadlineExceeded` if the guard's timer fired, otherwise `fut`'s own error.
pub async fn timeout<F, T>(cx: &Cx, delay: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    make_timeout(cx, delay).run(cx, fut).await
}

/// Runs `fut` under a guard that cancels it at `deadline`.
///
/// # Errors
///
/// Same as [`timeout`].
pub async fn timeout_at<F, T>(cx: &Cx, deadline: Option<Time>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    make_timeout_at(deadline).run(cx, fut).await
}
