//! Sleep and yield futures.
//!
//! Both are suspension points: on every poll they first check whether the
//! polling task has a pending cancellation and, if so, resolve to a
//! cancellation error instead of sleeping on.

use crate::error::{Error, Result};
use crate::runtime::state::TimerKey;
use crate::runtime::Handle;
use crate::types::Time;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that completes once the runtime clock reaches a deadline.
///
/// `Sleep` always suspends at least once, so a zero or past deadline means
/// "resume at the next scheduling opportunity" rather than "do not yield".
///
/// # Cancel Safety
///
/// Dropping a `Sleep` disarms its timer. A delivered cancellation is consumed:
/// the error is the only notice the task gets.
#[must_use = "futures do nothing unless awaited"]
pub struct Sleep {
    deadline: Time,
    handle: Handle,
    timer: Option<TimerKey>,
    yielded: bool,
}

impl Sleep {
    pub(crate) fn new(handle: Handle, deadline: Time) -> Self {
        Self {
            deadline,
            handle,
            timer: None,
            yielded: false,
        }
    }

    /// Returns the deadline for this sleep.
    #[must_use]
    pub const fn deadline(&self) -> Time {
        self.deadline
    }

    fn disarm(&mut self) {
        if let Some(key) = self.timer.take() {
            self.handle.cancel_timer(key);
        }
    }
}

impl Future for Sleep {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(reason) = this.handle.take_cancel_for_current() {
            this.disarm();
            return Poll::Ready(Err(Error::cancelled(reason)));
        }

        let now = this.handle.now();
        if this.yielded && now >= this.deadline {
            this.disarm();
            return Poll::Ready(Ok(()));
        }

        this.yielded = true;
        if now >= this.deadline {
            cx.waker().wake_by_ref();
        } else if this.timer.is_none() {
            this.timer = Some(this.handle.register_timer(this.deadline, cx.waker().clone()));
        }
        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        self.disarm();
    }
}

impl std::fmt::Debug for Sleep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sleep")
            .field("deadline", &self.deadline)
            .field("armed", &self.timer.is_some())
            .finish()
    }
}

/// A future that suspends exactly once.
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    handle: Handle,
    yielded: bool,
}

impl YieldNow {
    pub(crate) fn new(handle: Handle) -> Self {
        Self {
            handle,
            yielded: false,
        }
    }
}

impl Future for YieldNow {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(reason) = this.handle.take_cancel_for_current() {
            return Poll::Ready(Err(Error::cancelled(reason)));
        }
        if this.yielded {
            return Poll::Ready(Ok(()));
        }
        this.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

impl std::fmt::Debug for YieldNow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YieldNow")
            .field("yielded", &self.yielded)
            .finish()
    }
}
