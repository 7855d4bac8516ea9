//! Runtime builder and run loop.

use super::config::{ClockKind, RuntimeConfig};
use super::handle::Handle;
use super::waker::TaskWaker;
use crate::cx::Cx;
use crate::error::{Error, ErrorKind, Result};
use crate::time::{TimeSource, VirtualClock, WallClock};
use crate::tracing_compat::{debug, trace, warn};
use crate::types::{TaskId, Time};
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Builder for constructing a runtime with custom configuration.
#[derive(Clone)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    time_source: Option<Arc<dyn TimeSource>>,
}

impl RuntimeBuilder {
    /// Create a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            time_source: None,
        }
    }

    /// Builder over a deterministic virtual clock starting at zero.
    #[must_use]
    pub fn virtual_time() -> Self {
        Self::new().clock(ClockKind::Virtual)
    }

    /// Builder over the monotonic wall clock.
    #[must_use]
    pub fn wall_clock() -> Self {
        Self::new().clock(ClockKind::Wall)
    }

    /// Select the clock.
    #[must_use]
    pub fn clock(mut self, clock: ClockKind) -> Self {
        self.config.clock = clock;
        self
    }

    /// Use a caller-supplied time source instead of the configured clock.
    ///
    /// Handy for tests that start a virtual clock at a non-zero instant.
    #[must_use]
    pub fn time_source(mut self, source: Arc<dyn TimeSource>) -> Self {
        self.time_source = Some(source);
        self
    }

    /// Cap the number of task polls per [`Runtime::block_on`] call.
    #[must_use]
    pub fn max_steps(mut self, steps: u64) -> Self {
        self.config.max_steps = Some(steps);
        self
    }

    /// Remove the step cap.
    #[must_use]
    pub fn no_step_limit(mut self) -> Self {
        self.config.max_steps = None;
        self
    }

    /// Apply `COOP_TIMEOUT_*` environment overrides on top of the current
    /// settings.
    ///
    /// # Errors
    ///
    /// A `Config` error if a variable holds an unparseable value.
    pub fn from_env(mut self) -> Result<Self> {
        super::env_config::apply_env_overrides(&mut self.config)?;
        Ok(self)
    }

    /// Apply settings from a TOML file on top of the current settings.
    ///
    /// # Errors
    ///
    /// A `Config` error if the file cannot be read or parsed.
    #[cfg(feature = "config-file")]
    pub fn with_config_file(mut self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        let parsed = super::env_config::parse_toml_file(path.as_ref())?;
        super::env_config::apply_toml_config(&mut self.config, &parsed);
        Ok(self)
    }

    /// Returns the configuration accumulated so far.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Build a runtime from this configuration.
    ///
    /// # Errors
    ///
    /// A `Config` error if the configuration fails validation.
    pub fn build(self) -> Result<Runtime> {
        Runtime::with_config(self.config, self.time_source)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuntimeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeBuilder")
            .field("config", &self.config)
            .field("custom_time_source", &self.time_source.is_some())
            .finish()
    }
}

/// Single-threaded cooperative runtime.
///
/// Tasks run one at a time in FIFO ready order and switch only at suspension
/// points. When nothing is ready the run loop moves the clock to the earliest
/// armed timer.
pub struct Runtime {
    handle: Handle,
    config: RuntimeConfig,
}

impl Runtime {
    fn with_config(
        config: RuntimeConfig,
        time_source: Option<Arc<dyn TimeSource>>,
    ) -> Result<Self> {
        config.validate()?;
        let clock = time_source.unwrap_or_else(|| match config.clock {
            ClockKind::Virtual => Arc::new(VirtualClock::new()) as Arc<dyn TimeSource>,
            ClockKind::Wall => Arc::new(WallClock::new()),
        });
        debug!(clock = %config.clock, max_steps = ?config.max_steps, "runtime built");
        Ok(Self {
            handle: Handle::new(clock),
            config,
        })
    }

    /// Returns a handle to this runtime.
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Returns the current time in the runtime's clock domain.
    #[must_use]
    pub fn now(&self) -> Time {
        self.handle.now()
    }

    /// Returns the runtime configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Spawns the routine built by `f` as the root task and drives the
    /// runtime until the root terminates.
    ///
    /// Other tasks still live when the root finishes stay parked and resume
    /// on the next `block_on` call.
    ///
    /// # Errors
    ///
    /// - the root task's own error (a cancellation error if it was cancelled)
    /// - `Deadlock` if the root is blocked with nothing ready and no timer armed
    /// - `StepLimitExceeded` if the configured poll cap is hit
    /// - `Usage` if called from inside a task
    pub fn block_on<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Cx) -> Fut,
        Fut: Future<Output = Result<T>> + 'static,
        T: 'static,
    {
        if let Some(task_id) = self.handle.current_task() {
            return Err(Error::usage("block_on called from inside a task").with_task(task_id));
        }

        let root = self.handle.spawn(f);
        let start = self.handle.steps();
        while !root.is_finished() {
            self.wake_due_timers();
            if let Some(task_id) = self.handle.shared().ready.pop() {
                if let Some(limit) = self.config.max_steps {
                    if self.handle.steps() - start >= limit {
                        self.handle.shared().ready.schedule(task_id);
                        warn!(limit, root = %root.task_id(), "step limit exceeded");
                        return Err(Error::new(ErrorKind::StepLimitExceeded)
                            .with_message(format!("exceeded {limit} task polls"))
                            .with_task(root.task_id()));
                    }
                }
                self.poll_task(task_id);
                continue;
            }
            if !self.advance_to_next_timer() {
                warn!(
                    root = %root.task_id(),
                    live_tasks = self.handle.live_tasks(),
                    "deadlock: no ready task and no armed timer"
                );
                return Err(Error::new(ErrorKind::Deadlock)
                    .with_message("no ready task and no armed timer")
                    .with_task(root.task_id()));
            }
        }

        root.try_take().map_or_else(
            || Err(Error::internal("root outcome missing")),
            crate::types::Outcome::into_result,
        )
    }

    fn poll_task(&self, task_id: TaskId) {
        let shared = self.handle.shared();
        let Some(mut future) = shared.state.borrow_mut().begin_poll(task_id) else {
            return;
        };
        trace!(task_id = %task_id, "polling task");

        let waker = TaskWaker::waker(task_id, Arc::clone(&shared.ready));
        let mut cx = Context::from_waker(&waker);
        match future.as_mut().poll(&mut cx) {
            Poll::Pending => shared.state.borrow_mut().suspend(task_id, future),
            Poll::Ready(status) => {
                let waiters = shared.state.borrow_mut().complete(task_id);
                drop(future);
                debug!(task_id = %task_id, status = %status, "task finished");
                for waiter in waiters {
                    waiter.wake();
                }
            }
        }
    }

    /// Wakes every timer already due without moving the clock.
    fn wake_due_timers(&self) {
        let shared = self.handle.shared();
        let now = shared.clock.now();
        let due = shared.state.borrow_mut().expire_timers(now);
        for waker in due {
            waker.wake();
        }
    }

    /// Moves the clock to the earliest armed timer and wakes everything due.
    ///
    /// Returns false if no timer is armed.
    fn advance_to_next_timer(&self) -> bool {
        let shared = self.handle.shared();
        let Some(deadline) = shared.state.borrow().next_deadline() else {
            return false;
        };
        trace!(deadline = ?deadline, "idle, advancing clock");
        shared.clock.wait_until(deadline);
        self.wake_due_timers();
        true
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        // Task futures hold handles back to the runtime; dropping them after
        // the borrow is released breaks the cycle.
        let records = match self.handle.shared().state.try_borrow_mut() {
            Ok(mut state) => state.drain_tasks(),
            Err(_) => return,
        };
        if !records.is_empty() {
            debug!(tasks = records.len(), "dropping unfinished tasks");
        }
        drop(records);
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("ready", &self.handle.shared().ready.len())
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_logging, test_runtime};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn block_on_returns_root_value() {
        init_test_logging();
        let runtime = test_runtime();
        assert_eq!(runtime.block_on(|_| async { Ok(7) }).unwrap(), 7);
    }

    #[test]
    fn ready_tasks_run_in_fifo_order() {
        init_test_logging();
        let runtime = test_runtime();
        let log = Rc::new(RefCell::new(Vec::new()));
        let out = Rc::clone(&log);
        runtime
            .block_on(move |cx| async move {
                let mut children = Vec::new();
                for n in 0..3 {
                    let log = Rc::clone(&out);
                    children.push(cx.spawn(move |cx| async move {
                        log.borrow_mut().push((n, 0));
                        cx.yield_now().await?;
                        log.borrow_mut().push((n, 1));
                        Ok(())
                    }));
                }
                for child in &children {
                    child.join().await?;
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(
            *log.borrow(),
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );
    }

    #[test]
    fn blocked_root_is_a_deadlock() {
        init_test_logging();
        let runtime = test_runtime();
        let err = runtime
            .block_on(|cx| async move {
                let stuck = cx.spawn(|_| async {
                    std::future::pending::<()>().await;
                    Ok(())
                });
                stuck.join().await
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Deadlock);
    }

    #[test]
    fn step_limit_aborts_busy_loop() {
        init_test_logging();
        let runtime = RuntimeBuilder::virtual_time().max_steps(50).build().unwrap();
        let err = runtime
            .block_on(|cx| async move {
                let mut polls = 0_u64;
                while polls < u64::MAX {
                    cx.yield_now().await?;
                    polls += 1;
                }
                Ok(polls)
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StepLimitExceeded);
        assert_eq!(runtime.handle().steps(), 50);
    }

    #[test]
    fn zero_step_limit_is_rejected_at_build() {
        let err = RuntimeBuilder::new().max_steps(0).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn block_on_inside_a_task_is_usage_error() {
        init_test_logging();
        let runtime = Rc::new(test_runtime());
        let inner = Rc::clone(&runtime);
        let err = runtime
            .block_on(move |_| async move { inner.block_on(|_| async { Ok(()) }) })
            .unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn idle_runtime_jumps_virtual_clock() {
        init_test_logging();
        let clock = Arc::new(VirtualClock::starting_at(Time::from_secs(100)));
        let runtime = RuntimeBuilder::new().time_source(clock).build().unwrap();
        runtime
            .block_on(|cx| async move { cx.sleep(Duration::from_millis(250)).await })
            .unwrap();
        assert_eq!(runtime.now(), Time::from_millis(100_250));
    }

    #[test]
    fn wall_clock_sleep_actually_waits() {
        init_test_logging();
        let runtime = RuntimeBuilder::wall_clock().build().unwrap();
        let started = std::time::Instant::now();
        runtime
            .block_on(|cx| async move { cx.sleep(Duration::from_millis(20)).await })
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn leftover_tasks_are_dropped_with_runtime() {
        init_test_logging();
        let runtime = test_runtime();
        let handle = runtime.handle();
        runtime
            .block_on(|cx| async move {
                cx.spawn(|cx| async move { cx.sleep(Duration::from_secs(3600)).await });
                Ok(())
            })
            .unwrap();
        assert_eq!(handle.live_tasks(), 1);
        drop(runtime);
        assert_eq!(handle.live_tasks(), 0);
        assert_eq!(handle.armed_timers(), 0);
    }
}
