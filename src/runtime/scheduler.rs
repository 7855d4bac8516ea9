//! FIFO ready queue.
//!
//! Tasks are polled in the order they became ready. A task that is already
//! queued is not queued twice, so a burst of wakeups (timer plus
//! cancellation, say) costs one poll. Tasks woken by cancellation go to the
//! back like everyone else, which keeps tasks that keep cancelling each other
//! from starving the rest.

use crate::types::TaskId;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default)]
struct ReadyInner {
    queue: VecDeque<TaskId>,
    queued: HashSet<TaskId>,
}

/// Queue of tasks ready to be polled.
///
/// Shared with wakers, which may be cloned into foreign futures, hence the
/// lock even though the runtime itself is single-threaded.
#[derive(Debug, Default)]
pub(crate) struct ReadyQueue {
    inner: Mutex<ReadyInner>,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Marks a task ready. Returns false if it was already queued.
    pub(crate) fn schedule(&self, task_id: TaskId) -> bool {
        let mut inner = self.inner.lock();
        if inner.queued.insert(task_id) {
            inner.queue.push_back(task_id);
            true
        } else {
            false
        }
    }

    /// Pops the next task to poll.
    pub(crate) fn pop(&self) -> Option<TaskId> {
        let mut inner = self.inner.lock();
        let task_id = inner.queue.pop_front()?;
        inner.queued.remove(&task_id);
        Some(task_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(n: u64) -> TaskId {
        TaskId::new_for_test(n)
    }

    #[test]
    fn pops_in_fifo_order() {
        let queue = ReadyQueue::new();
        queue.schedule(task(1));
        queue.schedule(task(2));
        queue.schedule(task(3));

        assert_eq!(queue.pop(), Some(task(1)));
        assert_eq!(queue.pop(), Some(task(2)));
        assert_eq!(queue.pop(), Some(task(3)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn duplicate_wakeups_collapse() {
        let queue = ReadyQueue::new();
        assert!(queue.schedule(task(1)));
        assert!(!queue.schedule(task(1)));
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.pop(), Some(task(1)));
        assert!(queue.is_empty());
        // Once popped it can be queued again.
        assert!(queue.schedule(task(1)));
    }

    #[test]
    fn rescheduled_task_goes_to_the_back() {
        let queue = ReadyQueue::new();
        queue.schedule(task(1));
        queue.schedule(task(2));
        let first = queue.pop().unwrap();
        queue.schedule(first);

        assert_eq!(queue.pop(), Some(task(2)));
        assert_eq!(queue.pop(), Some(task(1)));
    }
}
