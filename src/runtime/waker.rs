//! Task wakers.

use super::scheduler::ReadyQueue;
use crate::types::TaskId;
use std::sync::Arc;
use std::task::{Wake, Waker};

/// Waker that re-queues its task on the runtime's ready queue.
#[derive(Debug)]
pub(crate) struct TaskWaker {
    task_id: TaskId,
    ready: Arc<ReadyQueue>,
}

impl TaskWaker {
    pub(crate) fn waker(task_id: TaskId, ready: Arc<ReadyQueue>) -> Waker {
        Waker::from(Arc::new(Self { task_id, ready }))
    }
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.ready.schedule(self.task_id);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.ready.schedule(self.task_id);
    }
}
