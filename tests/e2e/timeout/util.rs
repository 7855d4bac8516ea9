//! Test utilities for timeout E2E tests.

use crate::common::init_test_logging;
use std::cell::RefCell;
use std::rc::Rc;

/// Initialize logging and announce the test.
pub fn init_test(test_name: &str) {
    init_test_logging();
    test_phase!(test_name);
}

/// Ordered record of what a task body got to do.
#[derive(Debug, Clone, Default)]
pub struct StepLog {
    steps: Rc<RefCell<Vec<&'static str>>>,
}

impl StepLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn push(&self, step: &'static str) {
        self.steps.borrow_mut().push(step);
    }

    /// Copy out the steps recorded so far.
    pub fn snapshot(&self) -> Vec<&'static str> {
        self.steps.borrow().clone()
    }
}
