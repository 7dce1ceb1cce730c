//! Recording fixtures for release-order assertions.

use std::cell::RefCell;
use std::rc::Rc;

use warden_core::{Disposable, ReleaseError};

/// Shared, ordered record of released obligations.
///
/// Clones share one underlying log, so a fixture handed to a scope and the
/// log kept by the test observe the same entries.
#[derive(Clone, Debug, Default)]
pub struct ReleaseLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl ReleaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `label` to the log.
    pub fn record(&self, label: impl Into<String>) {
        self.entries.borrow_mut().push(label.into());
    }

    /// A cleanup closure that records `label` when run.
    pub fn action(&self, label: impl Into<String>) -> impl FnOnce() + 'static {
        let log = self.clone();
        let label = label.into();
        move || log.record(label)
    }

    /// A cleanup closure that records `label` and then panics.
    pub fn panicking_action(&self, label: impl Into<String>) -> impl FnOnce() + 'static {
        let log = self.clone();
        let label = label.into();
        move || {
            log.record(label.clone());
            panic!("obligation {label} failed");
        }
    }

    /// A disposable that records `label` when disposed.
    pub fn disposable(&self, label: impl Into<String>) -> MockDisposable {
        MockDisposable::new(self.clone(), label, Behaviour::Succeed)
    }

    /// A disposable that records `label` and then returns an error.
    pub fn failing_disposable(&self, label: impl Into<String>) -> MockDisposable {
        MockDisposable::new(self.clone(), label, Behaviour::Fail)
    }

    /// A disposable that records `label` and then panics.
    pub fn panicking_disposable(&self, label: impl Into<String>) -> MockDisposable {
        MockDisposable::new(self.clone(), label, Behaviour::Panic)
    }

    /// Snapshot of the log.
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// How many times `label` was recorded.
    pub fn count(&self, label: &str) -> usize {
        self.entries.borrow().iter().filter(|e| *e == label).count()
    }

    /// Position of the first occurrence of `label`.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.entries.borrow().iter().position(|e| e == label)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

/// A [`Disposable`] that writes to a [`ReleaseLog`].
#[derive(Debug)]
pub struct MockDisposable {
    log: ReleaseLog,
    label: String,
    behaviour: Behaviour,
}

impl MockDisposable {
    fn new(log: ReleaseLog, label: impl Into<String>, behaviour: Behaviour) -> Self {
        Self {
            log,
            label: label.into(),
            behaviour,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Disposable for MockDisposable {
    fn dispose(&mut self) -> Result<(), ReleaseError> {
        self.log.record(self.label.clone());
        match self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => Err(ReleaseError::failed(format!("{} refused", self.label))),
            Behaviour::Panic => panic!("{} panicked during dispose", self.label),
        }
    }
}
