//! Single-in-flight guard per subject.

use parking_lot::Mutex;
use std::collections::HashSet;

/// Subjects (by address) with a transition currently running on one
/// machine.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    active: Mutex<HashSet<usize>>,
}

/// Marks a subject busy until dropped.
#[derive(Debug)]
pub(crate) struct FlightGuard<'a> {
    owner: &'a InFlight,
    key: usize,
}

impl InFlight {
    /// Claim `subject`, or `None` if a transition is already running on it.
    pub(crate) fn enter<T>(&self, subject: &T) -> Option<FlightGuard<'_>> {
        let key = subject as *const T as usize;
        if !self.active.lock().insert(key) {
            return None;
        }
        Some(FlightGuard { owner: self, key })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.active.lock().remove(&self.key);
    }
}
