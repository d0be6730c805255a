//! Cheap change notification shared between the parameter store and pollers.

use std::sync::atomic::{AtomicBool, Ordering};

/// Set by writers, consumed by a single poller with [`compare_and_clear`].
///
/// [`compare_and_clear`]: ChangeFlag::compare_and_clear
#[derive(Debug, Default)]
pub struct ChangeFlag {
    changed: AtomicBool,
}

impl ChangeFlag {
    pub fn new(initially_set: bool) -> Self {
        Self {
            changed: AtomicBool::new(initially_set),
        }
    }

    /// Raise the flag.
    pub fn mark(&self) {
        self.changed.store(true, Ordering::Release);
    }

    /// Returns whether the flag was set, clearing it in the same step.
    pub fn compare_and_clear(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_is_consumed_once() {
        let flag = ChangeFlag::new(false);
        assert!(!flag.compare_and_clear());
        flag.mark();
        flag.mark();
        assert!(flag.is_set());
        assert!(flag.compare_and_clear());
        assert!(!flag.compare_and_clear());
    }

    #[test]
    fn initially_set_flag_fires_first_poll() {
        let flag = ChangeFlag::new(true);
        assert!(flag.compare_and_clear());
    }
}
