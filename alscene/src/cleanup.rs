//! Best-effort release of native resources.
//!
//! Teardown paths must visit every resource even when one of them fails, so failures
//! are logged and counted instead of propagated.

use crate::error::Result;

/// Outcome of a [`best_effort`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub released: usize,
    pub failed: usize,
}

impl ReleaseReport {
    pub fn total(&self) -> usize {
        self.released + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Runs one fallible release and logs a failure.
pub(crate) fn release<F>(what: &str, f: F) -> bool
where
    F: FnOnce() -> Result<()>,
{
    match f() {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to release {}: {}", what, e);
            false
        }
    }
}

/// Runs `destroy` over every item. A failing item is logged and the sweep continues.
pub fn best_effort<T, I, F>(what: &str, items: I, mut destroy: F) -> ReleaseReport
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Result<()>,
{
    let mut report = ReleaseReport::default();
    for item in items {
        if release(what, || destroy(item)) {
            report.released += 1;
        } else {
            report.failed += 1;
        }
    }
    report
}
