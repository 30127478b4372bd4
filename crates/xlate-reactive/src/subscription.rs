#![forbid(unsafe_code)]

//! RAII guard shared by every reactive source in this crate.

use std::any::Any;
use std::fmt;

/// Keeps a callback alive; dropping it unsubscribes.
///
/// Sources hold only a `Weak` to each callback, so once the guard is gone
/// the callback can no longer be upgraded and is skipped. The dead entry is
/// pruned the next time the source notifies.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl Subscription {
    pub(crate) fn new(guard: impl Any) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
