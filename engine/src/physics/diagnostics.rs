//! Log-once latches for hot paths
//!
//! Traces and contact callbacks run every frame; a failure there is logged
//! the first time it happens and then stays quiet.

use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) struct LogOnce(AtomicBool);

impl LogOnce {
    pub(crate) const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// True only for the first caller
    pub(crate) fn first(&self) -> bool {
        !self.0.swap(true, Ordering::Relaxed)
    }
}
