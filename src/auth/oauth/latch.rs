use std::sync::atomic::{AtomicBool, Ordering};

/// A flag that can be taken exactly once.
///
/// Owned by one callback page. The first [`try_fire`](Self::try_fire)
/// wins; the flag is never reset, so duplicate mount signals are ignored
/// for the rest of the page's lifetime.
#[derive(Debug, Default)]
pub struct OneShotLatch {
    fired: AtomicBool,
}

impl OneShotLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for the first caller only.
    pub fn try_fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }
}
