//! Manually-advanced clock for deterministic timestamps.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use huddle_core::{Clock, Timestamp};

/// Default simulated epoch: an arbitrary fixed point, far from zero so
/// subtraction in assertions never underflows.
const DEFAULT_EPOCH_MS: u64 = 1_700_000_000_000;

/// A [`Clock`] that only moves when a test tells it to.
///
/// Clones share the same underlying time, so a clock handed to the engine
/// can be advanced from the test body.
#[derive(Debug, Clone)]
pub struct SimClock {
    now: Arc<AtomicU64>,
}

impl SimClock {
    /// Clock starting at the default simulated epoch.
    pub fn new() -> Self {
        Self::starting_at(DEFAULT_EPOCH_MS)
    }

    /// Clock starting at a specific millisecond value.
    pub fn starting_at(millis: u64) -> Self {
        Self { now: Arc::new(AtomicU64::new(millis)) }
    }

    /// Move time forward.
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute millisecond value.
    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.now.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let clock = SimClock::starting_at(100);
        let other = clock.clone();

        clock.advance(50);
        assert_eq!(other.now(), Timestamp::from_millis(150));

        other.set(10);
        assert_eq!(clock.now(), Timestamp::from_millis(10));
    }
}
