//! Time source abstraction.
//!
//! Write paths stamp `created_at`/`updated_at` from an injected [`Clock`]
//! instead of reading system time directly, so the same code runs in
//! production and in deterministic tests with a manually-advanced clock.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::Timestamp;

/// Abstract wall-clock time source.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Current wall-clock time.
    fn now(&self) -> Timestamp;
}

/// Production clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Timestamp::from_millis(since_epoch.as_millis() as u64)
    }
}
