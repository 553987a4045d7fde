//! Polling helper for eventually-consistent assertions.

use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Poll interval between condition checks.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Returns whether the condition held. Feed delivery and state application
/// run on spawned tasks, so tests assert through this instead of assuming
/// a dispatch landed synchronously.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}
