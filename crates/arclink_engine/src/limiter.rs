use std::time::Duration;

use arclink_core::SlidingWindow;
use arclink_logging::arclink_debug;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Async gate allowing `permits` requests per `window`.
///
/// The wait happens while the lock is held, so callers that arrive during a
/// wait queue behind it in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<SlidingWindow>,
}

impl RateLimiter {
    pub fn new(permits: usize, window: Duration) -> Self {
        Self {
            window: Mutex::new(SlidingWindow::new(permits, window)),
        }
    }

    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        let wait = window.wait_time(Instant::now().into_std());
        if !wait.is_zero() {
            arclink_debug!("Rate limit reached, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        window.record(Instant::now().into_std());
    }
}
