use std::time::{Duration, Instant};

/// Grant times of the last `permits` requests, kept in a fixed ring.
///
/// `cursor` always points at the oldest slot, which is the next one to be
/// overwritten. Until the ring has filled up that slot is empty and no wait is
/// required.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    grants: Box<[Option<Instant>]>,
    cursor: usize,
    window: Duration,
}

impl SlidingWindow {
    pub fn new(permits: usize, window: Duration) -> Self {
        Self {
            grants: vec![None; permits.max(1)].into_boxed_slice(),
            cursor: 0,
            window,
        }
    }

    pub fn permits(&self) -> usize {
        self.grants.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// How long a request issued at `now` has to wait for a permit.
    pub fn wait_time(&self, now: Instant) -> Duration {
        match self.grants[self.cursor] {
            Some(oldest) => (oldest + self.window).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Records a grant at `at`, evicting the oldest one.
    pub fn record(&mut self, at: Instant) {
        self.grants[self.cursor] = Some(at);
        self.cursor = (self.cursor + 1) % self.grants.len();
    }
}
