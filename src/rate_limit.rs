//! Per-connection sliding-window rate limiting.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default number of actions admitted per rolling second.
pub const DEFAULT_MAX_ACTIONS_PER_SECOND: usize = 20;

/// Admits at most `max` events in any rolling `window`.
///
/// Rejected events are not recorded, so a flood does not extend its own
/// penalty.
#[derive(Debug)]
pub struct SlidingWindow {
    window: Duration,
    max: usize,
    stamps: VecDeque<Instant>,
}

impl SlidingWindow {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            window,
            max,
            stamps: VecDeque::with_capacity(max),
        }
    }

    pub fn per_second(max: usize) -> Self {
        Self::new(max, Duration::from_secs(1))
    }

    /// Record an event at `now` if the window has room for it.
    pub fn admit(&mut self, now: Instant) -> bool {
        while let Some(&oldest) = self.stamps.front() {
            if now.duration_since(oldest) >= self.window {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
        if self.stamps.len() >= self.max {
            return false;
        }
        self.stamps.push_back(now);
        true
    }
}
