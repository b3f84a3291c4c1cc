//! Liveness tracking for a single connection.
//!
//! The server probes every interval. A connection that has sent nothing at
//! all since the previous probe (not even the `HEARTBEAT` reply) is treated
//! as dead and terminated.

use tokio::time::{Duration, Interval, MissedTickBehavior};

/// Default probe interval (30 seconds).
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// What to do when the probe timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Peer answered since last time; send a fresh probe.
    Send,
    /// Peer stayed silent for a whole interval; drop it.
    Expired,
}

#[derive(Debug)]
pub struct Liveness {
    alive: bool,
}

impl Liveness {
    /// Start out alive so the first probe is always sent.
    pub fn new() -> Self {
        Self { alive: true }
    }

    /// Any inbound frame counts as an acknowledgement.
    pub fn mark_activity(&mut self) {
        self.alive = true;
    }

    /// Called on every timer tick.
    pub fn on_tick(&mut self) -> Probe {
        if !self.alive {
            return Probe::Expired;
        }
        self.alive = false;
        Probe::Send
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe timer whose first tick fires one full `period` from now.
pub fn probe_timer(period: Duration) -> Interval {
    let start = tokio::time::Instant::now() + period;
    let mut timer = tokio::time::interval_at(start, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}
