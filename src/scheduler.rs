//! Single-shot auto-off timer.
//!
//! Polled from the cooperative loop rather than firing from a timer
//! interrupt, so an expiry is always observed between two controller
//! transitions and never concurrently with one.
//!
//! ```text
//!   motion ──▶ arm(5s) ──▶ motion ──▶ arm(5s) ─ ─ ─ ─ ─▶ poll() == true
//!   t=0        deadline=5   t=3        deadline=8          t>=8
//! ```
//!
//! Re-arming replaces the deadline, which is how continuous motion keeps
//! the light on indefinitely.

use embassy_time::{Duration, Instant, TICK_HZ};
use log::debug;

/// One logical timer with at most one pending deadline.
#[derive(Debug, Default)]
pub struct TimeoutScheduler {
    deadline: Option<Instant>,
}

impl TimeoutScheduler {
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Schedule an expiry `after` from `now`, replacing any pending one.
    pub fn arm(&mut self, after: Duration, now: Instant) {
        let deadline = now.checked_add(after).unwrap_or(Instant::MAX);
        if self.deadline.is_some() {
            debug!("Timeout: re-armed, fires in {}ms", after.as_millis());
        } else {
            debug!("Timeout: armed, fires in {}ms", after.as_millis());
        }
        self.deadline = Some(deadline);
    }

    /// Drop the pending expiry, if any.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            debug!("Timeout: cancelled");
        }
    }

    /// Returns `true` exactly once when the deadline has been reached.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Convert the raw timeout resource into a timer duration.
///
/// Negative values are accepted by the parameter store; here they mean
/// "expire immediately" rather than wrapping into a huge unsigned delay.
/// Absurdly large values saturate at [`Duration::MAX`].
pub fn timeout_duration(raw_secs: i64) -> Duration {
    let secs = u64::try_from(raw_secs).unwrap_or(0);
    Duration::from_ticks(secs.saturating_mul(TICK_HZ))
}
