use std::time::{Duration, Instant};

/// Throttles display-refresh callbacks down to a target frame rate
///
/// Accepted frames keep the remainder of the elapsed time so the average
/// rate does not drift below target when refreshes don't divide evenly.
#[derive(Debug, Clone)]
pub struct FrameLimiter {
    interval: Duration,
    last: Option<Instant>,
}

impl FrameLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Forget the last accepted frame so the next callback is accepted
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// True when a frame should be drawn at `now`
    pub fn accept(&mut self, now: Instant) -> bool {
        let Some(last) = self.last else {
            self.last = Some(now);
            return true;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.interval {
            return false;
        }

        let interval_ns = self.interval.as_nanos();
        let overshoot = if interval_ns == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos((elapsed.as_nanos() % interval_ns) as u64)
        };
        self.last = Some(now - overshoot);
        true
    }
}
