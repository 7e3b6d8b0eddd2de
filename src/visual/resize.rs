use std::time::{Duration, Instant};

/// Collapses a burst of resize notifications into one, applied after a quiet period
#[derive(Debug, Clone)]
pub struct ResizeDebouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> ResizeDebouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a new size; restarts the quiet period
    pub fn notify(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.delay, value));
    }

    /// The latest size once its quiet period has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending.as_ref() {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
