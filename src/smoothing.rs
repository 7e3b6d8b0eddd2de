//! Exponential-approach smoothing.
//!
//! One primitive serves both the audio side (per-sample gain automation with
//! a time constant) and the visual side (per-frame bucket smoothing with a
//! fixed blend factor): `value += (target - value) * rate`.

/// Distance below which the value snaps onto its target
const SNAP_EPSILON: f32 = 1e-5;

/// Stateful exponential smoother
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    value: f32,
    target: f32,
    rate: f32,
}

impl Smoother {
    /// Create a smoother resting at `initial` with a per-step blend `rate` in (0, 1]
    pub fn new(initial: f32, rate: f32) -> Self {
        Self {
            value: initial,
            target: initial,
            rate: rate.clamp(f32::MIN_POSITIVE, 1.0),
        }
    }

    /// Create a smoother stepped at `steps_per_second` that covers ~63% of
    /// the distance to its target every `time_constant_s`
    pub fn with_time_constant(initial: f32, time_constant_s: f32, steps_per_second: f32) -> Self {
        Self::new(initial, rate_for_time_constant(time_constant_s, steps_per_second))
    }

    /// Retarget; the approach continues from the current value
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump straight to `value` with no transition
    pub fn reset(&mut self, value: f32) {
        self.value = value;
        self.target = value;
    }

    /// Advance one step and return the new value
    pub fn next(&mut self) -> f32 {
        let delta = self.target - self.value;
        if delta.abs() <= SNAP_EPSILON {
            self.value = self.target;
        } else {
            self.value += delta * self.rate;
        }
        self.value
    }

    /// Advance `steps` steps at once
    pub fn advance(&mut self, steps: usize) -> f32 {
        if self.is_settled() || steps == 0 {
            return self.value;
        }
        // Closed form of `steps` iterations of `next()`
        let remaining = (1.0 - self.rate).powi(steps.min(i32::MAX as usize) as i32);
        self.value = self.target - (self.target - self.value) * remaining;
        if (self.target - self.value).abs() <= SNAP_EPSILON {
            self.value = self.target;
        }
        self.value
    }

    /// Retarget and advance one step (per-frame visual smoothing)
    pub fn approach(&mut self, target: f32) -> f32 {
        self.set_target(target);
        self.next()
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// True once the value has reached its target
    pub fn is_settled(&self) -> bool {
        self.value == self.target
    }
}

/// Per-step blend rate for an exponential time constant
pub fn rate_for_time_constant(time_constant_s: f32, steps_per_second: f32) -> f32 {
    if time_constant_s <= 0.0 || steps_per_second <= 0.0 {
        return 1.0;
    }
    1.0 - (-1.0 / (time_constant_s * steps_per_second)).exp()
}
