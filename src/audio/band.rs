//! Single peaking filter stage with a smoothed gain.

use std::f32::consts::PI;

use crate::params::audio_constants::{COEFFICIENT_UPDATE_INTERVAL, GAIN_RANGE_DB};
use crate::smoothing::Smoother;

/// Clamp a requested gain into the supported band range (dB)
pub fn clamp_gain_db(gain_db: f32) -> f32 {
    if gain_db.is_nan() {
        return 0.0;
    }
    gain_db.clamp(GAIN_RANGE_DB.0, GAIN_RANGE_DB.1)
}

/// Normalized biquad coefficients (a0 == 1)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Coefficients {
    /// RBJ cookbook peaking EQ
    fn peaking(sample_rate: f32, frequency: f32, q: f32, gain_db: f32) -> Self {
        let a = 10.0_f32.powf(gain_db / 40.0);
        let omega = 2.0 * PI * frequency / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        let a0 = 1.0 + alpha / a;
        Self {
            b0: (1.0 + alpha * a) / a0,
            b1: (-2.0 * cos_omega) / a0,
            b2: (1.0 - alpha * a) / a0,
            a1: (-2.0 * cos_omega) / a0,
            a2: (1.0 - alpha / a) / a0,
        }
    }

    /// Magnitude response at `frequency` (dB)
    fn magnitude_db(&self, sample_rate: f32, frequency: f32) -> f32 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let num = num_re * num_re + num_im * num_im;
        let den = den_re * den_re + den_im * den_im;
        10.0 * (num / den).log10()
    }
}

/// Direct form I history for one channel
#[derive(Debug, Clone, Copy, Default)]
struct History {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

/// Peaking filter at a fixed center frequency
///
/// The target gain changes instantly; the gain the filter actually applies
/// follows it through a [`Smoother`] stepped once per frame, and the
/// coefficients are refreshed every `COEFFICIENT_UPDATE_INTERVAL` frames
/// while the gain is moving.
#[derive(Debug, Clone)]
pub struct Band {
    center_frequency_hz: f32,
    q: f32,
    sample_rate: f32,
    gain_db: Smoother,
    coefficients: Coefficients,
    history: Vec<History>,
    refresh_countdown: usize,
}

impl Band {
    pub fn new(
        center_frequency_hz: f32,
        q: f32,
        sample_rate: f32,
        channels: usize,
        time_constant_s: f32,
    ) -> Self {
        Self {
            center_frequency_hz,
            q,
            sample_rate,
            gain_db: Smoother::with_time_constant(0.0, time_constant_s, sample_rate),
            coefficients: Coefficients::peaking(sample_rate, center_frequency_hz, q, 0.0),
            history: vec![History::default(); channels.max(1)],
            refresh_countdown: 0,
        }
    }

    pub fn center_frequency_hz(&self) -> f32 {
        self.center_frequency_hz
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    /// Gain the band is moving toward (dB)
    pub fn target_gain_db(&self) -> f32 {
        self.gain_db.target()
    }

    /// Gain currently applied to the signal (dB)
    pub fn effective_gain_db(&self) -> f32 {
        self.gain_db.value()
    }

    /// Schedule a smoothed transition toward `gain_db` (clamped)
    pub fn set_target_gain_db(&mut self, gain_db: f32) {
        let gain_db = clamp_gain_db(gain_db);
        if gain_db != self.gain_db.target() {
            self.gain_db.set_target(gain_db);
            self.refresh_countdown = 0;
        }
    }

    /// Jump to `gain_db` immediately (only safe while no signal flows)
    pub fn snap_gain_db(&mut self, gain_db: f32) {
        self.gain_db.reset(clamp_gain_db(gain_db));
        self.refresh_coefficients();
    }

    /// Clear filter history (new source attached)
    pub fn reset_history(&mut self) {
        self.history.iter_mut().for_each(|h| *h = History::default());
    }

    /// Filter one interleaved frame in place; advances the gain by one step
    pub fn process_frame(&mut self, frame: &mut [f32]) {
        self.tick_gain();

        let c = self.coefficients;
        for (sample, h) in frame.iter_mut().zip(self.history.iter_mut()) {
            let x = *sample;
            let y = c.b0 * x + c.b1 * h.x1 + c.b2 * h.x2 - c.a1 * h.y1 - c.a2 * h.y2;
            h.x2 = h.x1;
            h.x1 = x;
            h.y2 = h.y1;
            // Flush denormals so a silent tail stays cheap
            h.y1 = if y.abs() < 1e-20 { 0.0 } else { y };
            *sample = y;
        }
    }

    /// Advance the gain smoother by `frames` without filtering audio
    pub fn advance(&mut self, frames: usize) {
        if self.gain_db.is_settled() {
            return;
        }
        self.gain_db.advance(frames);
        self.refresh_coefficients();
    }

    /// Magnitude response of the currently applied coefficients (dB)
    pub fn response_db(&self, frequency_hz: f32) -> f32 {
        self.coefficients.magnitude_db(self.sample_rate, frequency_hz)
    }

    fn tick_gain(&mut self) {
        if self.gain_db.is_settled() {
            return;
        }
        self.gain_db.next();
        if self.refresh_countdown == 0 || self.gain_db.is_settled() {
            self.refresh_coefficients();
        } else {
            self.refresh_countdown -= 1;
        }
    }

    fn refresh_coefficients(&mut self) {
        self.coefficients = Coefficients::peaking(
            self.sample_rate,
            self.center_frequency_hz,
            self.q,
            self.gain_db.value(),
        );
        self.refresh_countdown = COEFFICIENT_UPDATE_INTERVAL;
    }
}
