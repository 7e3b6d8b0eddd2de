//! Equalizer and analysis configuration and constants.

use crate::error::ConfigError;

/// Equalizer configuration (band table, gain staging, smoothing)
#[derive(Debug, Clone)]
pub struct EqualizerConfig {
    /// Center frequency of every band, in series order (Hz)
    /// Fixed for the lifetime of a chain; also the UI slider count
    pub frequencies_hz: Vec<f32>,

    /// Quality factor shared by every peaking band (dimensionless)
    pub q: f32,

    /// Time constant of the exponential gain approach (seconds)
    /// 10 ms settles in ~30 ms without audible clicks
    pub smoothing_time_constant_s: f32,

    /// Master gain applied when the chain is built (0.0 - 1.0)
    pub initial_volume: f32,

    /// Output rate requested from the device; the device default is used
    /// when it does not support this rate (Hz)
    pub sample_rate_hz: u32,
}

impl Default for EqualizerConfig {
    fn default() -> Self {
        Self {
            frequencies_hz: EQ_FREQUENCIES_HZ.to_vec(),
            q: audio_constants::BAND_Q,
            smoothing_time_constant_s: audio_constants::SMOOTHING_TIME_CONSTANT_S,
            initial_volume: 0.7,
            sample_rate_hz: 44100,
        }
    }
}

impl EqualizerConfig {
    /// Number of bands in the chain
    pub fn band_count(&self) -> usize {
        self.frequencies_hz.len()
    }

    /// Validate configuration against the host sample rate
    pub fn validate(&self, sample_rate_hz: u32) -> Result<(), ConfigError> {
        if self.frequencies_hz.is_empty() {
            return Err(ConfigError("frequency table must not be empty".to_string()));
        }
        let nyquist = sample_rate_hz as f32 / 2.0;
        if let Some(bad) = self
            .frequencies_hz
            .iter()
            .find(|f| !(**f > 0.0 && **f < nyquist))
        {
            return Err(ConfigError(format!(
                "band frequency {} Hz outside (0, {}) Hz",
                bad, nyquist
            )));
        }
        if self.q <= 0.0 {
            return Err(ConfigError(format!("Q must be > 0, got {}", self.q)));
        }
        if self.smoothing_time_constant_s <= 0.0 {
            return Err(ConfigError(format!(
                "smoothing time constant must be > 0, got {}",
                self.smoothing_time_constant_s
            )));
        }
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(ConfigError(format!(
                "initial volume must be within [0, 1], got {}",
                self.initial_volume
            )));
        }
        Ok(())
    }
}

/// Analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Transform size (must be power of 2)
    /// Larger sizes trade latency for frequency resolution
    pub fft_size: usize,

    /// Frame-over-frame blend applied to bin magnitudes (0.0 - 1.0)
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte value 0 (dBFS)
    pub min_decibels: f32,

    /// Magnitude mapped to byte value 255 (dBFS)
    pub max_decibels: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_time_constant: 0.85,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyzerConfig {
    /// Number of frequency bins per snapshot
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(ConfigError(format!(
                "FFT size must be a power of 2 in [32, 32768], got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(ConfigError(format!(
                "analyzer smoothing must be within [0, 1), got {}",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(ConfigError(format!(
                "min decibels ({}) must be below max decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Default band table (Hz); one slider per entry
pub const EQ_FREQUENCIES_HZ: [f32; 10] = [
    60.0, 150.0, 400.0, 1000.0, 2400.0, 6000.0, 8000.0, 10000.0, 12000.0, 16000.0,
];

/// Audio constants shared by the chain and its processor
pub mod audio_constants {
    /// Band gain range (dB)
    pub const GAIN_RANGE_DB: (f32, f32) = (-12.0, 12.0);

    /// Peaking filter quality factor
    pub const BAND_Q: f32 = 1.0;

    /// Exponential smoothing time constant τ (seconds)
    pub const SMOOTHING_TIME_CONSTANT_S: f32 = 0.01;

    /// Samples between biquad coefficient refreshes while a gain is moving
    /// 16 samples = 0.36 ms @ 44.1kHz
    pub const COEFFICIENT_UPDATE_INTERVAL: usize = 16;

    /// Block size used when the host does not dictate one
    pub const BLOCK_SIZE: usize = 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_validate() {
        assert!(EqualizerConfig::default().validate(44100).is_ok());
        assert!(AnalyzerConfig::default().validate().is_ok());
        assert_eq!(EqualizerConfig::default().band_count(), 10);
        assert_eq!(AnalyzerConfig::default().bin_count(), 1024);
    }

    #[test]
    fn test_band_above_nyquist_rejected() {
        // 16 kHz band cannot exist at 22.05 kHz sample rate
        assert!(EqualizerConfig::default().validate(22050).is_err());
    }

    #[test]
    fn test_fft_size_must_be_power_of_two() {
        let config = AnalyzerConfig {
            fft_size: 1000,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyzerConfig {
            fft_size: 256,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_decibel_range_ordering() {
        let config = AnalyzerConfig {
            min_decibels: -30.0,
            max_decibels: -100.0,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
