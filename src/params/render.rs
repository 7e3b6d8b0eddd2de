//! Visualizer and window configuration.

use std::time::Duration;

use crate::error::ConfigError;
use crate::visual::StrategyKind;

/// Window configuration
#[derive(Debug, Clone)]
pub struct WindowConfig {
    /// Initial window width (logical pixels)
    pub window_width: u32,

    /// Initial window height (logical pixels)
    pub window_height: u32,

    /// Window title
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            title: "eqscope".to_string(),
        }
    }
}

/// Visualizer configuration
#[derive(Debug, Clone)]
pub struct VisualizerConfig {
    /// Strategy active when the scheduler starts
    pub strategy: StrategyKind,

    /// Upper bound on rendered frames per second (Hz)
    pub target_fps: f32,

    /// Per-bucket smoothing (0.0 = raw, 0.99 = very sluggish)
    pub smoothing: f32,

    /// Raw magnitude multiplier, clamped to `SENSITIVITY_RANGE`
    pub sensitivity: f32,

    /// Number of bars for the bar and circular strategies
    pub bucket_count: usize,

    /// Quiet period before a burst of resize events is applied (milliseconds)
    pub resize_debounce_ms: u64,
}

/// Slowest accepted frame rate (Hz)
pub const MIN_TARGET_FPS: f32 = 1.0;

/// Allowed sensitivity range (dimensionless)
pub const SENSITIVITY_RANGE: (f32, f32) = (0.5, 3.0);

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Bars,
            target_fps: 60.0,
            smoothing: 0.85,
            sensitivity: 1.5,
            bucket_count: 64,
            resize_debounce_ms: 250,
        }
    }
}

impl VisualizerConfig {
    /// Minimum time between accepted frames
    ///
    /// Rates below `MIN_TARGET_FPS` (and NaN) fall back to the floor.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.target_fps.max(MIN_TARGET_FPS))
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_fps >= MIN_TARGET_FPS && self.target_fps.is_finite()) {
            return Err(ConfigError(format!(
                "target fps must be >= {}, got {}",
                MIN_TARGET_FPS, self.target_fps
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(ConfigError(format!(
                "visual smoothing must be within [0, 1), got {}",
                self.smoothing
            )));
        }
        if self.bucket_count == 0 {
            return Err(ConfigError("bucket count must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Clamp a sensitivity value to the supported range
pub fn clamp_sensitivity(value: f32) -> f32 {
    value.clamp(SENSITIVITY_RANGE.0, SENSITIVITY_RANGE.1)
}
