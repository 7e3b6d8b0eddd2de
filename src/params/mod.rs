//! Parameter definitions with physical units and documented semantics.
//!
//! All tunable numbers are collected here with:
//! - Physical units (Hz, dB, seconds, pixels)
//! - Documented ranges and meanings
//! - A `validate()` per config struct

mod audio;
mod render;

// Re-export all types
pub use audio::{audio_constants, AnalyzerConfig, EqualizerConfig, EQ_FREQUENCIES_HZ};
pub use render::{
    clamp_sensitivity, VisualizerConfig, WindowConfig, MIN_TARGET_FPS, SENSITIVITY_RANGE,
};
