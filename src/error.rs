//! Error types for the signal chain, the renderer and configuration.

use thiserror::Error;

/// Signal chain and playback errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The audio subsystem could not be acquired; dependent features must be disabled
    #[error("audio engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Band index outside the fixed band table
    #[error("band index {index} out of range (chain has {band_count} bands)")]
    InvalidIndex { index: usize, band_count: usize },

    /// Preset length does not match the band table
    #[error("preset has {actual} gains but chain has {expected} bands")]
    PresetSizeMismatch { expected: usize, actual: usize },

    /// No built-in preset with this name
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// Playback could not start (commonly a suspended output)
    #[error("playback start failed: {0}")]
    PlaybackStartFailed(String),

    /// Media source could not be opened or decoded
    #[error("source error: {0}")]
    Source(String),
}

/// Visualization errors; never fatal to playback
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// No drawable target
    #[error("drawing surface unavailable")]
    SurfaceUnavailable,

    /// The surface rejected a frame
    #[error("surface error: {0}")]
    Surface(String),
}

/// Invalid configuration value
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::EngineUnavailable(err.0)
    }
}

/// Result type for chain operations
pub type Result<T> = std::result::Result<T, EngineError>;
