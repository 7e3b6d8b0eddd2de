//! eqscope library - click-free equalizer with a real-time visualizer

pub mod audio;
pub mod cli;
pub mod error;
pub mod params;
pub mod player;
pub mod rendering;
pub mod smoothing;
pub mod visual;

pub use error::{ConfigError, EngineError, RenderError};
pub use player::Player;
