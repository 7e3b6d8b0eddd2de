//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use crate::audio::volume_from_percent;
use crate::params::{clamp_sensitivity, AnalyzerConfig, EqualizerConfig, VisualizerConfig};
use crate::visual::StrategyKind;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "eqscope")]
#[command(about = "Ten-band equalizer with a real-time spectrum visualizer", long_about = None)]
pub struct Args {
    /// WAV file to play; a built-in synth loop plays when omitted
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Equalizer preset: flat, bass, treble, vocal, pop, rock
    #[arg(long, value_name = "NAME", default_value = "flat")]
    pub preset: String,

    /// Master volume (percent)
    #[arg(long, value_name = "PERCENT", default_value = "70",
          value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: u8,

    /// Visualizer: bars (default), waveform, circular
    #[arg(long, value_name = "KIND", default_value = "bars")]
    pub visualizer: String,

    /// Visualizer sensitivity (0.5-3.0)
    #[arg(long, value_name = "FACTOR", default_value = "1.5")]
    pub sensitivity: f32,

    /// Frame-rate cap (frames per second)
    #[arg(long, value_name = "FPS", default_value = "60")]
    pub fps: f32,

    /// FFT size for analysis (power of two)
    #[arg(long, value_name = "SAMPLES", default_value = "2048")]
    pub fft_size: usize,

    /// Loop the input file
    #[arg(long = "loop")]
    pub looping: bool,
}

impl Args {
    /// Parse the visualizer strategy, falling back to bars
    pub fn parse_strategy(&self) -> StrategyKind {
        match self.visualizer.parse::<StrategyKind>() {
            Ok(kind) => {
                info!("visualizer: {}", kind);
                kind
            }
            Err(e) => {
                warn!("{}, using bars", e);
                StrategyKind::Bars
            }
        }
    }

    /// Master volume on the 0.0-1.0 engine scale
    pub fn volume(&self) -> f32 {
        volume_from_percent(self.volume as f32)
    }

    pub fn equalizer_config(&self) -> EqualizerConfig {
        EqualizerConfig {
            initial_volume: self.volume(),
            ..EqualizerConfig::default()
        }
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            fft_size: self.fft_size,
            ..AnalyzerConfig::default()
        }
    }

    pub fn visualizer_config(&self) -> VisualizerConfig {
        VisualizerConfig {
            strategy: self.parse_strategy(),
            target_fps: self.fps,
            sensitivity: clamp_sensitivity(self.sensitivity),
            ..VisualizerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["eqscope"]);
        assert!(args.input.is_none());
        assert_eq!(args.preset, "flat");
        assert!((args.volume() - 0.7).abs() < 1e-6);
        assert_eq!(args.visualizer_config().strategy, StrategyKind::Bars);
        assert_eq!(args.analyzer_config().fft_size, 2048);
    }

    #[test]
    fn test_options() {
        let args = Args::parse_from([
            "eqscope",
            "song.wav",
            "--preset",
            "rock",
            "--volume",
            "40",
            "--visualizer",
            "circular",
            "--sensitivity",
            "9",
            "--loop",
        ]);
        assert_eq!(args.input, Some(PathBuf::from("song.wav")));
        assert!(args.looping);
        assert!((args.equalizer_config().initial_volume - 0.4).abs() < 1e-6);
        let visual = args.visualizer_config();
        assert_eq!(visual.strategy, StrategyKind::Circular);
        assert_eq!(visual.sensitivity, 3.0);
    }

    #[test]
    fn test_volume_over_100_rejected() {
        assert!(Args::try_parse_from(["eqscope", "--volume", "150"]).is_err());
    }

    #[test]
    fn test_unknown_visualizer_falls_back() {
        let args = Args::parse_from(["eqscope", "--visualizer", "spiral"]);
        assert_eq!(args.parse_strategy(), StrategyKind::Bars);
    }
}
