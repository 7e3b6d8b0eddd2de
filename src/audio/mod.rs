//! Equalizer signal chain and FFT analysis.
//!
//! The chain runs bands in series, then master gain, then an analysis tap.
//! The [`Analyzer`] reads that tap on demand to produce frequency and
//! waveform snapshots for the visualizer.

mod band;
mod chain;
mod device;
mod fft;
mod host;
mod presets;
mod processor;
mod source;
mod tap;

// Re-export public types
pub use band::{clamp_gain_db, Band};
pub use chain::{volume_from_percent, SignalChain};
pub use device::CpalHost;
pub use fft::{hann_window, AnalysisSnapshot, Analyzer, SnapshotKind, SnapshotSource};
pub use host::{AudioHost, OfflineHost, StreamFormat};
pub use presets::{find_preset, preset_names, Preset, BUILTIN_PRESETS};
pub use processor::{ChainProcessor, ChainTargets};
pub use source::{load_wav, MediaSource, SampleSource, SynthSource, DEMO_COMPOSITION};
pub use tap::{AnalysisTap, TAP_CAPACITY};
