//! On-demand FFT analysis of the chain's tap.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use tracing::debug;

use super::tap::AnalysisTap;
use crate::error::ConfigError;
use crate::params::AnalyzerConfig;

/// Which view of the signal a snapshot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    /// `fft_size / 2` byte-scaled bin magnitudes
    Frequency,
    /// `fft_size` byte-scaled samples, 128 = silence
    Waveform,
}

/// Immutable capture of the tap at one instant
///
/// Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSnapshot {
    kind: SnapshotKind,
    data: Arc<[u8]>,
}

impl AnalysisSnapshot {
    pub fn new(kind: SnapshotKind, data: Vec<u8>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    /// "No data yet"
    pub fn empty(kind: SnapshotKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }

    pub fn values(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Anything the render loop can pull snapshots from
pub trait SnapshotSource {
    fn snapshot(&mut self, kind: SnapshotKind) -> AnalysisSnapshot;
}

/// Fixed-size analyzer reading the post-master-gain tap
pub struct Analyzer {
    config: AnalyzerConfig,
    tap: Option<Arc<AnalysisTap>>,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyzer {
    /// Plan the transform; no tap attached yet
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            window: (0..size).map(|i| hann_window(i, size)).collect(),
            samples: vec![0.0; size],
            spectrum: vec![Complex::new(0.0, 0.0); size],
            scratch,
            smoothed: vec![0.0; size / 2],
            fft,
            tap: None,
            config,
        })
    }

    /// Read from `tap` from now on; smoothing history starts fresh
    pub fn attach(&mut self, tap: Arc<AnalysisTap>) {
        self.tap = Some(tap);
        self.smoothed.iter_mut().for_each(|m| *m = 0.0);
        debug!(fft_size = self.config.fft_size, "analyzer attached");
    }

    pub fn detach(&mut self) {
        self.tap = None;
    }

    /// True when a tap is attached and a source feeds it
    pub fn has_data(&self) -> bool {
        self.tap.as_ref().is_some_and(|tap| tap.is_live())
    }

    pub fn transform_size(&self) -> usize {
        self.config.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32, sample_rate_hz: u32) -> usize {
        ((hz * self.config.fft_size as f32) / sample_rate_hz as f32) as usize
    }

    /// Byte-scaled magnitudes, `fft_size / 2` long; empty before a source is attached
    pub fn frequency_snapshot(&mut self) -> AnalysisSnapshot {
        if !self.capture() {
            return AnalysisSnapshot::empty(SnapshotKind::Frequency);
        }

        for ((slot, &sample), &w) in self
            .spectrum
            .iter_mut()
            .zip(self.samples.iter())
            .zip(self.window.iter())
        {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let norm = 1.0 / self.config.fft_size as f32;
        let tau = self.config.smoothing_time_constant;
        let min_db = self.config.min_decibels;
        let range_db = self.config.max_decibels - min_db;

        let bytes = self
            .smoothed
            .iter_mut()
            .zip(self.spectrum.iter())
            .map(|(smoothed, bin)| {
                let magnitude = bin.norm() * norm;
                let blended = tau * *smoothed + (1.0 - tau) * magnitude;
                *smoothed = if blended.is_finite() { blended } else { 0.0 };

                let db = linear_to_db(*smoothed);
                let scaled = 255.0 * (db - min_db) / range_db;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect();

        AnalysisSnapshot::new(SnapshotKind::Frequency, bytes)
    }

    /// Byte-scaled samples, `fft_size` long; empty before a source is attached
    pub fn waveform_snapshot(&mut self) -> AnalysisSnapshot {
        if !self.capture() {
            return AnalysisSnapshot::empty(SnapshotKind::Waveform);
        }
        let bytes = self
            .samples
            .iter()
            .map(|&s| (128.0 * (1.0 + s)).clamp(0.0, 255.0) as u8)
            .collect();
        AnalysisSnapshot::new(SnapshotKind::Waveform, bytes)
    }

    fn capture(&mut self) -> bool {
        match self.tap.as_ref() {
            Some(tap) => tap.read_latest(&mut self.samples),
            None => false,
        }
    }
}

impl SnapshotSource for Analyzer {
    fn snapshot(&mut self, kind: SnapshotKind) -> AnalysisSnapshot {
        match kind {
            SnapshotKind::Frequency => self.frequency_snapshot(),
            SnapshotKind::Waveform => self.waveform_snapshot(),
        }
    }
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

fn linear_to_db(magnitude: f32) -> f32 {
    if magnitude > 0.0 {
        20.0 * magnitude.log10()
    } else {
        f32::NEG_INFINITY
    }
}
