//! Render strategy contract and selection.

use std::fmt;
use std::str::FromStr;

use super::bars::Bars;
use super::circular::Circular;
use super::frame::{Frame, Viewport};
use super::waveform::Waveform;
use crate::audio::{AnalysisSnapshot, SnapshotKind};
use crate::smoothing::Smoother;

/// Per-frame inputs shared by every strategy
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub viewport: Viewport,
    /// Raw magnitude multiplier (already clamped)
    pub sensitivity: f32,
    /// Bars / spokes to draw
    pub bucket_count: usize,
}

/// One smoothed value per visual bucket, carried between frames
///
/// Grows on demand; cleared whenever the strategy changes.
#[derive(Debug, Clone)]
pub struct SmoothedBuffer {
    buckets: Vec<Smoother>,
    rate: f32,
}

impl SmoothedBuffer {
    /// `smoothing` is the share of the previous value kept each frame
    pub fn new(smoothing: f32) -> Self {
        Self {
            buckets: Vec::new(),
            rate: 1.0 - smoothing.clamp(0.0, 0.999),
        }
    }

    /// Move bucket `index` toward `raw` and return its displayed value
    pub fn approach(&mut self, index: usize, raw: f32) -> f32 {
        if index >= self.buckets.len() {
            self.buckets
                .resize(index + 1, Smoother::new(0.0, self.rate));
        }
        self.buckets[index].approach(raw)
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn values(&self) -> Vec<f32> {
        self.buckets.iter().map(Smoother::value).collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Maps a snapshot plus smoothed state to draw commands
pub trait RenderStrategy {
    /// Snapshot type this strategy consumes
    fn input(&self) -> SnapshotKind;

    /// Build the next frame, updating `smoothed` in place
    fn render(
        &self,
        snapshot: &AnalysisSnapshot,
        smoothed: &mut SmoothedBuffer,
        ctx: &FrameContext,
    ) -> Frame;
}

/// Available strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrategyKind {
    #[default]
    Bars,
    Waveform,
    Circular,
}

static BARS: Bars = Bars;
static WAVEFORM: Waveform = Waveform;
static CIRCULAR: Circular = Circular;

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Bars,
        StrategyKind::Waveform,
        StrategyKind::Circular,
    ];

    pub fn strategy(self) -> &'static dyn RenderStrategy {
        match self {
            StrategyKind::Bars => &BARS,
            StrategyKind::Waveform => &WAVEFORM,
            StrategyKind::Circular => &CIRCULAR,
        }
    }

    /// Next strategy in menu order, wrapping around
    pub fn next(self) -> Self {
        match self {
            StrategyKind::Bars => StrategyKind::Waveform,
            StrategyKind::Waveform => StrategyKind::Circular,
            StrategyKind::Circular => StrategyKind::Bars,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Bars => "bars",
            StrategyKind::Waveform => "waveform",
            StrategyKind::Circular => "circular",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bars" => Ok(StrategyKind::Bars),
            "waveform" | "wave" => Ok(StrategyKind::Waveform),
            "circular" | "circle" => Ok(StrategyKind::Circular),
            other => Err(format!("unknown visualizer '{}'", other)),
        }
    }
}

/// Evenly strided picks from `values`, at most `buckets` of them
pub(crate) fn stride_buckets(values: &[u8], buckets: usize) -> impl Iterator<Item = u8> + '_ {
    let count = buckets.min(values.len());
    let stride = if count == 0 { 1 } else { values.len() / count };
    values.iter().step_by(stride.max(1)).take(count).copied()
}
