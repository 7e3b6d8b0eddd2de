//! Real-time side of the signal chain.
//!
//! Runs inside the host's audio callback: pulls the attached source, runs
//! every band in series, applies master gain and feeds the analysis tap.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::band::Band;
use super::host::StreamFormat;
use super::source::MediaSource;
use super::tap::AnalysisTap;
use crate::params::EqualizerConfig;
use crate::smoothing::Smoother;

/// Target values requested by the control side
///
/// Replaced as a whole, so the audio thread always sees a complete vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTargets {
    pub gains_db: Vec<f32>,
    pub volume: f32,
}

/// Attached source plus a counter bumped on every (re)attachment
pub(crate) struct SourceSlot {
    pub source: Option<Box<dyn MediaSource>>,
    pub generation: u64,
}

/// State shared between the control side and the processor
pub(crate) struct ChainShared {
    pub targets: ArcSwap<ChainTargets>,
    pub effective_gains: Vec<AtomicU32>,
    pub effective_volume: AtomicU32,
    pub playing: AtomicBool,
    pub ended: AtomicBool,
    pub frames_processed: AtomicU64,
    pub source: Mutex<SourceSlot>,
    pub tap: Arc<AnalysisTap>,
}

impl ChainShared {
    pub fn new(targets: ChainTargets, tap: Arc<AnalysisTap>) -> Self {
        Self {
            effective_gains: targets
                .gains_db
                .iter()
                .map(|g| AtomicU32::new(g.to_bits()))
                .collect(),
            effective_volume: AtomicU32::new(targets.volume.to_bits()),
            targets: ArcSwap::from_pointee(targets),
            playing: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            frames_processed: AtomicU64::new(0),
            source: Mutex::new(SourceSlot {
                source: None,
                generation: 0,
            }),
            tap,
        }
    }
}

/// Band chain, master gain and tap writer owned by the audio host
pub struct ChainProcessor {
    shared: Arc<ChainShared>,
    bands: Vec<Band>,
    master: Smoother,
    channels: usize,
    applied: Arc<ChainTargets>,
    source_generation: u64,
    source_buf: Vec<f32>,
    mono: Vec<f32>,
}

impl ChainProcessor {
    pub(crate) fn new(
        shared: Arc<ChainShared>,
        config: &EqualizerConfig,
        format: StreamFormat,
    ) -> Self {
        let sample_rate = format.sample_rate as f32;
        let applied = shared.targets.load_full();

        let bands = config
            .frequencies_hz
            .iter()
            .zip(applied.gains_db.iter())
            .map(|(&freq, &gain)| {
                let mut band = Band::new(
                    freq,
                    config.q,
                    sample_rate,
                    format.channels,
                    config.smoothing_time_constant_s,
                );
                band.snap_gain_db(gain);
                band
            })
            .collect();

        let master = Smoother::with_time_constant(
            applied.volume,
            config.smoothing_time_constant_s,
            sample_rate,
        );

        Self {
            shared,
            bands,
            master,
            channels: format.channels.max(1),
            applied,
            source_generation: 0,
            source_buf: Vec::new(),
            mono: Vec::new(),
        }
    }

    /// Fill `out` (interleaved, host channel count) with the next block
    pub fn render(&mut self, out: &mut [f32]) {
        let frames = out.len() / self.channels;
        let out = &mut out[..frames * self.channels];

        self.pick_up_targets();
        out.iter_mut().for_each(|s| *s = 0.0);
        if self.shared.playing.load(Ordering::Acquire) {
            self.pull_source(out, frames);
        }

        for frame in out.chunks_exact_mut(self.channels) {
            for band in self.bands.iter_mut() {
                band.process_frame(frame);
            }
            let gain = self.master.next();
            frame.iter_mut().for_each(|s| *s *= gain);
        }

        self.feed_tap(out, frames);
        self.publish(frames);
    }

    fn pick_up_targets(&mut self) {
        let targets = self.shared.targets.load();
        if Arc::ptr_eq(&targets, &self.applied) {
            return;
        }
        for (band, &gain) in self.bands.iter_mut().zip(targets.gains_db.iter()) {
            band.set_target_gain_db(gain);
        }
        self.master.set_target(targets.volume);
        self.applied = Arc::clone(&targets);
    }

    fn pull_source(&mut self, out: &mut [f32], frames: usize) {
        // Never stall the audio thread behind an attach in progress
        let Some(mut slot) = self.shared.source.try_lock() else {
            return;
        };

        if slot.generation != self.source_generation {
            self.source_generation = slot.generation;
            self.bands.iter_mut().for_each(Band::reset_history);
        }

        let Some(source) = slot.source.as_mut() else {
            return;
        };

        let src_channels = source.channels().max(1);
        self.source_buf.resize(frames * src_channels, 0.0);
        let read = source.read(&mut self.source_buf);
        remix(
            &self.source_buf[..read * src_channels],
            src_channels,
            &mut out[..read * self.channels],
            self.channels,
        );

        if read < frames {
            self.shared.playing.store(false, Ordering::Release);
            self.shared.ended.store(true, Ordering::Release);
        }
    }

    fn feed_tap(&mut self, out: &[f32], frames: usize) {
        self.mono.clear();
        self.mono.reserve(frames);
        let scale = 1.0 / self.channels as f32;
        self.mono.extend(
            out.chunks_exact(self.channels)
                .map(|frame| frame.iter().sum::<f32>() * scale),
        );
        self.shared.tap.push(&self.mono);
    }

    fn publish(&self, frames: usize) {
        for (slot, band) in self.shared.effective_gains.iter().zip(self.bands.iter()) {
            slot.store(band.effective_gain_db().to_bits(), Ordering::Relaxed);
        }
        self.shared
            .effective_volume
            .store(self.master.value().to_bits(), Ordering::Relaxed);
        self.shared
            .frames_processed
            .fetch_add(frames as u64, Ordering::Relaxed);
    }
}

/// Copy interleaved frames between channel layouts
fn remix(src: &[f32], src_channels: usize, dst: &mut [f32], dst_channels: usize) {
    if src_channels == dst_channels {
        dst.copy_from_slice(src);
        return;
    }
    for (s, d) in src
        .chunks_exact(src_channels)
        .zip(dst.chunks_exact_mut(dst_channels))
    {
        if dst_channels == 1 {
            d[0] = s.iter().sum::<f32>() / src_channels as f32;
        } else if src_channels == 1 {
            d.iter_mut().for_each(|x| *x = s[0]);
        } else {
            for (c, x) in d.iter_mut().enumerate() {
                *x = s[c.min(src_channels - 1)];
            }
        }
    }
}
