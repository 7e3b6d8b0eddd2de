//! Control side of the signal chain.
//!
//! Bands in series, then master gain, then the analysis tap. The topology is
//! fixed when the chain is built; only gains, volume, the attached source
//! and the transport state change afterwards.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::band::clamp_gain_db;
use super::host::{AudioHost, StreamFormat};
use super::presets::{find_preset, Preset, FLAT};
use super::processor::{ChainProcessor, ChainShared, ChainTargets};
use super::source::MediaSource;
use super::tap::AnalysisTap;
use crate::error::{EngineError, Result};
use crate::params::EqualizerConfig;

/// Convert a UI volume percentage (0-100) to the engine's 0.0-1.0 range
pub fn volume_from_percent(percent: f32) -> f32 {
    (percent / 100.0).clamp(0.0, 1.0)
}

/// Fixed-topology equalizer chain feeding an output host
pub struct SignalChain<H: AudioHost> {
    config: EqualizerConfig,
    format: StreamFormat,
    shared: Arc<ChainShared>,
    host: H,
}

impl<H: AudioHost> SignalChain<H> {
    /// Build one band per configured frequency and hand the processor to `host`
    pub fn build(config: EqualizerConfig, mut host: H) -> Result<Self> {
        let format = host.format();
        config.validate(format.sample_rate)?;

        let targets = ChainTargets {
            gains_db: vec![0.0; config.band_count()],
            volume: config.initial_volume,
        };
        let tap = Arc::new(AnalysisTap::default());
        let shared = Arc::new(ChainShared::new(targets, tap));

        let processor = ChainProcessor::new(Arc::clone(&shared), &config, format);
        host.install(processor)?;

        info!(
            bands = config.band_count(),
            sample_rate = format.sample_rate,
            channels = format.channels,
            "signal chain built"
        );

        Ok(Self {
            config,
            format,
            shared,
            host,
        })
    }

    pub fn band_count(&self) -> usize {
        self.config.band_count()
    }

    /// Center frequencies in chain order (Hz)
    pub fn frequencies(&self) -> &[f32] {
        &self.config.frequencies_hz
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Read-only handle to the post-master-gain tap
    pub fn tap(&self) -> Arc<AnalysisTap> {
        Arc::clone(&self.shared.tap)
    }

    /// Audio time rendered so far
    pub fn process_time(&self) -> Duration {
        let frames = self.shared.frames_processed.load(Ordering::Relaxed);
        Duration::from_secs_f64(frames as f64 / self.format.sample_rate as f64)
    }

    /// Move band `index` toward `gain_db` (clamped to ±12 dB) from the current process time
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> Result<()> {
        let band_count = self.band_count();
        if index >= band_count {
            return Err(EngineError::InvalidIndex { index, band_count });
        }
        let gain_db = clamp_gain_db(gain_db);
        let current = self.shared.targets.load_full();
        let mut next = ChainTargets::clone(&current);
        next.gains_db[index] = gain_db;
        self.shared.targets.store(Arc::new(next));
        debug!(index, gain_db, "band gain set");
        Ok(())
    }

    /// Set every band from `preset` in one step
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<()> {
        let expected = self.band_count();
        if preset.len() != expected {
            return Err(EngineError::PresetSizeMismatch {
                expected,
                actual: preset.len(),
            });
        }
        let current = self.shared.targets.load_full();
        let next = ChainTargets {
            gains_db: preset.gains_db.iter().map(|&g| clamp_gain_db(g)).collect(),
            volume: current.volume,
        };
        self.shared.targets.store(Arc::new(next));
        info!(preset = %preset.name, "preset applied");
        Ok(())
    }

    /// Apply a built-in preset by name
    pub fn apply_preset_named(&mut self, name: &str) -> Result<()> {
        let preset = find_preset(name)?;
        self.apply_preset(preset)
    }

    /// Back to a flat response
    pub fn reset(&mut self) -> Result<()> {
        self.apply_preset(&FLAT)
    }

    /// Move master gain toward `volume` (clamped to 0.0-1.0)
    pub fn set_master_gain(&mut self, volume: f32) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        let current = self.shared.targets.load_full();
        let mut next = ChainTargets::clone(&current);
        next.volume = volume;
        self.shared.targets.store(Arc::new(next));
        debug!(volume, "master gain set");
    }

    /// Target band gains (dB), always a complete vector
    pub fn get_current_gains(&self) -> Vec<f32> {
        self.shared.targets.load().gains_db.clone()
    }

    /// Target master gain (0.0-1.0)
    pub fn get_volume(&self) -> f32 {
        self.shared.targets.load().volume
    }

    /// Band gains the processor is applying right now (dB)
    pub fn effective_gains(&self) -> Vec<f32> {
        self.shared
            .effective_gains
            .iter()
            .map(|g| f32::from_bits(g.load(Ordering::Relaxed)))
            .collect()
    }

    /// Master gain the processor is applying right now
    pub fn effective_volume(&self) -> f32 {
        f32::from_bits(self.shared.effective_volume.load(Ordering::Relaxed))
    }

    /// Idempotent; safe to call before every `play`
    pub fn resume_if_suspended(&mut self) {
        if !self.host.is_suspended() {
            return;
        }
        match self.host.resume() {
            Ok(()) => info!("audio output resumed"),
            Err(e) => warn!("failed to resume audio output: {}", e),
        }
    }

    /// Replace the attached source; the previous one is dropped
    pub fn attach_source(&mut self, source: Box<dyn MediaSource>) {
        if source.sample_rate() != self.format.sample_rate {
            warn!(
                source_rate = source.sample_rate(),
                output_rate = self.format.sample_rate,
                "source sample rate differs from output; playback speed will be off"
            );
        }
        self.shared.playing.store(false, Ordering::Release);
        {
            let mut slot = self.shared.source.lock();
            slot.source = Some(source);
            slot.generation += 1;
        }
        self.shared.ended.store(false, Ordering::Release);
        self.shared.tap.clear();
        self.shared.tap.set_live(true);
        info!("source attached");
    }

    /// Drop the attached source, if any
    pub fn detach_source(&mut self) {
        self.shared.playing.store(false, Ordering::Release);
        {
            let mut slot = self.shared.source.lock();
            slot.source = None;
            slot.generation += 1;
        }
        self.shared.tap.set_live(false);
        self.shared.tap.clear();
        debug!("source detached");
    }

    pub fn has_source(&self) -> bool {
        self.shared.source.lock().source.is_some()
    }

    /// Start pulling the attached source
    pub fn play(&mut self) -> Result<()> {
        if self.host.is_suspended() {
            return Err(EngineError::PlaybackStartFailed(
                "audio output is suspended".to_string(),
            ));
        }
        {
            let mut slot = self.shared.source.lock();
            let Some(source) = slot.source.as_mut() else {
                return Err(EngineError::PlaybackStartFailed(
                    "no source attached".to_string(),
                ));
            };
            if self.shared.ended.swap(false, Ordering::AcqRel) {
                source.rewind();
            }
        }
        self.shared.playing.store(true, Ordering::Release);
        debug!("playback started");
        Ok(())
    }

    pub fn pause(&mut self) {
        self.shared.playing.store(false, Ordering::Release);
        debug!("playback paused");
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire)
    }
}

impl<H: AudioHost> Drop for SignalChain<H> {
    fn drop(&mut self) {
        self.shared.playing.store(false, Ordering::Release);
        self.shared.tap.set_live(false);
    }
}
