//! Player context: one signal chain, one analyzer, one visual loop.
//!
//! The chain is optional. When the audio host cannot be acquired the player
//! still constructs, parameter operations become no-ops and [`Player::play`]
//! reports [`EngineError::EngineUnavailable`].

use std::time::Instant;

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::audio::{
    find_preset, AnalysisSnapshot, Analyzer, AudioHost, MediaSource, SignalChain,
};
use crate::error::{ConfigError, EngineError, Result};
use crate::params::{AnalyzerConfig, EqualizerConfig, VisualizerConfig};
use crate::visual::{FrameOutcome, RenderScheduler, StrategyKind, Surface, Viewport};

pub struct Player<H: AudioHost, S: Surface> {
    chain: Option<SignalChain<H>>,
    analyzer: Analyzer,
    scheduler: RenderScheduler<S>,
}

impl<H: AudioHost, S: Surface> Player<H, S> {
    /// Assemble the player from an acquired (or failed) host and an optional surface
    ///
    /// Only configuration errors are fatal; a failed host degrades to no audio.
    pub fn new(
        equalizer: EqualizerConfig,
        analyzer: AnalyzerConfig,
        visualizer: VisualizerConfig,
        host: Result<H>,
        surface: Option<S>,
    ) -> std::result::Result<Self, ConfigError> {
        visualizer.validate()?;
        let mut analyzer = Analyzer::new(analyzer)?;

        let chain = match host {
            Ok(host) => {
                equalizer.validate(host.format().sample_rate)?;
                match SignalChain::build(equalizer, host) {
                    Ok(chain) => {
                        analyzer.attach(chain.tap());
                        Some(chain)
                    }
                    Err(e) => {
                        warn!("audio disabled: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                warn!("audio disabled: {}", e);
                None
            }
        };

        Ok(Self {
            chain,
            analyzer,
            scheduler: RenderScheduler::new(visualizer, surface),
        })
    }

    pub fn is_audio_available(&self) -> bool {
        self.chain.is_some()
    }

    pub fn chain(&self) -> Option<&SignalChain<H>> {
        self.chain.as_ref()
    }

    pub fn chain_mut(&mut self) -> Option<&mut SignalChain<H>> {
        self.chain.as_mut()
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn scheduler(&self) -> &RenderScheduler<S> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut RenderScheduler<S> {
        &mut self.scheduler
    }

    // Playback

    pub fn attach_source(&mut self, source: Box<dyn MediaSource>) {
        if let Some(chain) = self.chain.as_mut() {
            chain.attach_source(source);
        }
    }

    /// Start playback and the visualizer
    ///
    /// A suspended output is resumed and the start retried once.
    pub fn play(&mut self) -> Result<()> {
        let chain = self.chain.as_mut().ok_or_else(|| {
            EngineError::EngineUnavailable("no audio output".to_string())
        })?;

        match chain.play() {
            Ok(()) => {}
            Err(EngineError::PlaybackStartFailed(reason)) => {
                debug!("first start failed ({}), resuming output", reason);
                chain.resume_if_suspended();
                chain.play()?;
            }
            Err(e) => return Err(e),
        }

        self.scheduler.start();
        info!("playing");
        Ok(())
    }

    pub fn pause(&mut self) {
        if let Some(chain) = self.chain.as_mut() {
            chain.pause();
        }
        self.scheduler.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.chain.as_ref().is_some_and(|chain| chain.is_playing())
    }

    /// Play when paused, pause when playing
    pub fn toggle(&mut self) -> Result<()> {
        if self.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    // Equalizer

    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> Result<()> {
        match self.chain.as_mut() {
            Some(chain) => chain.set_band_gain(index, gain_db),
            None => Ok(()),
        }
    }

    /// Apply a built-in preset by name (aliases accepted)
    pub fn apply_preset(&mut self, name: &str) -> Result<()> {
        let preset = find_preset(name)?;
        match self.chain.as_mut() {
            Some(chain) => chain.apply_preset(preset),
            None => Ok(()),
        }
    }

    pub fn reset(&mut self) -> Result<()> {
        match self.chain.as_mut() {
            Some(chain) => chain.reset(),
            None => Ok(()),
        }
    }

    /// Master volume, 0.0-1.0
    pub fn set_master_gain(&mut self, volume: f32) {
        if let Some(chain) = self.chain.as_mut() {
            chain.set_master_gain(volume);
        }
    }

    /// Target gains in dB; empty without audio
    pub fn get_current_gains(&self) -> Vec<f32> {
        self.chain
            .as_ref()
            .map(|chain| chain.get_current_gains())
            .unwrap_or_default()
    }

    /// Target volume; 0.0 without audio
    pub fn get_volume(&self) -> f32 {
        self.chain.as_ref().map_or(0.0, |chain| chain.get_volume())
    }

    // Visualizer

    pub fn set_strategy(&mut self, kind: StrategyKind) {
        self.scheduler.set_strategy(kind);
    }

    pub fn set_sensitivity(&mut self, value: f32) {
        self.scheduler.set_sensitivity(value);
    }

    pub fn notify_resize(&mut self, now: Instant, viewport: Viewport) {
        self.scheduler.notify_resize(now, viewport);
    }

    pub fn poll_resize(&mut self, now: Instant) -> bool {
        self.scheduler.poll_resize(now)
    }

    pub fn subscribe(&mut self, capacity: usize) -> Receiver<AnalysisSnapshot> {
        self.scheduler.subscribe(capacity)
    }

    /// Display refresh callback
    ///
    /// Playback that ended on its own (source ran out) stops the loop here.
    pub fn on_frame(&mut self, now: Instant) -> FrameOutcome {
        if self.chain.as_ref().is_some_and(|chain| !chain.is_playing()) {
            if self.scheduler.is_running() {
                debug!("playback ended, stopping visualizer");
                self.scheduler.stop();
            }
            return FrameOutcome::Idle;
        }
        self.scheduler.on_frame(now, &mut self.analyzer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{OfflineHost, SampleSource};
    use crate::error::RenderError;
    use crate::visual::Frame;

    struct NullSurface;

    impl Surface for NullSurface {
        fn viewport(&self) -> Viewport {
            Viewport::new(320.0, 240.0, 1.0)
        }
        fn request_frame(&mut self) {}
        fn present(&mut self, _frame: &Frame) -> std::result::Result<(), RenderError> {
            Ok(())
        }
        fn clear(&mut self) {}
        fn resize(&mut self, _viewport: Viewport) {}
    }

    fn player(host: Result<OfflineHost>) -> Player<OfflineHost, NullSurface> {
        Player::new(
            EqualizerConfig::default(),
            AnalyzerConfig::default(),
            VisualizerConfig::default(),
            host,
            Some(NullSurface),
        )
        .unwrap()
    }

    fn tone() -> Box<dyn MediaSource> {
        Box::new(SampleSource::new(vec![0.25; 44100 * 2], 2, 44100))
    }

    #[test]
    fn test_play_resumes_suspended_output() {
        let mut player = player(Ok(OfflineHost::new(44100, 2).suspended()));
        player.attach_source(tone());
        player.play().unwrap();
        assert!(player.is_playing());
        assert!(player.scheduler().is_running());
        assert!(!player.chain().unwrap().host().is_suspended());
    }

    #[test]
    fn test_play_without_source_fails_after_retry() {
        let mut player = player(Ok(OfflineHost::new(44100, 2)));
        assert!(matches!(
            player.play(),
            Err(EngineError::PlaybackStartFailed(_))
        ));
        assert!(!player.scheduler().is_running());
    }

    #[test]
    fn test_unavailable_audio_degrades_to_no_ops() {
        let mut player = player(Err(EngineError::EngineUnavailable("no device".into())));
        assert!(!player.is_audio_available());
        player.set_band_gain(0, 6.0).unwrap();
        player.apply_preset("rock").unwrap();
        player.set_master_gain(0.5);
        assert!(player.get_current_gains().is_empty());
        assert_eq!(player.get_volume(), 0.0);
        assert!(matches!(
            player.play(),
            Err(EngineError::EngineUnavailable(_))
        ));
    }

    #[test]
    fn test_unknown_preset_rejected_even_without_audio() {
        let mut player = player(Err(EngineError::EngineUnavailable("no device".into())));
        assert!(matches!(
            player.apply_preset("dubstep"),
            Err(EngineError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_pause_stops_visualizer() {
        let mut player = player(Ok(OfflineHost::new(44100, 2)));
        player.attach_source(tone());
        player.toggle().unwrap();
        assert!(player.is_playing());
        player.toggle().unwrap();
        assert!(!player.is_playing());
        assert!(!player.scheduler().is_running());
    }

    #[test]
    fn test_source_end_stops_visualizer() {
        let mut player = player(Ok(OfflineHost::new(44100, 2)));
        player.attach_source(Box::new(SampleSource::new(vec![0.3; 100], 1, 44100)));
        player.play().unwrap();
        player.chain_mut().unwrap().host_mut().render(4096);

        assert!(!player.is_playing());
        assert_eq!(player.on_frame(Instant::now()), FrameOutcome::Idle);
        assert!(!player.scheduler().is_running());
    }
}
