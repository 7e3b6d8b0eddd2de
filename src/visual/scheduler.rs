//! Display-refresh driven render loop.

use std::time::Instant;

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use super::feed::SnapshotFeed;
use super::frame::{Frame, Viewport};
use super::limiter::FrameLimiter;
use super::resize::ResizeDebouncer;
use super::strategy::{FrameContext, SmoothedBuffer, StrategyKind};
use crate::audio::{AnalysisSnapshot, SnapshotSource};
use crate::error::RenderError;
use crate::params::{clamp_sensitivity, VisualizerConfig};

/// Drawing target driven by the scheduler
pub trait Surface {
    /// Current display size
    fn viewport(&self) -> Viewport;

    /// Ask the display for one refresh callback
    fn request_frame(&mut self);

    /// Draw a complete frame
    fn present(&mut self, frame: &Frame) -> Result<(), RenderError>;

    /// Blank the surface
    fn clear(&mut self);

    /// Apply a debounced size change to the backing store
    fn resize(&mut self, viewport: Viewport);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// What one refresh callback did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Stopped or no surface; nothing drawn, nothing rescheduled
    Idle,
    /// Too soon after the last frame; rescheduled
    Skipped,
    Rendered,
    /// Surface refused the frame; rescheduled
    Failed,
}

/// Owns the visual loop: strategy choice, smoothing state, pacing and resize
pub struct RenderScheduler<S: Surface> {
    config: VisualizerConfig,
    surface: Option<S>,
    state: SchedulerState,
    strategy: StrategyKind,
    sensitivity: f32,
    smoothed: SmoothedBuffer,
    limiter: FrameLimiter,
    resize: ResizeDebouncer<Viewport>,
    viewport: Viewport,
    frame_pending: bool,
    feed: SnapshotFeed,
    frames_rendered: u64,
    resizes_applied: u64,
}

impl<S: Surface> RenderScheduler<S> {
    /// Without a surface the scheduler stays inert and every operation is a no-op
    pub fn new(config: VisualizerConfig, surface: Option<S>) -> Self {
        let viewport = match surface.as_ref() {
            Some(surface) => surface.viewport(),
            None => {
                warn!("{}", RenderError::SurfaceUnavailable);
                Viewport::new(0.0, 0.0, 1.0)
            }
        };

        Self {
            strategy: config.strategy,
            sensitivity: clamp_sensitivity(config.sensitivity),
            smoothed: SmoothedBuffer::new(config.smoothing),
            limiter: FrameLimiter::new(config.frame_interval()),
            resize: ResizeDebouncer::new(config.resize_debounce()),
            state: SchedulerState::Stopped,
            frame_pending: false,
            feed: SnapshotFeed::new(),
            frames_rendered: 0,
            resizes_applied: 0,
            viewport,
            surface,
            config,
        }
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Begin drawing; calling while running does not add a second loop
    pub fn start(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if self.state == SchedulerState::Running {
            return;
        }
        self.state = SchedulerState::Running;
        self.limiter.reset();
        if !self.frame_pending {
            surface.request_frame();
            self.frame_pending = true;
        }
        info!(strategy = %self.strategy, "visualizer started");
    }

    /// Stop drawing and blank the surface; late callbacks draw nothing
    pub fn stop(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if self.state == SchedulerState::Stopped {
            return;
        }
        self.state = SchedulerState::Stopped;
        self.frame_pending = false;
        self.smoothed.clear();
        surface.clear();
        info!("visualizer stopped");
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Switch strategy; smoothed values start over from zero
    pub fn set_strategy(&mut self, kind: StrategyKind) {
        if self.surface.is_none() || kind == self.strategy {
            return;
        }
        self.strategy = kind;
        self.smoothed.clear();
        debug!(strategy = %kind, "visualizer strategy changed");
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Clamped to the sensitivity range; takes effect next frame
    pub fn set_sensitivity(&mut self, value: f32) {
        if self.surface.is_none() {
            return;
        }
        self.sensitivity = clamp_sensitivity(value);
    }

    /// Current smoothed bucket values (empty right after a reset)
    pub fn smoothed_values(&self) -> Vec<f32> {
        self.smoothed.values()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Record a size change; applied once resizes go quiet
    pub fn notify_resize(&mut self, now: Instant, viewport: Viewport) {
        if self.surface.is_none() {
            return;
        }
        self.resize.notify(now, viewport);
    }

    /// When the pending resize becomes due, if any
    pub fn resize_deadline(&self) -> Option<Instant> {
        self.resize.deadline()
    }

    /// Apply a due resize; true if dimensions were recomputed
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        let Some(viewport) = self.resize.poll(now) else {
            return false;
        };
        surface.resize(viewport);
        self.viewport = viewport;
        self.resizes_applied += 1;
        debug!(
            width = viewport.width,
            height = viewport.height,
            scale = viewport.scale_factor,
            "surface resized"
        );
        true
    }

    pub fn resizes_applied(&self) -> u64 {
        self.resizes_applied
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Receive every snapshot the loop renders; slow receivers miss frames
    pub fn subscribe(&mut self, capacity: usize) -> Receiver<AnalysisSnapshot> {
        self.feed.subscribe(capacity)
    }

    /// Handle one display refresh
    pub fn on_frame(&mut self, now: Instant, source: &mut impl SnapshotSource) -> FrameOutcome {
        self.frame_pending = false;
        if self.state == SchedulerState::Stopped || self.surface.is_none() {
            return FrameOutcome::Idle;
        }

        self.poll_resize(now);

        let outcome = if self.limiter.accept(now) {
            self.draw(source)
        } else {
            FrameOutcome::Skipped
        };

        if let Some(surface) = self.surface.as_mut() {
            surface.request_frame();
            self.frame_pending = true;
        }
        outcome
    }

    fn draw(&mut self, source: &mut impl SnapshotSource) -> FrameOutcome {
        let strategy = self.strategy.strategy();
        let snapshot = source.snapshot(strategy.input());
        let ctx = FrameContext {
            viewport: self.viewport,
            sensitivity: self.sensitivity,
            bucket_count: self.config.bucket_count,
        };
        let frame = strategy.render(&snapshot, &mut self.smoothed, &ctx);

        let Some(surface) = self.surface.as_mut() else {
            return FrameOutcome::Idle;
        };
        if let Err(e) = surface.present(&frame) {
            debug!("frame skipped: {}", e);
            return FrameOutcome::Failed;
        }

        self.frames_rendered += 1;
        if !snapshot.is_empty() {
            self.feed.publish(&snapshot);
        }
        FrameOutcome::Rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SnapshotKind;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSurface {
        requests: usize,
        presented: usize,
        clears: usize,
        fail: bool,
        resized: Vec<Viewport>,
    }

    impl Surface for RecordingSurface {
        fn viewport(&self) -> Viewport {
            Viewport::new(640.0, 480.0, 1.0)
        }

        fn request_frame(&mut self) {
            self.requests += 1;
        }

        fn present(&mut self, _frame: &Frame) -> Result<(), RenderError> {
            if self.fail {
                return Err(RenderError::Surface("lost".into()));
            }
            self.presented += 1;
            Ok(())
        }

        fn clear(&mut self) {
            self.clears += 1;
        }

        fn resize(&mut self, viewport: Viewport) {
            self.resized.push(viewport);
        }
    }

    struct Constant(u8);

    impl SnapshotSource for Constant {
        fn snapshot(&mut self, kind: SnapshotKind) -> AnalysisSnapshot {
            AnalysisSnapshot::new(kind, vec![self.0; 1024])
        }
    }

    fn scheduler() -> RenderScheduler<RecordingSurface> {
        RenderScheduler::new(VisualizerConfig::default(), Some(RecordingSurface::default()))
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut scheduler = scheduler();
        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());
        assert_eq!(scheduler.surface().unwrap().requests, 1);
    }

    #[test]
    fn test_stop_prevents_further_draws() {
        let mut scheduler = scheduler();
        let now = Instant::now();
        scheduler.start();
        assert_eq!(scheduler.on_frame(now, &mut Constant(200)), FrameOutcome::Rendered);
        scheduler.stop();
        let late = scheduler.on_frame(now + Duration::from_secs(1), &mut Constant(200));
        assert_eq!(late, FrameOutcome::Idle);

        let surface = scheduler.surface().unwrap();
        assert_eq!(surface.presented, 1);
        assert_eq!(surface.clears, 1);
    }

    #[test]
    fn test_surface_error_skips_frame_and_continues() {
        let mut scheduler = RenderScheduler::new(
            VisualizerConfig::default(),
            Some(RecordingSurface {
                fail: true,
                ..Default::default()
            }),
        );
        scheduler.start();
        let outcome = scheduler.on_frame(Instant::now(), &mut Constant(10));
        assert_eq!(outcome, FrameOutcome::Failed);
        assert!(scheduler.is_running());
        assert_eq!(scheduler.surface().unwrap().requests, 2);
    }

    #[test]
    fn test_missing_surface_is_inert() {
        let mut scheduler: RenderScheduler<RecordingSurface> =
            RenderScheduler::new(VisualizerConfig::default(), None);
        scheduler.start();
        scheduler.set_strategy(StrategyKind::Circular);
        scheduler.set_sensitivity(2.0);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.strategy(), StrategyKind::Bars);
        assert_eq!(
            scheduler.on_frame(Instant::now(), &mut Constant(0)),
            FrameOutcome::Idle
        );
    }

    #[test]
    fn test_sensitivity_clamped() {
        let mut scheduler = scheduler();
        scheduler.set_sensitivity(10.0);
        assert_eq!(scheduler.sensitivity(), 3.0);
        scheduler.set_sensitivity(0.0);
        assert_eq!(scheduler.sensitivity(), 0.5);
    }

    #[test]
    fn test_feed_receives_rendered_snapshots() {
        let mut scheduler = scheduler();
        let rx = scheduler.subscribe(8);
        scheduler.start();
        scheduler.on_frame(Instant::now(), &mut Constant(42));
        let snapshot = rx.try_recv().unwrap();
        assert_eq!(snapshot.kind(), SnapshotKind::Frequency);
        assert!(snapshot.values().iter().all(|&v| v == 42));
    }
}
