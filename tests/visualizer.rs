use std::f32::consts::PI;
use std::time::{Duration, Instant};

use eqscope::audio::{
    AnalysisSnapshot, Analyzer, OfflineHost, SampleSource, SnapshotKind, SnapshotSource,
};
use eqscope::params::{AnalyzerConfig, EqualizerConfig, VisualizerConfig};
use eqscope::visual::{
    DrawCommand, Frame, FrameOutcome, RenderScheduler, StrategyKind, Surface, Viewport,
};
use eqscope::{Player, RenderError};

#[derive(Default)]
struct MockSurface {
    requests: usize,
    presented: Vec<Frame>,
    clears: usize,
    resized: Vec<Viewport>,
}

impl Surface for MockSurface {
    fn viewport(&self) -> Viewport {
        Viewport::new(800.0, 600.0, 2.0)
    }

    fn request_frame(&mut self) {
        self.requests += 1;
    }

    fn present(&mut self, frame: &Frame) -> Result<(), RenderError> {
        self.presented.push(frame.clone());
        Ok(())
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn resize(&mut self, viewport: Viewport) {
        self.resized.push(viewport);
    }
}

/// Replays a fixed byte pattern for either snapshot kind
struct Fixed(u8);

impl SnapshotSource for Fixed {
    fn snapshot(&mut self, kind: SnapshotKind) -> AnalysisSnapshot {
        AnalysisSnapshot::new(kind, vec![self.0; 1024])
    }
}

fn scheduler() -> RenderScheduler<MockSurface> {
    RenderScheduler::new(VisualizerConfig::default(), Some(MockSurface::default()))
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn test_double_start_schedules_one_loop() {
    let mut scheduler = scheduler();
    scheduler.start();
    scheduler.start();
    assert_eq!(scheduler.surface().unwrap().requests, 1);

    // Each callback schedules exactly one successor
    scheduler.on_frame(Instant::now(), &mut Fixed(0));
    assert_eq!(scheduler.surface().unwrap().requests, 2);
}

#[test]
fn test_high_refresh_display_capped_at_target_rate() {
    let mut scheduler = scheduler();
    scheduler.start();
    let start = Instant::now();
    let mut outcomes = Vec::new();
    for tick in 0..144u32 {
        let now = start + Duration::from_secs_f64(tick as f64 / 144.0);
        outcomes.push(scheduler.on_frame(now, &mut Fixed(100)));
    }
    let rendered = outcomes
        .iter()
        .filter(|&&o| o == FrameOutcome::Rendered)
        .count();
    assert!(rendered <= 61, "rendered {} frames", rendered);
    assert_eq!(scheduler.frames_rendered() as usize, rendered);
    assert!(outcomes.contains(&FrameOutcome::Skipped));
}

#[test]
fn test_strategy_round_trip_resets_smoothing() {
    let mut scheduler = scheduler();
    scheduler.start();
    let start = Instant::now();
    for i in 0..5 {
        scheduler.on_frame(start + ms(20 * i), &mut Fixed(255));
    }
    assert!(scheduler.smoothed_values().iter().all(|&v| v > 0.0));

    scheduler.set_strategy(StrategyKind::Circular);
    assert!(scheduler.smoothed_values().is_empty());
    scheduler.set_strategy(StrategyKind::Bars);

    scheduler.on_frame(start + ms(200), &mut Fixed(0));
    let values = scheduler.smoothed_values();
    assert_eq!(values.len(), 64);
    assert!(values.iter().all(|&v| v == 0.0));
}

#[test]
fn test_unattached_analyzer_draws_background_only() {
    let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
    assert!(analyzer.snapshot(SnapshotKind::Frequency).is_empty());
    assert!(analyzer.snapshot(SnapshotKind::Waveform).is_empty());

    let mut scheduler = scheduler();
    let feed = scheduler.subscribe(4);
    scheduler.start();
    assert_eq!(
        scheduler.on_frame(Instant::now(), &mut analyzer),
        FrameOutcome::Rendered
    );
    let frame = &scheduler.surface().unwrap().presented[0];
    assert_eq!(frame.len(), 1);
    assert!(feed.try_recv().is_err());
}

#[test]
fn test_resize_burst_applied_once_after_quiet_period() {
    let mut scheduler = scheduler();
    let start = Instant::now();
    scheduler.notify_resize(start, Viewport::from_physical(1000, 800, 2.0));
    scheduler.notify_resize(start + ms(80), Viewport::from_physical(1200, 900, 2.0));

    assert!(!scheduler.poll_resize(start + ms(200)));
    assert!(scheduler.poll_resize(start + ms(330)));
    assert!(!scheduler.poll_resize(start + ms(1000)));

    assert_eq!(scheduler.resizes_applied(), 1);
    let viewport = scheduler.viewport();
    assert_eq!((viewport.width, viewport.height), (600.0, 450.0));
    assert_eq!(scheduler.surface().unwrap().resized.len(), 1);
}

#[test]
fn test_frames_use_logical_coordinates() {
    let mut scheduler = scheduler();
    scheduler.start();
    scheduler.on_frame(Instant::now(), &mut Fixed(255));
    let frame = &scheduler.surface().unwrap().presented[0];
    for command in frame.commands() {
        if let DrawCommand::Rect { max, .. } = command {
            assert!(max.x <= 800.0 + 1e-3);
            assert!(max.y <= 600.0 + 1e-3);
        }
    }
}

#[test]
fn test_stop_clears_and_ignores_late_callbacks() {
    let mut scheduler = scheduler();
    let start = Instant::now();
    scheduler.start();
    scheduler.on_frame(start, &mut Fixed(50));
    scheduler.stop();
    scheduler.stop();
    assert_eq!(
        scheduler.on_frame(start + ms(100), &mut Fixed(50)),
        FrameOutcome::Idle
    );
    let surface = scheduler.surface().unwrap();
    assert_eq!(surface.presented.len(), 1);
    assert_eq!(surface.clears, 1);
}

#[test]
fn test_player_end_to_end() {
    let mut player: Player<OfflineHost, MockSurface> = Player::new(
        EqualizerConfig::default(),
        AnalyzerConfig::default(),
        VisualizerConfig::default(),
        Ok(OfflineHost::new(44100, 2)),
        Some(MockSurface::default()),
    )
    .unwrap();
    let feed = player.subscribe(8);

    let tone: Vec<f32> = (0..44100)
        .map(|i| (2.0 * PI * 1000.0 * i as f32 / 44100.0).sin() * 0.5)
        .collect();
    player.attach_source(Box::new(SampleSource::new(tone, 1, 44100).looping(true)));
    player.apply_preset("vocal").unwrap();
    player.play().unwrap();

    player.chain_mut().unwrap().host_mut().run_for(0.1);
    assert_eq!(player.on_frame(Instant::now()), FrameOutcome::Rendered);

    let snapshot = feed.try_recv().unwrap();
    assert_eq!(snapshot.kind(), SnapshotKind::Frequency);
    assert_eq!(snapshot.len(), 1024);
    let bin = player.analyzer().hz_to_bin(1000.0, 44100);
    assert!(snapshot.values()[bin] > 0);

    player.set_strategy(StrategyKind::Waveform);
    player.on_frame(Instant::now() + ms(50));
    let waveform = feed.try_recv().unwrap();
    assert_eq!(waveform.kind(), SnapshotKind::Waveform);
    assert_eq!(waveform.len(), 2048);

    player.pause();
    assert!(!player.scheduler().is_running());
}

#[test]
fn test_loop_stops_when_source_runs_out() {
    let mut player: Player<OfflineHost, MockSurface> = Player::new(
        EqualizerConfig::default(),
        AnalyzerConfig::default(),
        VisualizerConfig::default(),
        Ok(OfflineHost::new(44100, 2)),
        Some(MockSurface::default()),
    )
    .unwrap();
    player.attach_source(Box::new(SampleSource::new(vec![0.3; 100], 1, 44100)));
    player.play().unwrap();
    let start = Instant::now();
    assert_eq!(player.on_frame(start), FrameOutcome::Rendered);

    player.chain_mut().unwrap().host_mut().render(4096);
    assert!(!player.is_playing());
    assert_eq!(player.on_frame(start + ms(1000)), FrameOutcome::Idle);
    assert!(!player.scheduler().is_running());

    let surface = player.scheduler().surface().unwrap();
    assert_eq!(surface.presented.len(), 1);
    assert_eq!(surface.clears, 1);

    // Replay rewinds the source and restarts the loop
    player.play().unwrap();
    assert!(player.scheduler().is_running());
}

#[test]
fn test_unusable_frame_rate_is_a_config_error() {
    let visualizer = VisualizerConfig {
        target_fps: 1e-30,
        ..VisualizerConfig::default()
    };
    let result: Result<Player<OfflineHost, MockSurface>, _> = Player::new(
        EqualizerConfig::default(),
        AnalyzerConfig::default(),
        visualizer.clone(),
        Ok(OfflineHost::new(44100, 2)),
        Some(MockSurface::default()),
    );
    assert!(result.is_err());

    // Built directly, the scheduler paces at the slowest supported rate
    let mut scheduler = RenderScheduler::new(visualizer, Some(MockSurface::default()));
    scheduler.start();
    let start = Instant::now();
    assert_eq!(scheduler.on_frame(start, &mut Fixed(10)), FrameOutcome::Rendered);
    assert_eq!(
        scheduler.on_frame(start + ms(500), &mut Fixed(10)),
        FrameOutcome::Skipped
    );
    assert_eq!(
        scheduler.on_frame(start + ms(1000), &mut Fixed(10)),
        FrameOutcome::Rendered
    );
}
