//! eqscope - plays a file (or a synth loop) through a ten-band equalizer
//! and draws its spectrum in a window.
//!
//! Keys: Space play/pause, Tab next visualizer, P next preset,
//! Up/Down sensitivity, +/- volume, R reset gains, Esc quit.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use eqscope::audio::{
    load_wav, AudioHost, CpalHost, MediaSource, SynthSource, BUILTIN_PRESETS, DEMO_COMPOSITION,
};
use eqscope::cli::Args;
use eqscope::params::WindowConfig;
use eqscope::rendering::WindowSurface;
use eqscope::visual::Viewport;
use eqscope::Player;

const SENSITIVITY_STEP: f32 = 0.25;
const VOLUME_STEP: f32 = 0.05;

/// Main application state
struct App {
    args: Args,
    window_config: WindowConfig,
    window: Option<Arc<Window>>,
    player: Option<Player<CpalHost, WindowSurface>>,
    preset_index: usize,
}

impl App {
    fn new(args: Args) -> Self {
        let preset_index = BUILTIN_PRESETS
            .iter()
            .position(|p| p.name == args.preset.to_ascii_lowercase())
            .unwrap_or(0);
        Self {
            args,
            window_config: WindowConfig::default(),
            window: None,
            player: None,
            preset_index,
        }
    }

    /// Open the input file, or fall back to the synth loop
    fn open_source(&self, sample_rate: u32) -> Result<Box<dyn MediaSource>> {
        match &self.args.input {
            Some(path) => {
                let source = load_wav(path)
                    .with_context(|| format!("failed to open {}", path.display()))?
                    .looping(self.args.looping)
                    .resampled(sample_rate);
                Ok(Box::new(source))
            }
            None => {
                let synth = SynthSource::new(DEMO_COMPOSITION, sample_rate)
                    .context("failed to start demo synth")?;
                Ok(Box::new(synth))
            }
        }
    }

    fn build_player(&self, window: &Arc<Window>) -> Result<Player<CpalHost, WindowSurface>> {
        let surface = match pollster::block_on(WindowSurface::new(Arc::clone(window))) {
            Ok(surface) => Some(surface),
            Err(e) => {
                warn!("visualizer disabled: {}", e);
                None
            }
        };

        let equalizer = self.args.equalizer_config();
        let host = CpalHost::open_default(equalizer.sample_rate_hz);
        let mut player = Player::new(
            equalizer,
            self.args.analyzer_config(),
            self.args.visualizer_config(),
            host,
            surface,
        )?;

        if let Some(sample_rate) = player.chain().map(|chain| chain.host().format().sample_rate) {
            let source = self.open_source(sample_rate)?;
            player.attach_source(source);
        }
        if let Err(e) = player.apply_preset(&self.args.preset) {
            warn!("{}, keeping flat", e);
        }
        Ok(player)
    }

    fn handle_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        if code == KeyCode::Escape {
            event_loop.exit();
            return;
        }
        let Some(player) = self.player.as_mut() else {
            return;
        };

        match code {
            KeyCode::Space => {
                if let Err(e) = player.toggle() {
                    warn!("{}", e);
                }
            }
            KeyCode::Tab => {
                let next = player.scheduler().strategy().next();
                player.set_strategy(next);
                info!("visualizer: {}", next);
            }
            KeyCode::KeyP => {
                self.preset_index = (self.preset_index + 1) % BUILTIN_PRESETS.len();
                let preset = &BUILTIN_PRESETS[self.preset_index];
                match player.apply_preset(&preset.name) {
                    Ok(()) => info!("preset: {}", preset.name),
                    Err(e) => warn!("{}", e),
                }
            }
            KeyCode::KeyR => {
                if let Err(e) = player.reset() {
                    warn!("{}", e);
                }
            }
            KeyCode::ArrowUp | KeyCode::ArrowDown => {
                let step = if code == KeyCode::ArrowUp {
                    SENSITIVITY_STEP
                } else {
                    -SENSITIVITY_STEP
                };
                let value = player.scheduler().sensitivity() + step;
                player.set_sensitivity(value);
            }
            KeyCode::Equal | KeyCode::Minus => {
                let step = if code == KeyCode::Equal {
                    VOLUME_STEP
                } else {
                    -VOLUME_STEP
                };
                let volume = player.get_volume() + step;
                player.set_master_gain(volume);
            }
            _ => {}
        }
    }

    fn notify_resize(&mut self) {
        let (Some(window), Some(player)) = (self.window.as_ref(), self.player.as_mut()) else {
            return;
        };
        let size = window.inner_size();
        let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor());
        player.notify_resize(Instant::now(), viewport);
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        // Resizes are applied after their quiet period even when no frame is drawn
        player.poll_resize(Instant::now());
        match player.scheduler().resize_deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.window_config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.window_config.window_width,
                self.window_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut player = match self.build_player(&window) {
            Ok(player) => player,
            Err(e) => {
                error!("{:#}", e);
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = player.play() {
            warn!("playback not started: {}", e);
        }

        info!("eqscope is running (Esc to quit, Space to play/pause)");
        self.window = Some(window);
        self.player = Some(player);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(code, event_loop),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.notify_resize();
            }
            WindowEvent::RedrawRequested => {
                if let Some(player) = self.player.as_mut() {
                    player.on_frame(Instant::now());
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eqscope=info")),
        )
        .init();

    let args = Args::parse();
    info!("eqscope starting");

    let mut app = App::new(args);
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;
    Ok(())
}
