//! Visualizer: pluggable strategies drawn on display refresh.
//!
//! Strategies turn an [`AnalysisSnapshot`](crate::audio::AnalysisSnapshot)
//! into a [`Frame`] of draw commands; the [`RenderScheduler`] paces them
//! against the target frame rate and hands frames to a [`Surface`].

mod bars;
mod circular;
mod feed;
mod frame;
mod limiter;
mod resize;
mod scheduler;
mod strategy;
mod waveform;

pub use bars::Bars;
pub use circular::Circular;
pub use feed::SnapshotFeed;
pub use frame::{palette, DrawCommand, Frame, Rgba, Viewport};
pub use limiter::FrameLimiter;
pub use resize::ResizeDebouncer;
pub use scheduler::{FrameOutcome, RenderScheduler, SchedulerState, Surface};
pub use strategy::{FrameContext, RenderStrategy, SmoothedBuffer, StrategyKind};
pub use waveform::Waveform;
