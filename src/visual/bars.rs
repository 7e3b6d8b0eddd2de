//! Vertical frequency bars.

use glam::Vec2;

use super::frame::{palette, DrawCommand, Frame};
use super::strategy::{stride_buckets, FrameContext, RenderStrategy, SmoothedBuffer};
use crate::audio::{AnalysisSnapshot, SnapshotKind};

/// Horizontal gap between adjacent bars (logical pixels)
const BAR_GAP: f32 = 2.0;

/// Frequency bars rising from the bottom edge
#[derive(Debug, Clone, Copy, Default)]
pub struct Bars;

impl RenderStrategy for Bars {
    fn input(&self) -> SnapshotKind {
        SnapshotKind::Frequency
    }

    fn render(
        &self,
        snapshot: &AnalysisSnapshot,
        smoothed: &mut SmoothedBuffer,
        ctx: &FrameContext,
    ) -> Frame {
        let viewport = ctx.viewport;
        let values = snapshot.values();
        let count = ctx.bucket_count.min(values.len());

        let mut frame = Frame::with_capacity(count + 1);
        frame.push(DrawCommand::Rect {
            min: Vec2::ZERO,
            max: Vec2::new(viewport.width, viewport.height),
            top: palette::CYAN.with_alpha(0.1),
            bottom: palette::BLUE.with_alpha(0.05),
        });
        if count == 0 {
            return frame;
        }

        let slot = viewport.width / count as f32;
        let bar_width = (slot - BAR_GAP).max(1.0);

        for (i, value) in stride_buckets(values, count).enumerate() {
            // Smoothed as a share of the viewport so resizes rescale at once
            let level = smoothed.approach(i, value as f32 / 255.0 * ctx.sensitivity);
            let height = (level * viewport.height).min(viewport.height);
            if height <= 0.0 {
                continue;
            }
            let x = i as f32 * slot;
            frame.push(DrawCommand::Rect {
                min: Vec2::new(x, viewport.height - height),
                max: Vec2::new(x + bar_width, viewport.height),
                top: palette::GREEN,
                bottom: palette::BLUE,
            });
        }

        frame
    }
}
