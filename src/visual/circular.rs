//! Radial spectrum around a center disc.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;

use super::frame::{palette, DrawCommand, Frame};
use super::strategy::{stride_buckets, FrameContext, RenderStrategy, SmoothedBuffer};
use crate::audio::{AnalysisSnapshot, SnapshotKind};

const SPOKE_WIDTH: f32 = 3.0;
const DISC_STROKE: f32 = 2.0;
/// Center disc radius as a share of the ring radius
const DISC_RATIO: f32 = 0.3;

/// Spokes radiating outward from a ring, first spoke at twelve o'clock
#[derive(Debug, Clone, Copy, Default)]
pub struct Circular;

impl Circular {
    /// Ring radius for a viewport: a third of the shorter side
    pub fn ring_radius(width: f32, height: f32) -> f32 {
        width.min(height) / 3.0
    }
}

impl RenderStrategy for Circular {
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
        let center = viewport.center();
        let radius = Self::ring_radius(viewport.width, viewport.height);
        let values = snapshot.values();
        let count = ctx.bucket_count.min(values.len());

        let mut frame = Frame::with_capacity(count + 2);
        frame.push(DrawCommand::Fill {
            color: palette::SHADE,
        });
        frame.push(DrawCommand::Circle {
            center,
            radius: radius * DISC_RATIO,
            fill: palette::CYAN.with_alpha(0.2),
            stroke: palette::CYAN,
            stroke_width: DISC_STROKE,
        });
        if count == 0 {
            return frame;
        }

        let slice = TAU / count as f32;
        for (i, value) in stride_buckets(values, count).enumerate() {
            let level = smoothed.approach(i, value as f32 / 255.0 * ctx.sensitivity);
            let length = level * radius;
            if length <= 0.0 {
                continue;
            }
            let angle = slice * i as f32 - FRAC_PI_2;
            let direction = Vec2::new(angle.cos(), angle.sin());
            frame.push(DrawCommand::Line {
                from: center + direction * radius,
                to: center + direction * (radius + length),
                width: SPOKE_WIDTH,
                from_color: palette::CYAN.with_alpha(0.5),
                to_color: palette::CYAN,
            });
        }

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::Viewport;

    #[test]
    fn test_first_spoke_points_up() {
        let ctx = FrameContext {
            viewport: Viewport::new(600.0, 300.0, 1.0),
            sensitivity: 1.0,
            bucket_count: 64,
        };
        let mut smoothed = SmoothedBuffer::new(0.0);
        let snapshot = AnalysisSnapshot::new(SnapshotKind::Frequency, vec![255; 1024]);
        let frame = Circular.render(&snapshot, &mut smoothed, &ctx);

        assert_eq!(frame.len(), 2 + 64);
        match &frame.commands()[2] {
            DrawCommand::Line { from, to, .. } => {
                // ring radius 100 centred at (300, 150), spoke length 100
                assert!((from.x - 300.0).abs() < 1e-3);
                assert!((from.y - 50.0).abs() < 1e-3);
                assert!((to.y + 50.0).abs() < 1e-3);
            }
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_snapshot_draws_disc_only() {
        let ctx = FrameContext {
            viewport: Viewport::new(600.0, 300.0, 1.0),
            sensitivity: 1.5,
            bucket_count: 64,
        };
        let mut smoothed = SmoothedBuffer::new(0.85);
        let snapshot = AnalysisSnapshot::new(SnapshotKind::Frequency, vec![0; 1024]);
        let frame = Circular.render(&snapshot, &mut smoothed, &ctx);
        assert_eq!(frame.len(), 2);
        assert!(smoothed.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_spokes_follow_new_radius() {
        let small = FrameContext {
            viewport: Viewport::new(300.0, 300.0, 1.0),
            sensitivity: 1.0,
            bucket_count: 64,
        };
        let mut smoothed = SmoothedBuffer::new(0.0);
        let snapshot = AnalysisSnapshot::new(SnapshotKind::Frequency, vec![255; 1024]);
        Circular.render(&snapshot, &mut smoothed, &small);
        assert!((smoothed.values()[0] - 1.0).abs() < 1e-6);

        let large = FrameContext {
            viewport: Viewport::new(900.0, 900.0, 1.0),
            ..small
        };
        let frame = Circular.render(&snapshot, &mut smoothed, &large);
        match &frame.commands()[2] {
            DrawCommand::Line { from, to, .. } => assert!((from.distance(*to) - 300.0).abs() < 1e-2),
            other => panic!("expected line, got {:?}", other),
        }
    }
}
