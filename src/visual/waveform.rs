//! Oscilloscope trace with a faint mirror.

use glam::Vec2;

use super::frame::{palette, DrawCommand, Frame};
use super::strategy::{FrameContext, RenderStrategy, SmoothedBuffer};
use crate::audio::{AnalysisSnapshot, SnapshotKind};

const LINE_WIDTH: f32 = 2.0;
const MIRROR_ALPHA: f32 = 0.3;

/// Time-domain trace across the full width, centered vertically
///
/// Draws the raw samples each frame at unit scale; sensitivity and the
/// smoothed buffer only apply to the frequency strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Waveform;

impl RenderStrategy for Waveform {
    fn input(&self) -> SnapshotKind {
        SnapshotKind::Waveform
    }

    fn render(
        &self,
        snapshot: &AnalysisSnapshot,
        _smoothed: &mut SmoothedBuffer,
        ctx: &FrameContext,
    ) -> Frame {
        let viewport = ctx.viewport;
        let mut frame = Frame::with_capacity(3);
        frame.push(DrawCommand::Fill {
            color: palette::SHADE,
        });

        let values = snapshot.values();
        if values.len() < 2 {
            return frame;
        }

        let mid = viewport.height / 2.0;
        let step = viewport.width / (values.len() - 1) as f32;
        let deflection = |v: u8| (v as f32 - 128.0) / 128.0 * mid;

        let trace = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Vec2::new(i as f32 * step, (mid - deflection(v)).clamp(0.0, viewport.height)))
            .collect();
        let mirror = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Vec2::new(i as f32 * step, (mid + deflection(v)).clamp(0.0, viewport.height)))
            .collect();

        frame.push(DrawCommand::Polyline {
            points: trace,
            width: LINE_WIDTH,
            color: palette::CYAN,
        });
        frame.push(DrawCommand::Polyline {
            points: mirror,
            width: LINE_WIDTH,
            color: palette::BLUE.with_alpha(MIRROR_ALPHA),
        });
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::Viewport;

    fn ctx() -> FrameContext {
        FrameContext {
            viewport: Viewport::new(400.0, 200.0, 1.0),
            sensitivity: 1.0,
            bucket_count: 64,
        }
    }

    #[test]
    fn test_silence_is_flat_midline() {
        let snapshot = AnalysisSnapshot::new(SnapshotKind::Waveform, vec![128; 2048]);
        let frame = Waveform.render(&snapshot, &mut SmoothedBuffer::new(0.85), &ctx());
        assert_eq!(frame.len(), 3);
        match &frame.commands()[1] {
            DrawCommand::Polyline { points, .. } => {
                assert_eq!(points.len(), 2048);
                assert!(points.iter().all(|p| (p.y - 100.0).abs() < 1e-4));
                assert!((points[2047].x - 400.0).abs() < 1e-3);
            }
            other => panic!("expected polyline, got {:?}", other),
        }
    }

    #[test]
    fn test_mirror_is_reflected() {
        let snapshot = AnalysisSnapshot::new(SnapshotKind::Waveform, vec![192, 64]);
        let frame = Waveform.render(&snapshot, &mut SmoothedBuffer::new(0.85), &ctx());
        let (DrawCommand::Polyline { points: trace, .. }, DrawCommand::Polyline { points: mirror, color, .. }) =
            (&frame.commands()[1], &frame.commands()[2])
        else {
            panic!("expected two polylines");
        };
        assert!((trace[0].y - 50.0).abs() < 1e-3);
        assert!((mirror[0].y - 150.0).abs() < 1e-3);
        assert!((color.a - MIRROR_ALPHA).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sensitivity_does_not_scale_trace() {
        let snapshot = AnalysisSnapshot::new(SnapshotKind::Waveform, vec![160, 96, 255, 0]);
        let smoothed = &mut SmoothedBuffer::new(0.85);
        let unit = Waveform.render(&snapshot, smoothed, &ctx());
        let boosted = Waveform.render(
            &snapshot,
            smoothed,
            &FrameContext {
                sensitivity: 3.0,
                ..ctx()
            },
        );
        assert_eq!(unit, boosted);
        match &unit.commands()[1] {
            // 160 is a quarter of full scale above the midline
            DrawCommand::Polyline { points, .. } => assert!((points[0].y - 75.0).abs() < 1e-3),
            other => panic!("expected polyline, got {:?}", other),
        }
    }

    #[test]
    fn test_smoothed_buffer_untouched() {
        let mut smoothed = SmoothedBuffer::new(0.85);
        let snapshot = AnalysisSnapshot::new(SnapshotKind::Waveform, vec![255; 64]);
        Waveform.render(&snapshot, &mut smoothed, &ctx());
        assert!(smoothed.is_empty());
    }
}
