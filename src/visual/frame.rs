//! Draw commands produced by render strategies.

use glam::Vec2;

/// Straight (non-premultiplied) RGBA color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// From 8-bit channels and a 0.0-1.0 alpha
    pub fn rgb8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Visualizer palette
pub mod palette {
    use super::Rgba;

    /// #00ff88
    pub const GREEN: Rgba = Rgba::new(0.0, 1.0, 0.533, 1.0);
    /// #00d4ff
    pub const CYAN: Rgba = Rgba::new(0.0, 0.831, 1.0, 1.0);
    /// #0099ff
    pub const BLUE: Rgba = Rgba::new(0.0, 0.6, 1.0, 1.0);
    /// Translucent black wash drawn under each frame
    pub const SHADE: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.1);
}

/// One primitive in logical (DPI-independent) pixels, origin top-left
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Cover the whole surface
    Fill { color: Rgba },
    /// Axis-aligned rectangle with a vertical gradient
    Rect {
        min: Vec2,
        max: Vec2,
        top: Rgba,
        bottom: Rgba,
    },
    /// Thick segment with a color ramp from `from` to `to`
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        from_color: Rgba,
        to_color: Rgba,
    },
    /// Connected thick segments of one color
    Polyline {
        points: Vec<Vec2>,
        width: f32,
        color: Rgba,
    },
    /// Filled disc with an outline
    Circle {
        center: Vec2,
        radius: f32,
        fill: Rgba,
        stroke: Rgba,
        stroke_width: f32,
    },
}

/// Everything to draw for one accepted frame, in painter's order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Display dimensions of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical width (pixels / scale factor)
    pub width: f32,
    /// Logical height
    pub height: f32,
    /// Device pixels per logical pixel
    pub scale_factor: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        Self {
            width,
            height,
            scale_factor: if scale_factor > 0.0 { scale_factor } else { 1.0 },
        }
    }

    /// From a backing-store size in device pixels
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor as f32 } else { 1.0 };
        Self::new(width as f32 / scale, height as f32 / scale, scale)
    }

    /// Backing-store size in device pixels
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width * self.scale_factor).round() as u32,
            (self.height * self.scale_factor).round() as u32,
        )
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Zero-area viewports (minimized window) cannot be drawn
    pub fn is_drawable(&self) -> bool {
        self.width >= 1.0 && self.height >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_dpi_round_trip() {
        let viewport = Viewport::from_physical(2560, 1440, 2.0);
        assert_eq!(viewport.width, 1280.0);
        assert_eq!(viewport.height, 720.0);
        assert_eq!(viewport.physical_size(), (2560, 1440));
        assert_eq!(viewport.center(), Vec2::new(640.0, 360.0));
    }

    #[test]
    fn test_rgb8_matches_palette() {
        let cyan = Rgba::rgb8(0x00, 0xd4, 0xff, 1.0);
        assert!((cyan.g - palette::CYAN.g).abs() < 1e-3);
        assert_eq!(cyan.with_alpha(0.5).a, 0.5);
    }

    #[test]
    fn test_invalid_scale_falls_back_to_one() {
        let viewport = Viewport::from_physical(800, 600, 0.0);
        assert_eq!(viewport.scale_factor, 1.0);
        assert!(viewport.is_drawable());
        assert!(!Viewport::new(0.0, 600.0, 1.0).is_drawable());
    }
}
