//! wgpu window surface: tessellates draw commands into colored triangles.

use std::f32::consts::TAU;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::RenderError;
use crate::visual::{DrawCommand, Frame, Rgba, Surface, Viewport};

/// Segments used to approximate a full circle
const CIRCLE_SEGMENTS: usize = 48;

/// Initial vertex buffer capacity (vertices); grows on demand
const INITIAL_VERTEX_CAPACITY: usize = 16 * 1024;

/// Vertex in logical pixels with a straight-alpha color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    fn new(position: Vec2, color: Rgba) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }
}

/// Logical surface size, for pixel-to-clip conversion in the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ScreenUniforms {
    pub logical_size: [f32; 2],
    pub _padding: [f32; 2],
}

/// Window-backed [`Surface`]
pub struct WindowSurface {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertices: Vec<Vertex>,
    viewport: Viewport,
}

impl WindowSurface {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor());

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|e| RenderError::Surface(format!("failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::SurfaceUnavailable)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Visualizer Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Surface(format!("failed to request device: {}", e)))?;

        // Palette colors are already sRGB-encoded; write them to a linear format untouched
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::SurfaceUnavailable)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Visualizer Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Vertex Buffer"),
            size: (INITIAL_VERTEX_CAPACITY * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniforms = ScreenUniforms {
            logical_size: [viewport.width.max(1.0), viewport.height.max(1.0)],
            _padding: [0.0; 2],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Screen Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Screen Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Screen Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Visualizer Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Visualizer Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                        wgpu::VertexAttribute {
                            offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x4,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Tessellated winding is not normalized
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        info!(
            adapter = %adapter.get_info().name,
            format = ?surface_format,
            width = config.width,
            height = config.height,
            "render surface ready"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            pipeline,
            vertex_buffer,
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
            uniform_buffer,
            uniform_bind_group,
            vertices: Vec::with_capacity(INITIAL_VERTEX_CAPACITY),
            viewport,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    fn ensure_vertex_capacity(&mut self, needed: usize) {
        if needed <= self.vertex_capacity {
            return;
        }
        let capacity = needed.next_power_of_two();
        self.vertex_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Vertex Buffer"),
            size: (capacity * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.vertex_capacity = capacity;
        debug!(capacity, "vertex buffer grown");
    }

    /// Encode one pass that clears, then draws the staged vertices
    fn submit(&mut self, vertex_count: u32) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Err(RenderError::Surface("surface lost, reconfigured".into()));
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if vertex_count > 0 {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.draw(0..vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl Surface for WindowSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn request_frame(&mut self) {
        self.window.request_redraw();
    }

    fn present(&mut self, frame: &Frame) -> Result<(), RenderError> {
        if !self.viewport.is_drawable() {
            return Err(RenderError::Surface("zero-sized surface".into()));
        }

        let mut vertices = std::mem::take(&mut self.vertices);
        vertices.clear();
        tessellate(frame, self.viewport, &mut vertices);

        self.ensure_vertex_capacity(vertices.len());
        if !vertices.is_empty() {
            self.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
        let count = vertices.len() as u32;
        self.vertices = vertices;
        self.submit(count)
    }

    fn clear(&mut self) {
        if !self.viewport.is_drawable() {
            return;
        }
        if let Err(e) = self.submit(0) {
            warn!("failed to clear surface: {}", e);
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        let (width, height) = viewport.physical_size();
        self.viewport = viewport;
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();

        let uniforms = ScreenUniforms {
            logical_size: [viewport.width, viewport.height],
            _padding: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }
}

/// Append triangles for every command in `frame`
pub fn tessellate(frame: &Frame, viewport: Viewport, out: &mut Vec<Vertex>) {
    for command in frame.commands() {
        match command {
            DrawCommand::Fill { color } => {
                let max = Vec2::new(viewport.width, viewport.height);
                push_quad(out, Vec2::ZERO, max, *color, *color);
            }
            DrawCommand::Rect {
                min,
                max,
                top,
                bottom,
            } => push_quad(out, *min, *max, *top, *bottom),
            DrawCommand::Line {
                from,
                to,
                width,
                from_color,
                to_color,
            } => push_segment(out, *from, *to, *width, *from_color, *to_color),
            DrawCommand::Polyline {
                points,
                width,
                color,
            } => {
                for pair in points.windows(2) {
                    push_segment(out, pair[0], pair[1], *width, *color, *color);
                }
            }
            DrawCommand::Circle {
                center,
                radius,
                fill,
                stroke,
                stroke_width,
            } => push_circle(out, *center, *radius, *fill, *stroke, *stroke_width),
        }
    }
}

fn push_quad(out: &mut Vec<Vertex>, min: Vec2, max: Vec2, top: Rgba, bottom: Rgba) {
    let tl = Vertex::new(min, top);
    let tr = Vertex::new(Vec2::new(max.x, min.y), top);
    let bl = Vertex::new(Vec2::new(min.x, max.y), bottom);
    let br = Vertex::new(max, bottom);
    out.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
}

fn push_segment(out: &mut Vec<Vertex>, from: Vec2, to: Vec2, width: f32, a: Rgba, b: Rgba) {
    let direction = to - from;
    if direction.length_squared() <= f32::EPSILON {
        return;
    }
    let normal = direction.perp().normalize() * (width / 2.0);
    let a0 = Vertex::new(from + normal, a);
    let a1 = Vertex::new(from - normal, a);
    let b0 = Vertex::new(to + normal, b);
    let b1 = Vertex::new(to - normal, b);
    out.extend_from_slice(&[a0, a1, b0, b0, a1, b1]);
}

fn push_circle(
    out: &mut Vec<Vertex>,
    center: Vec2,
    radius: f32,
    fill: Rgba,
    stroke: Rgba,
    stroke_width: f32,
) {
    let point = |i: usize, r: f32| {
        let angle = TAU * i as f32 / CIRCLE_SEGMENTS as f32;
        center + Vec2::new(angle.cos(), angle.sin()) * r
    };

    if fill.a > 0.0 {
        for i in 0..CIRCLE_SEGMENTS {
            out.extend_from_slice(&[
                Vertex::new(center, fill),
                Vertex::new(point(i, radius), fill),
                Vertex::new(point(i + 1, radius), fill),
            ]);
        }
    }

    if stroke.a > 0.0 && stroke_width > 0.0 {
        let inner = (radius - stroke_width / 2.0).max(0.0);
        let outer = radius + stroke_width / 2.0;
        for i in 0..CIRCLE_SEGMENTS {
            let i0 = Vertex::new(point(i, inner), stroke);
            let o0 = Vertex::new(point(i, outer), stroke);
            let i1 = Vertex::new(point(i + 1, inner), stroke);
            let o1 = Vertex::new(point(i + 1, outer), stroke);
            out.extend_from_slice(&[i0, o0, i1, i1, o0, o1]);
        }
    }
}
