//! Chromatic aberration: red and blue sampled at opposite offsets.

use crate::postprocessing::pass::{FullscreenVertex, Pass, FULLSCREEN_QUAD_VERTICES};
use serde::{Deserialize, Serialize};
use wgpu::util::DeviceExt;

/// RGB shift settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RgbShiftSettings {
    /// Offset length in UV units.
    pub amount: f32,
    /// Offset direction in radians, 0 pointing right.
    pub angle: f32,
}

impl Default for RgbShiftSettings {
    fn default() -> Self {
        Self {
            amount: 0.0015,
            angle: 0.0,
        }
    }
}

impl RgbShiftSettings {
    /// UV offset for the red channel; blue uses the negation.
    ///
    /// UV `v` grows downward, so positive angles point up the screen.
    pub fn offset(&self) -> [f32; 2] {
        [self.amount * self.angle.cos(), -self.amount * self.angle.sin()]
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct RgbShiftUniform {
    /// offset.xy, unused, unused
    params: [f32; 4],
}

impl RgbShiftUniform {
    fn new(settings: &RgbShiftSettings) -> Self {
        let [x, y] = settings.offset();
        Self { params: [x, y, 0.0, 0.0] }
    }
}

/// The chromatic aberration stage.
pub struct RgbShiftPass {
    settings: RgbShiftSettings,
    width: u32,
    height: u32,
    format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    uniform_buffer: Option<wgpu::Buffer>,
    quad_buffer: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
}

impl RgbShiftPass {
    /// Create with default settings.
    pub fn new() -> Self {
        Self::with_settings(RgbShiftSettings::default())
    }

    /// Create with explicit settings.
    pub fn with_settings(settings: RgbShiftSettings) -> Self {
        Self {
            settings,
            width: 1,
            height: 1,
            format: None,
            pipeline: None,
            bind_group_layout: None,
            uniform_buffer: None,
            quad_buffer: None,
            sampler: None,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &RgbShiftSettings {
        &self.settings
    }

    /// Output format the pipeline was built for.
    pub fn format(&self) -> Option<wgpu::TextureFormat> {
        self.format
    }

    /// Size of the last resize.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Create GPU resources for writing into `format` targets.
    pub fn init(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        self.format = Some(format);

        self.sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("RGB Shift Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("RGB Shift Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        self.uniform_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("RGB Shift Uniform Buffer"),
            contents: bytemuck::cast_slice(&[RgbShiftUniform::new(&self.settings)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        }));

        self.quad_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("RGB Shift Quad Buffer"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("RGB Shift Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("RGB Shift Shader"),
            source: wgpu::ShaderSource::Wgsl(RGB_SHIFT_SHADER.into()),
        });

        self.pipeline = Some(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("RGB Shift Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[FullscreenVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        }));

        self.bind_group_layout = Some(bind_group_layout);
    }

    /// Write the shifted `input` into `output`.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let Some(ref pipeline) = self.pipeline else { return };
        let Some(ref bind_group_layout) = self.bind_group_layout else { return };
        let Some(ref sampler) = self.sampler else { return };
        let Some(ref uniform_buffer) = self.uniform_buffer else { return };
        let Some(ref quad_buffer) = self.quad_buffer else { return };

        queue.write_buffer(uniform_buffer, 0, bytemuck::cast_slice(&[RgbShiftUniform::new(&self.settings)]));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("RGB Shift Bind Group"),
            layout: bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("RGB Shift Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, quad_buffer.slice(..));
        pass.draw(0..6, 0..1);
    }
}

impl Default for RgbShiftPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for RgbShiftPass {
    fn name(&self) -> &'static str {
        "rgb_shift"
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
    }
}

const RGB_SHIFT_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

struct Params {
    // offset.xy, unused, unused
    params: vec4<f32>,
}

@group(0) @binding(0) var input_texture: texture_2d<f32>;
@group(0) @binding(1) var input_sampler: sampler;
@group(0) @binding(2) var<uniform> params: Params;

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let offset = params.params.xy;
    let cr = textureSample(input_texture, input_sampler, in.uv + offset);
    let cga = textureSample(input_texture, input_sampler, in.uv);
    let cb = textureSample(input_texture, input_sampler, in.uv - offset);
    return vec4<f32>(cr.r, cga.g, cb.b, cga.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_horizontal_shift() {
        let settings = RgbShiftSettings::default();
        assert_eq!(settings.amount, 0.0015);
        assert_eq!(settings.offset(), [0.0015, 0.0]);
    }

    #[test]
    fn test_quarter_turn_points_up() {
        let settings = RgbShiftSettings {
            amount: 1.0,
            angle: std::f32::consts::FRAC_PI_2,
        };
        let [x, y] = settings.offset();
        assert!(x.abs() < 1e-6);
        assert!((y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resize_ignores_zero() {
        let mut pass = RgbShiftPass::new();
        pass.resize(640, 480);
        pass.resize(0, 480);
        assert_eq!(pass.size(), (640, 480));
        assert_eq!(pass.name(), "rgb_shift");
    }
}
