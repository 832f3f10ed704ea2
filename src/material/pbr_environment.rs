//! Metallic-roughness PBR material lit by an equirectangular environment.

use crate::core::ToneMapping;
use crate::geometry::Vertex;
use crate::loaders::{AlphaMode, LoadedMaterial};
use crate::math::{Matrix4, Vector3};
use crate::texture::{Sampler, Texture2D};
use bytemuck::{Pod, Zeroable};

/// Per-frame camera and output parameters (group 0).
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct CameraUniform {
    /// View-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// World-space camera position (w unused).
    pub position: [f32; 4],
    /// Exposure, tone mapping mode, environment mip count, environment intensity.
    pub params: [f32; 4],
}

impl CameraUniform {
    /// Pack camera and output state.
    pub fn new(
        view_proj: &Matrix4,
        position: &Vector3,
        tone_mapping: ToneMapping,
        exposure: f32,
        env_mip_count: u32,
        env_intensity: f32,
    ) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            position: [position.x, position.y, position.z, 1.0],
            params: [
                exposure,
                tone_mapping.shader_mode() as f32,
                env_mip_count as f32,
                env_intensity,
            ],
        }
    }
}

/// Per-object transforms (group 1).
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct ModelUniform {
    /// Model matrix.
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix.
    pub normal: [[f32; 4]; 4],
}

impl ModelUniform {
    /// Build from a world matrix.
    pub fn from_world(world: &Matrix4) -> Self {
        Self {
            model: world.to_cols_array_2d(),
            normal: world.normal_matrix().to_cols_array_2d(),
        }
    }
}

/// Material factors (group 2). Every field is a vec4 to keep WebGL2 std140 layout trivial.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MaterialUniform {
    /// Base color factor.
    pub base_color: [f32; 4],
    /// Emissive factor (w unused).
    pub emissive: [f32; 4],
    /// Metallic, roughness, normal scale, occlusion strength.
    pub factors: [f32; 4],
    /// Alpha cutoff, alpha mode.
    pub alpha: [f32; 4],
}

impl MaterialUniform {
    /// Pack a loaded glTF material.
    pub fn from_loaded(material: &LoadedMaterial) -> Self {
        let [er, eg, eb] = material.emissive;
        let alpha_mode = match material.alpha_mode {
            AlphaMode::Opaque => 0.0,
            AlphaMode::Mask => 1.0,
            AlphaMode::Blend => 2.0,
        };
        Self {
            base_color: material.base_color,
            emissive: [er, eg, eb, 0.0],
            factors: [
                material.metallic,
                material.roughness,
                material.normal_scale,
                material.occlusion_strength,
            ],
            alpha: [material.alpha_cutoff, alpha_mode, 0.0, 0.0],
        }
    }
}

impl Default for MaterialUniform {
    fn default() -> Self {
        Self::from_loaded(&LoadedMaterial::default())
    }
}

/// Fixed-function state that needs its own pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineKey {
    /// Render back faces.
    pub double_sided: bool,
    /// Alpha blending instead of replace.
    pub blend: bool,
}

impl PipelineKey {
    /// Key for a loaded material.
    pub fn for_material(material: &LoadedMaterial) -> Self {
        Self {
            double_sided: material.double_sided,
            blend: material.alpha_mode == AlphaMode::Blend,
        }
    }

    fn index(self) -> usize {
        (self.double_sided as usize) | ((self.blend as usize) << 1)
    }

    const ALL: [PipelineKey; 4] = [
        PipelineKey { double_sided: false, blend: false },
        PipelineKey { double_sided: true, blend: false },
        PipelineKey { double_sided: false, blend: true },
        PipelineKey { double_sided: true, blend: true },
    ];
}

/// The five material maps plus their sampler.
pub struct MaterialTextures<'a> {
    /// Base color (sRGB).
    pub base_color: &'a Texture2D,
    /// Metallic (B) / roughness (G).
    pub metallic_roughness: &'a Texture2D,
    /// Tangent-space normals.
    pub normal: &'a Texture2D,
    /// Ambient occlusion (R).
    pub occlusion: &'a Texture2D,
    /// Emissive (sRGB).
    pub emissive: &'a Texture2D,
    /// Sampler shared by all maps.
    pub sampler: &'a Sampler,
}

struct Layouts {
    camera: wgpu::BindGroupLayout,
    model: wgpu::BindGroupLayout,
    material: wgpu::BindGroupLayout,
    textures: wgpu::BindGroupLayout,
}

/// Pipelines and bind group layouts for environment-lit PBR meshes.
pub struct PbrEnvironmentMaterial {
    layouts: Option<Layouts>,
    pipelines: Vec<wgpu::RenderPipeline>,
}

impl Default for PbrEnvironmentMaterial {
    fn default() -> Self {
        Self::new()
    }
}

fn uniform_entry(visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

impl PbrEnvironmentMaterial {
    const SHADER_SOURCE: &'static str = include_str!("../shaders/pbr_environment.wgsl");

    /// Create an unbuilt material.
    pub fn new() -> Self {
        Self {
            layouts: None,
            pipelines: Vec::new(),
        }
    }

    /// Build every pipeline variant for the given target formats.
    pub fn build_pipeline(
        &mut self,
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("PBR Environment Shader"),
            source: wgpu::ShaderSource::Wgsl(Self::SHADER_SOURCE.into()),
        });

        let layouts = Layouts {
            camera: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("PBR Camera Bind Group Layout"),
                entries: &[uniform_entry(wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT)],
            }),
            model: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("PBR Model Bind Group Layout"),
                entries: &[uniform_entry(wgpu::ShaderStages::VERTEX)],
            }),
            material: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("PBR Material Bind Group Layout"),
                entries: &[uniform_entry(wgpu::ShaderStages::FRAGMENT)],
            }),
            // Material maps and the environment share one group to stay within four.
            textures: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("PBR Texture Bind Group Layout"),
                entries: &[
                    texture_entry(0),
                    texture_entry(1),
                    texture_entry(2),
                    texture_entry(3),
                    texture_entry(4),
                    sampler_entry(5),
                    texture_entry(6),
                    sampler_entry(7),
                ],
            }),
        };

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("PBR Environment Pipeline Layout"),
            bind_group_layouts: &[&layouts.camera, &layouts.model, &layouts.material, &layouts.textures],
            push_constant_ranges: &[],
        });

        self.pipelines = PipelineKey::ALL
            .iter()
            .map(|key| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("PBR Environment Pipeline"),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        buffers: &[Vertex::layout()],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: color_format,
                            blend: Some(if key.blend {
                                wgpu::BlendState::ALPHA_BLENDING
                            } else {
                                wgpu::BlendState::REPLACE
                            }),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: if key.double_sided { None } else { Some(wgpu::Face::Back) },
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: depth_format,
                        depth_write_enabled: !key.blend,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            })
            .collect();

        self.layouts = Some(layouts);
    }

    /// Pipeline for `key`, once built.
    pub fn pipeline(&self, key: PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key.index())
    }

    fn uniform_bind_group(
        device: &wgpu::Device,
        layout: Option<&wgpu::BindGroupLayout>,
        buffer: &wgpu::Buffer,
        label: &str,
    ) -> Option<wgpu::BindGroup> {
        layout.map(|layout| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        })
    }

    /// Bind a [`CameraUniform`] buffer.
    pub fn create_camera_bind_group(&self, device: &wgpu::Device, buffer: &wgpu::Buffer) -> Option<wgpu::BindGroup> {
        Self::uniform_bind_group(device, self.layouts.as_ref().map(|l| &l.camera), buffer, "PBR Camera Bind Group")
    }

    /// Bind a [`ModelUniform`] buffer.
    pub fn create_model_bind_group(&self, device: &wgpu::Device, buffer: &wgpu::Buffer) -> Option<wgpu::BindGroup> {
        Self::uniform_bind_group(device, self.layouts.as_ref().map(|l| &l.model), buffer, "PBR Model Bind Group")
    }

    /// Bind a [`MaterialUniform`] buffer.
    pub fn create_material_bind_group(&self, device: &wgpu::Device, buffer: &wgpu::Buffer) -> Option<wgpu::BindGroup> {
        Self::uniform_bind_group(device, self.layouts.as_ref().map(|l| &l.material), buffer, "PBR Material Bind Group")
    }

    /// Bind material maps together with the environment texture.
    pub fn create_texture_bind_group(
        &self,
        device: &wgpu::Device,
        maps: &MaterialTextures<'_>,
        environment: &wgpu::TextureView,
        environment_sampler: &Sampler,
    ) -> Option<wgpu::BindGroup> {
        let layout = &self.layouts.as_ref()?.textures;
        fn view(binding: u32, texture: &Texture2D) -> wgpu::BindGroupEntry<'_> {
            wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(texture.view()),
            }
        }

        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PBR Texture Bind Group"),
            layout,
            entries: &[
                view(0, maps.base_color),
                view(1, maps.metallic_roughness),
                view(2, maps.normal),
                view(3, maps.occlusion),
                view(4, maps.emissive),
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(maps.sampler.wgpu_sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::TextureView(environment),
                },
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: wgpu::BindingResource::Sampler(environment_sampler.wgpu_sampler()),
                },
            ],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_std140_friendly() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 96);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 128);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 64);
    }

    #[test]
    fn test_material_uniform_packs_factors() {
        let mut material = LoadedMaterial::new("visor");
        material.metallic = 0.25;
        material.roughness = 0.75;
        material.alpha_mode = AlphaMode::Mask;
        material.alpha_cutoff = 0.3;

        let uniform = MaterialUniform::from_loaded(&material);
        assert_eq!(uniform.factors[0], 0.25);
        assert_eq!(uniform.factors[1], 0.75);
        assert_eq!(uniform.alpha, [0.3, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pipeline_keys_cover_every_slot() {
        let mut seen: Vec<usize> = PipelineKey::ALL.iter().map(|k| k.index()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);

        let mut material = LoadedMaterial::default();
        material.double_sided = true;
        assert_eq!(PipelineKey::for_material(&material).index(), 1);
    }

    #[test]
    fn test_camera_uniform_params() {
        let uniform = CameraUniform::new(
            &Matrix4::IDENTITY,
            &Vector3::new(0.0, 0.0, 3.5),
            ToneMapping::AcesFilmic,
            1.0,
            11,
            1.0,
        );
        assert_eq!(uniform.params, [1.0, 1.0, 11.0, 1.0]);
        assert_eq!(uniform.position[2], 3.5);
    }
}
