//! Base stage: rasterizes the scene from the camera into an offscreen target.

use crate::camera::PerspectiveCamera;
use crate::core::{Context, Id, Renderer};
use crate::geometry::interleave;
use crate::loaders::{HdrImage, LoadedMaterial, LoadedScene};
use crate::material::{
    CameraUniform, MaterialTextures, MaterialUniform, ModelUniform, PbrEnvironmentMaterial, PipelineKey,
};
use crate::math::Matrix4;
use crate::postprocessing::pass::Pass;
use crate::scene::Scene;
use crate::texture::{EnvironmentMap, Sampler, Texture2D};
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Counters for one execution of the pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Draw calls issued.
    pub draw_calls: u32,
    /// Triangles submitted.
    pub triangles: u32,
}

/// Scale applied to image-based lighting.
const ENVIRONMENT_INTENSITY: f32 = 1.0;

struct GpuEnvironment {
    /// `None` for the black placeholder used before the scene has an environment.
    id: Option<Id>,
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    mip_level_count: u32,
}

impl GpuEnvironment {
    fn upload(ctx: &Context, environment: &EnvironmentMap, id: Option<Id>) -> Self {
        let texture = environment.create_texture(&ctx.device, &ctx.queue);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            id,
            _texture: texture,
            view,
            mip_level_count: environment.mip_level_count(),
        }
    }
}

struct DefaultTextures {
    white: Texture2D,
    black: Texture2D,
    normal: Texture2D,
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material: usize,
}

struct GpuMaterial {
    key: PipelineKey,
    _uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
}

struct GpuInstance {
    mesh: usize,
    local: Matrix4,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct GpuModel {
    meshes: Vec<Option<GpuMesh>>,
    materials: Vec<GpuMaterial>,
    instances: Vec<GpuInstance>,
    _textures: HashMap<(usize, bool), Texture2D>,
}

fn pick<'a>(
    textures: &'a HashMap<(usize, bool), Texture2D>,
    index: Option<usize>,
    srgb: bool,
    fallback: &'a Texture2D,
) -> &'a Texture2D {
    index.and_then(|i| textures.get(&(i, srgb))).unwrap_or(fallback)
}

/// Draws every model node in the scene with the environment-lit PBR material.
///
/// GPU copies of models are created on first sight and keyed by node id.
/// They are dropped when the node leaves the scene or the environment changes.
pub struct RenderPass {
    material: PbrEnvironmentMaterial,
    format: Option<wgpu::TextureFormat>,
    width: u32,
    height: u32,
    camera_buffer: Option<wgpu::Buffer>,
    camera_bind_group: Option<wgpu::BindGroup>,
    material_sampler: Option<Sampler>,
    environment_sampler: Option<Sampler>,
    defaults: Option<DefaultTextures>,
    environment: Option<GpuEnvironment>,
    models: HashMap<Id, GpuModel>,
}

impl RenderPass {
    /// Create an uninitialized pass.
    pub fn new() -> Self {
        Self {
            material: PbrEnvironmentMaterial::new(),
            format: None,
            width: 1,
            height: 1,
            camera_buffer: None,
            camera_bind_group: None,
            material_sampler: None,
            environment_sampler: None,
            defaults: None,
            environment: None,
            models: HashMap::new(),
        }
    }

    /// Color format the pipelines were built for.
    pub fn format(&self) -> Option<wgpu::TextureFormat> {
        self.format
    }

    /// Size of the last resize.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of models with GPU copies.
    pub fn cached_models(&self) -> usize {
        self.models.len()
    }

    /// Build pipelines and shared resources for `format` color targets.
    pub fn init(&mut self, ctx: &Context, format: wgpu::TextureFormat) {
        let device = &ctx.device;
        self.material.build_pipeline(device, format, ctx.depth_format);

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.camera_bind_group = self.material.create_camera_bind_group(device, &camera_buffer);
        self.camera_buffer = Some(camera_buffer);

        self.material_sampler = Some(Sampler::linear(device));
        self.environment_sampler = Some(Sampler::equirectangular(device));
        self.defaults = Some(DefaultTextures {
            white: Texture2D::white(device, &ctx.queue),
            black: Texture2D::black(device, &ctx.queue),
            normal: Texture2D::default_normal(device, &ctx.queue),
        });

        // Bind groups reference the old layouts.
        self.environment = None;
        self.models.clear();
        self.format = Some(format);
    }

    fn sync_environment(&mut self, ctx: &Context, scene: &Scene) {
        let wanted = scene.environment().map(|env| env.id());
        if let Some(current) = &self.environment {
            if current.id == wanted {
                return;
            }
        }

        self.environment = Some(match scene.environment() {
            Some(env) => {
                log::info!("uploading environment {} ({} mips)", env.id(), env.mip_level_count());
                GpuEnvironment::upload(ctx, env, Some(env.id()))
            }
            None => {
                let placeholder = EnvironmentMap::from_hdr(HdrImage::new(1, 1, vec![0.0; 3]));
                GpuEnvironment::upload(ctx, &placeholder, None)
            }
        });
        self.models.clear();
    }

    fn upload_material(
        &self,
        ctx: &Context,
        material: &LoadedMaterial,
        textures: &HashMap<(usize, bool), Texture2D>,
    ) -> Option<GpuMaterial> {
        let defaults = self.defaults.as_ref()?;
        let environment = self.environment.as_ref()?;
        let sampler = self.material_sampler.as_ref()?;
        let environment_sampler = self.environment_sampler.as_ref()?;

        let uniform_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniform Buffer"),
            contents: bytemuck::cast_slice(&[MaterialUniform::from_loaded(material)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = self.material.create_material_bind_group(&ctx.device, &uniform_buffer)?;

        let maps = MaterialTextures {
            base_color: pick(textures, material.base_color_texture, true, &defaults.white),
            metallic_roughness: pick(textures, material.metallic_roughness_texture, false, &defaults.white),
            normal: pick(textures, material.normal_texture, false, &defaults.normal),
            occlusion: pick(textures, material.occlusion_texture, false, &defaults.white),
            emissive: pick(textures, material.emissive_texture, true, &defaults.black),
            sampler,
        };
        let texture_bind_group =
            self.material
                .create_texture_bind_group(&ctx.device, &maps, &environment.view, environment_sampler)?;

        Some(GpuMaterial {
            key: PipelineKey::for_material(material),
            _uniform_buffer: uniform_buffer,
            bind_group,
            texture_bind_group,
        })
    }

    fn upload_model(&self, ctx: &Context, scene: &LoadedScene) -> Option<GpuModel> {
        let device = &ctx.device;

        let mut textures = HashMap::new();
        for material in &scene.materials {
            let slots = [
                (material.base_color_texture, true),
                (material.metallic_roughness_texture, false),
                (material.normal_texture, false),
                (material.occlusion_texture, false),
                (material.emissive_texture, true),
            ];
            for (index, srgb) in slots {
                let Some(index) = index else { continue };
                if textures.contains_key(&(index, srgb)) {
                    continue;
                }
                match scene.textures.get(&index) {
                    Some(image) => {
                        let texture = Texture2D::from_loaded(device, &ctx.queue, image, srgb, Some("Material Texture"));
                        textures.insert((index, srgb), texture);
                    }
                    None => log::warn!("material '{}' references missing texture {}", material.name, index),
                }
            }
        }

        // Primitives without a material use the trailing default.
        let fallback = LoadedMaterial::default();
        let materials = scene
            .materials
            .iter()
            .chain(std::iter::once(&fallback))
            .map(|m| self.upload_material(ctx, m, &textures))
            .collect::<Option<Vec<_>>>()?;
        let default_material = materials.len() - 1;

        let meshes = scene
            .meshes
            .iter()
            .map(|mesh| {
                if mesh.geometry.indices.is_empty() || mesh.geometry.positions.is_empty() {
                    return None;
                }
                let vertices = interleave(&mesh.geometry);
                Some(GpuMesh {
                    vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh Vertex Buffer"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh Index Buffer"),
                        contents: bytemuck::cast_slice(&mesh.geometry.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: mesh.geometry.indices.len() as u32,
                    material: mesh
                        .material_index
                        .filter(|&i| i < default_material)
                        .unwrap_or(default_material),
                })
            })
            .collect::<Vec<_>>();

        let mut instances = Vec::new();
        for instance in scene.mesh_instances() {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Model Uniform Buffer"),
                size: std::mem::size_of::<ModelUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = self.material.create_model_bind_group(device, &buffer)?;
            instances.push(GpuInstance {
                mesh: instance.mesh_index,
                local: instance.transform,
                buffer,
                bind_group,
            });
        }

        Some(GpuModel {
            meshes,
            materials,
            instances,
            _textures: textures,
        })
    }

    /// Draw `scene` into `target`, clearing it first.
    ///
    /// Does nothing until [`RenderPass::init`] has run and the renderer has a depth buffer.
    pub fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        renderer: &Renderer,
        scene: &mut Scene,
        camera: &mut PerspectiveCamera,
        target: &wgpu::TextureView,
    ) -> DrawStats {
        let mut stats = DrawStats::default();
        let Some(ctx) = renderer.context() else { return stats };
        let Some(depth) = renderer.depth_view() else { return stats };
        if self.format.is_none() {
            return stats;
        }

        scene.update_world_matrices();
        self.sync_environment(ctx, scene);

        let mut objects: Vec<(Id, Arc<LoadedScene>, Matrix4)> = Vec::new();
        scene.traverse(|object| {
            if let Some(model) = object.model() {
                objects.push((object.id(), Arc::clone(model), *object.world_matrix()));
            }
        });

        self.models.retain(|id, _| objects.iter().any(|(o, _, _)| o == id));
        for (id, model, _) in &objects {
            if self.models.contains_key(id) {
                continue;
            }
            match self.upload_model(ctx, model) {
                Some(gpu) => {
                    log::info!(
                        "uploaded model '{}': {} meshes, {} triangles",
                        model.name,
                        model.meshes.len(),
                        model.total_triangles()
                    );
                    self.models.insert(*id, gpu);
                }
                None => log::warn!("model '{}' could not be uploaded", model.name),
            }
        }

        let Some(camera_buffer) = self.camera_buffer.as_ref() else { return stats };
        let Some(camera_bind_group) = self.camera_bind_group.as_ref() else { return stats };
        let mip_count = self.environment.as_ref().map_or(1, |e| e.mip_level_count);
        let view_projection = *camera.view_projection_matrix();
        let camera_uniform = CameraUniform::new(
            &view_projection,
            &camera.position,
            renderer.tone_mapping(),
            renderer.tone_mapping_exposure(),
            mip_count,
            ENVIRONMENT_INTENSITY,
        );
        ctx.queue.write_buffer(camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));

        for (id, _, world) in &objects {
            let Some(gpu) = self.models.get(id) else { continue };
            for instance in &gpu.instances {
                let uniform = ModelUniform::from_world(&world.multiply(&instance.local));
                ctx.queue.write_buffer(&instance.buffer, 0, bytemuck::cast_slice(&[uniform]));
            }
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(renderer.clear_color()),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_bind_group(0, camera_bind_group, &[]);

        // Opaque first, then blended.
        for blend in [false, true] {
            for (id, _, _) in &objects {
                let Some(gpu) = self.models.get(id) else { continue };
                for instance in &gpu.instances {
                    let Some(mesh) = gpu.meshes.get(instance.mesh).and_then(Option::as_ref) else { continue };
                    let Some(material) = gpu.materials.get(mesh.material) else { continue };
                    if material.key.blend != blend {
                        continue;
                    }
                    let Some(pipeline) = self.material.pipeline(material.key) else { continue };

                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(1, &instance.bind_group, &[]);
                    pass.set_bind_group(2, &material.bind_group, &[]);
                    pass.set_bind_group(3, &material.texture_bind_group, &[]);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);

                    stats.draw_calls += 1;
                    stats.triangles += mesh.index_count / 3;
                }
            }
        }

        stats
    }
}

impl Default for RenderPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for RenderPass {
    fn name(&self) -> &'static str {
        "render"
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_pass_is_inert() {
        let pass = RenderPass::new();
        assert_eq!(pass.name(), "render");
        assert!(pass.format().is_none());
        assert_eq!(pass.cached_models(), 0);
    }
}
