//! The effect composer: owns the offscreen target and runs both stages.

use super::effects::{RenderPass, RgbShiftPass, RgbShiftSettings};
use super::pass::Pass;
use crate::camera::PerspectiveCamera;
use crate::core::Renderer;
use crate::scene::Scene;

/// An offscreen color texture with its view.
pub struct RenderTarget {
    /// The texture.
    pub texture: wgpu::Texture,
    /// Default view.
    pub view: wgpu::TextureView,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl RenderTarget {
    /// Create a target that can be rendered to and sampled.
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Post-Process Render Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }
}

/// Renders the scene through a fixed two-stage chain.
///
/// The chain is always `render` followed by `rgb_shift`; stages cannot be
/// added or removed. Sizes are recorded by [`EffectComposer::set_size`] and
/// GPU targets are (re)created lazily at render time, so the composer is
/// usable before a GPU context exists.
pub struct EffectComposer {
    render_pass: RenderPass,
    shift_pass: RgbShiftPass,
    target: Option<RenderTarget>,
    width: u32,
    height: u32,
}

impl EffectComposer {
    /// Create a composer with a logical size of `width` x `height`.
    pub fn new(width: u32, height: u32, shift: RgbShiftSettings) -> Self {
        let mut composer = Self {
            render_pass: RenderPass::new(),
            shift_pass: RgbShiftPass::with_settings(shift),
            target: None,
            width: 0,
            height: 0,
        };
        composer.set_size(width, height);
        composer
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> [&'static str; 2] {
        [self.render_pass.name(), self.shift_pass.name()]
    }

    /// Number of stages.
    pub fn stage_count(&self) -> usize {
        self.stage_names().len()
    }

    /// The base stage.
    pub fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }

    /// The shift stage.
    pub fn shift_pass(&self) -> &RgbShiftPass {
        &self.shift_pass
    }

    /// Record a new logical size. Both stages are notified; GPU targets follow on the next render.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.render_pass.resize(width, height);
        self.shift_pass.resize(width, height);
    }

    /// Logical size.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the offscreen target, once created.
    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.target.as_ref().map(|t| (t.width, t.height))
    }

    /// Render one frame and present it.
    ///
    /// Returns `Ok(())` without drawing when the renderer has no context.
    pub fn render(
        &mut self,
        renderer: &mut Renderer,
        scene: &mut Scene,
        camera: &mut PerspectiveCamera,
    ) -> Result<(), wgpu::SurfaceError> {
        if !renderer.prepare() {
            return Ok(());
        }
        renderer.begin_frame();

        let stats = {
            let Some(ctx) = renderer.context() else { return Ok(()) };
            let format = ctx.surface_format;

            if self.render_pass.format() != Some(format) {
                self.render_pass.init(ctx, format);
            }
            if self.shift_pass.format() != Some(format) {
                self.shift_pass.init(&ctx.device, format);
            }

            let (width, height) = (ctx.width(), ctx.height());
            let stale = self
                .target
                .as_ref()
                .map_or(true, |t| t.width != width || t.height != height || t.texture.format() != format);
            if stale {
                log::debug!("recreating composer target at {width}x{height}");
                self.target = Some(RenderTarget::new(&ctx.device, width, height, format));
            }
            let Some(target) = self.target.as_ref() else { return Ok(()) };

            let frame = ctx.get_current_texture()?;
            let output = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

            let mut encoder = ctx.create_command_encoder();
            let stats = self.render_pass.render(&mut encoder, renderer, scene, camera, &target.view);
            self.shift_pass.render(&mut encoder, &target.view, &output, &ctx.device, &ctx.queue);
            ctx.submit(std::iter::once(encoder.finish()));
            frame.present();
            stats
        };

        let info = renderer.info_mut();
        info.draw_calls = stats.draw_calls;
        info.triangles = stats.triangles;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RenderConfig;

    #[test]
    fn test_chain_is_render_then_shift() {
        let composer = EffectComposer::new(800, 600, RgbShiftSettings::default());
        assert_eq!(composer.stage_names(), ["render", "rgb_shift"]);
        assert_eq!(composer.stage_count(), 2);
    }

    #[test]
    fn test_set_size_reaches_stages() {
        let mut composer = EffectComposer::new(800, 600, RgbShiftSettings::default());
        composer.set_size(1600, 900);
        assert_eq!(composer.size(), (1600, 900));
        assert_eq!(composer.render_pass().size(), (1600, 900));
        assert_eq!(composer.shift_pass().size(), (1600, 900));
        assert!(composer.target_size().is_none());
    }

    #[test]
    fn test_render_without_context_is_noop() {
        let mut composer = EffectComposer::new(320, 240, RgbShiftSettings::default());
        let mut renderer = Renderer::new(RenderConfig::default(), 320, 240);
        let mut scene = Scene::new();
        let mut camera = PerspectiveCamera::default();
        assert!(composer.render(&mut renderer, &mut scene, &mut camera).is_ok());
        assert_eq!(renderer.info().frame, 0);
        assert!(composer.target_size().is_none());
    }
}
