//! Renderer: owns the GPU context and the drawing-buffer geometry.
//!
//! The renderer tracks a logical size (CSS pixels) and a pixel ratio. The
//! drawing buffer is `logical * pixel_ratio`, rounded. Size changes are
//! recorded immediately and applied to the surface lazily in
//! [`Renderer::prepare`], so a renderer without a bound context still keeps
//! consistent sizing state.

use super::{Context, RenderConfig, ToneMapping};

/// Render statistics for the current frame.
#[derive(Debug, Clone, Default)]
pub struct RenderInfo {
    /// Number of draw calls.
    pub draw_calls: u32,
    /// Number of triangles rendered.
    pub triangles: u32,
    /// Frames rendered so far.
    pub frame: u64,
}

impl RenderInfo {
    /// Reset per-frame counters.
    pub fn reset(&mut self) {
        self.draw_calls = 0;
        self.triangles = 0;
    }
}

struct DepthTarget {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// The renderer.
pub struct Renderer {
    config: RenderConfig,
    context: Option<Context>,
    width: u32,
    height: u32,
    pixel_ratio: f32,
    surface_dirty: bool,
    depth: Option<DepthTarget>,
    info: RenderInfo,
}

impl Renderer {
    /// Create an unbound renderer with a logical size of `width` x `height`.
    pub fn new(config: RenderConfig, width: u32, height: u32) -> Self {
        Self {
            config,
            context: None,
            width,
            height,
            pixel_ratio: 1.0,
            surface_dirty: true,
            depth: None,
            info: RenderInfo::default(),
        }
    }

    /// Attach a GPU context. The surface is reconfigured on the next frame.
    pub fn bind(&mut self, context: Context) {
        self.context = Some(context);
        self.depth = None;
        self.surface_dirty = true;
    }

    /// The bound GPU context, if any.
    #[inline]
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Render configuration.
    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Tone mapping operator.
    #[inline]
    pub fn tone_mapping(&self) -> ToneMapping {
        self.config.tone_mapping
    }

    /// Exposure applied before tone mapping.
    #[inline]
    pub fn tone_mapping_exposure(&self) -> f32 {
        self.config.tone_mapping_exposure
    }

    /// Clear color for the scene target. Transparent when alpha is enabled.
    pub fn clear_color(&self) -> wgpu::Color {
        if self.config.alpha {
            wgpu::Color::TRANSPARENT
        } else {
            wgpu::Color::BLACK
        }
    }

    /// Set the logical size in CSS pixels.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.surface_dirty = true;
    }

    /// Logical size in CSS pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Set the device pixel ratio. Non-finite or non-positive values fall back to 1.
    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            log::warn!("ignoring invalid pixel ratio {pixel_ratio}, using 1.0");
            1.0
        };
        if pixel_ratio != self.pixel_ratio {
            self.pixel_ratio = pixel_ratio;
            self.surface_dirty = true;
        }
    }

    /// Current pixel ratio.
    #[inline]
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Drawing buffer size in device pixels, never smaller than 1x1.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.pixel_ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    /// Apply pending size changes to the surface and depth buffer.
    ///
    /// Returns `false` when no context is bound.
    pub fn prepare(&mut self) -> bool {
        let (width, height) = self.drawing_buffer_size();
        let Some(ctx) = self.context.as_mut() else {
            return false;
        };

        if self.surface_dirty {
            ctx.resize(width, height);
            self.surface_dirty = false;
        }

        let stale = self
            .depth
            .as_ref()
            .map_or(true, |d| d.width != ctx.width() || d.height != ctx.height());
        if stale {
            let texture = ctx.create_depth_texture();
            self.depth = Some(DepthTarget {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                width: ctx.width(),
                height: ctx.height(),
            });
        }

        true
    }

    /// Re-apply the surface configuration after a lost or outdated surface.
    pub fn reconfigure(&mut self) {
        if let Some(ctx) = self.context.as_ref() {
            ctx.reconfigure();
        }
    }

    /// Depth buffer view, available after a successful [`Renderer::prepare`].
    #[inline]
    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|d| &d.view)
    }

    /// Render statistics.
    #[inline]
    pub fn info(&self) -> &RenderInfo {
        &self.info
    }

    /// Mutable render statistics.
    #[inline]
    pub fn info_mut(&mut self) -> &mut RenderInfo {
        &mut self.info
    }

    /// Start a new frame.
    pub fn begin_frame(&mut self) {
        self.info.reset();
        self.info.frame += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_renderer_tracks_size() {
        let mut renderer = Renderer::new(RenderConfig::default(), 800, 600);
        renderer.set_size(1600, 900);
        assert_eq!(renderer.size(), (1600, 900));
        assert!(!renderer.prepare());
    }

    #[test]
    fn test_drawing_buffer_scales_with_pixel_ratio() {
        let mut renderer = Renderer::new(RenderConfig::default(), 800, 600);
        renderer.set_pixel_ratio(2.0);
        assert_eq!(renderer.drawing_buffer_size(), (1600, 1200));
        renderer.set_pixel_ratio(1.5);
        assert_eq!(renderer.drawing_buffer_size(), (1200, 900));
    }

    #[test]
    fn test_invalid_pixel_ratio_falls_back() {
        let mut renderer = Renderer::new(RenderConfig::default(), 10, 10);
        renderer.set_pixel_ratio(f32::NAN);
        assert_eq!(renderer.pixel_ratio(), 1.0);
        renderer.set_pixel_ratio(0.0);
        assert_eq!(renderer.pixel_ratio(), 1.0);
    }

    #[test]
    fn test_zero_size_keeps_minimal_buffer() {
        let renderer = Renderer::new(RenderConfig::default(), 0, 0);
        assert_eq!(renderer.drawing_buffer_size(), (1, 1));
    }

    #[test]
    fn test_begin_frame_counts() {
        let mut renderer = Renderer::new(RenderConfig::default(), 1, 1);
        renderer.info_mut().draw_calls = 4;
        renderer.begin_frame();
        renderer.begin_frame();
        assert_eq!(renderer.info().frame, 2);
        assert_eq!(renderer.info().draw_calls, 0);
    }
}
