//! 2D material textures.

use crate::core::Id;
use crate::loaders::LoadedTexture;
use wgpu::util::DeviceExt;

/// An RGBA8 texture on the GPU.
pub struct Texture2D {
    id: Id,
    width: u32,
    height: u32,
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
}

impl Texture2D {
    /// Upload tightly packed RGBA8 pixels.
    ///
    /// Color data (base color, emissive) must be uploaded with `srgb` set so
    /// the sampler returns linear values; data maps (normals, roughness) must not.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        width: u32,
        height: u32,
        srgb: bool,
        label: Option<&str>,
    ) -> Self {
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label,
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            id: Id::new(),
            width,
            height,
            _texture: texture,
            view,
            format,
        }
    }

    /// Upload a decoded glTF image.
    pub fn from_loaded(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &LoadedTexture,
        srgb: bool,
        label: Option<&str>,
    ) -> Self {
        Self::from_rgba8(device, queue, &image.data, image.width, image.height, srgb, label)
    }

    /// 1x1 texture of a single color.
    pub fn from_color(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], srgb: bool) -> Self {
        Self::from_rgba8(device, queue, &rgba, 1, 1, srgb, Some("Solid Color Texture"))
    }

    /// 1x1 white, the neutral value for every multiplicative map.
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_color(device, queue, [255, 255, 255, 255], false)
    }

    /// 1x1 black, the neutral emissive map.
    pub fn black(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_color(device, queue, [0, 0, 0, 255], true)
    }

    /// 1x1 flat tangent-space normal.
    pub fn default_normal(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_rgba8(device, queue, &[128, 128, 255, 255], 1, 1, false, Some("Default Normal Map"))
    }

    /// Unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texture format.
    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Default view.
    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
