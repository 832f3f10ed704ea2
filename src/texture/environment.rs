//! Equirectangular environment maps used for image-based reflections.

use crate::core::Id;
use crate::loaders::HdrImage;
use half::f16;
use wgpu::util::DeviceExt;

/// How a texture is projected when sampled as an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureMapping {
    /// Plain UV mapping.
    #[default]
    Uv,
    /// Latitude/longitude panorama sampled by reflection direction.
    EquirectangularReflection,
}

/// A decoded HDR panorama together with its CPU-side mip chain.
///
/// Level 0 is the source image; each following level halves both axes down
/// to 1x1. Rough surfaces sample the blurrier levels.
#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    id: Id,
    mapping: TextureMapping,
    levels: Vec<HdrImage>,
}

impl EnvironmentMap {
    /// Build an equirectangular reflection map from a decoded image.
    pub fn from_hdr(image: HdrImage) -> Self {
        let mut levels = vec![image];
        loop {
            let Some(last) = levels.last() else { break };
            if last.width == 1 && last.height == 1 {
                break;
            }
            let next = last.downsample();
            levels.push(next);
        }

        Self {
            id: Id::new(),
            mapping: TextureMapping::EquirectangularReflection,
            levels,
        }
    }

    /// Unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Projection used when sampling.
    #[inline]
    pub fn mapping(&self) -> TextureMapping {
        self.mapping
    }

    /// Size of the base level.
    pub fn size(&self) -> (u32, u32) {
        let base = &self.levels[0];
        (base.width, base.height)
    }

    /// Number of mip levels, including the base.
    #[inline]
    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Mip level `level`, if present.
    pub fn level(&self, level: usize) -> Option<&HdrImage> {
        self.levels.get(level)
    }

    /// All levels packed as RGBA half floats, base level first.
    fn packed_levels(&self) -> Vec<u8> {
        let texels: usize = self.levels.iter().map(|l| (l.width * l.height) as usize).sum();
        let mut out: Vec<f16> = Vec::with_capacity(texels * 4);
        for level in &self.levels {
            for rgb in level.data.chunks_exact(3) {
                out.extend([
                    f16::from_f32(rgb[0]),
                    f16::from_f32(rgb[1]),
                    f16::from_f32(rgb[2]),
                    f16::ONE,
                ]);
            }
        }
        bytemuck::cast_slice(&out).to_vec()
    }

    /// Upload the whole chain as an `Rgba16Float` texture.
    pub fn create_texture(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::Texture {
        let (width, height) = self.size();
        device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Environment Map"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: self.mip_level_count(),
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba16Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &self.packed_levels(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_chain_reaches_one_by_one() {
        let env = EnvironmentMap::from_hdr(HdrImage::new(8, 4, vec![1.0; 8 * 4 * 3]));
        assert_eq!(env.mip_level_count(), 4);
        let last = env.level(3).unwrap();
        assert_eq!((last.width, last.height), (1, 1));
        assert_eq!(env.size(), (8, 4));
    }

    #[test]
    fn test_packed_levels_are_half_rgba() {
        let env = EnvironmentMap::from_hdr(HdrImage::new(2, 1, vec![0.5; 6]));
        // 2x1 base plus a 1x1 level, four halves per texel.
        assert_eq!(env.packed_levels().len(), 3 * 4 * 2);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = EnvironmentMap::from_hdr(HdrImage::new(1, 1, vec![0.0; 3]));
        let b = EnvironmentMap::from_hdr(HdrImage::new(1, 1, vec![0.0; 3]));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.mapping(), TextureMapping::EquirectangularReflection);
    }
}
