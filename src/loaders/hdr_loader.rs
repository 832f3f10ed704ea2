//! Radiance HDR loader for equirectangular environment maps.

use super::{AssetSource, LoadError, LoadProgress};
use crate::texture::EnvironmentMap;
use std::f32::consts::PI;

/// Floating-point RGB image.
#[derive(Debug, Clone)]
pub struct HdrImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Linear RGB data, 3 floats per pixel, row-major from the top.
    pub data: Vec<f32>,
}

impl HdrImage {
    /// Wrap raw RGB float data. `data` must hold `width * height * 3` values.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self { width, height, data }
    }

    /// Decode an HDR image; the format is sniffed from the bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::ImageReader::new(std::io::Cursor::new(bytes))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .decode()?;

        let rgb = img.into_rgb32f();
        let (width, height) = rgb.dimensions();
        Ok(Self::new(width, height, rgb.into_raw()))
    }

    /// Pixel at integer coordinates.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let idx = ((y * self.width + x) * 3) as usize;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Half-resolution copy using a 2x2 box filter. Odd edges are clamped.
    pub fn downsample(&self) -> Self {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut data = Vec::with_capacity((width * height * 3) as usize);

        for y in 0..height {
            for x in 0..width {
                let xs = [(2 * x).min(self.width - 1), (2 * x + 1).min(self.width - 1)];
                let ys = [(2 * y).min(self.height - 1), (2 * y + 1).min(self.height - 1)];
                let mut sum = [0.0f32; 3];
                for &sy in &ys {
                    for &sx in &xs {
                        let p = self.pixel(sx, sy);
                        sum[0] += p[0];
                        sum[1] += p[1];
                        sum[2] += p[2];
                    }
                }
                data.extend(sum.iter().map(|c| c * 0.25));
            }
        }

        Self::new(width, height, data)
    }
}

/// Equirectangular UV for a unit direction, matching the shader's lookup.
///
/// `u` wraps around +Y starting at -X; `v = 0` is straight up.
pub fn direction_to_equirect(dir: [f32; 3]) -> (f32, f32) {
    let u = dir[2].atan2(dir[0]) / (2.0 * PI) + 0.5;
    let v = 0.5 - dir[1].clamp(-1.0, 1.0).asin() / PI;
    (u, v)
}

/// Loads `.hdr` panoramas into [`EnvironmentMap`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct HdrLoader;

impl HdrLoader {
    /// Create a loader.
    pub fn new() -> Self {
        Self
    }

    /// Fetch and decode `url`, marking the result as an equirectangular reflection map.
    pub async fn load<S: AssetSource>(
        &self,
        source: &S,
        url: &str,
        on_progress: &mut dyn FnMut(&LoadProgress),
    ) -> Result<EnvironmentMap, LoadError> {
        let bytes = source.fetch(url, on_progress).await?;
        let image = HdrImage::from_bytes(&bytes).map_err(|e| LoadError::decode(url, e))?;
        log::info!("decoded environment {} ({}x{})", url, image.width, image.height);
        Ok(EnvironmentMap::from_hdr(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::MemorySource;
    use crate::loaders::fixtures::encode_hdr;
    use crate::texture::TextureMapping;

    #[test]
    fn test_decode_radiance_bytes() {
        let image = HdrImage::from_bytes(&encode_hdr(8, 4, 2.0)).unwrap();
        assert_eq!((image.width, image.height), (8, 4));
        let p = image.pixel(3, 2);
        assert!((p[0] - 2.0).abs() < 0.05);
        assert!((p[1] - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(HdrImage::from_bytes(b"definitely not an image").is_err());
    }

    #[test]
    fn test_downsample_averages() {
        let image = HdrImage::new(2, 2, vec![0.0, 0.0, 0.0, 4.0, 4.0, 4.0, 0.0, 0.0, 0.0, 4.0, 4.0, 4.0]);
        let half = image.downsample();
        assert_eq!((half.width, half.height), (1, 1));
        assert_eq!(half.pixel(0, 0), [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_equirect_poles_and_horizon() {
        let (_, v_up) = direction_to_equirect([0.0, 1.0, 0.0]);
        let (_, v_down) = direction_to_equirect([0.0, -1.0, 0.0]);
        let (u, v) = direction_to_equirect([1.0, 0.0, 0.0]);
        assert!(v_up.abs() < 1e-6);
        assert!((v_down - 1.0).abs() < 1e-6);
        assert!((u - 0.5).abs() < 1e-6 && (v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_loader_marks_mapping() {
        let source = MemorySource::new().with("env.hdr", encode_hdr(4, 2, 1.0));
        let env = pollster::block_on(HdrLoader::new().load(&source, "env.hdr", &mut |_| {})).unwrap();
        assert_eq!(env.mapping(), TextureMapping::EquirectangularReflection);
        assert_eq!(env.size(), (4, 2));
    }

    #[test]
    fn test_loader_reports_decode_error_with_url() {
        let source = MemorySource::new().with("env.hdr", b"nope".to_vec());
        let err = pollster::block_on(HdrLoader::new().load(&source, "env.hdr", &mut |_| {})).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
        assert_eq!(err.url(), "env.hdr");
    }
}
