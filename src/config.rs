//! Viewer configuration.
//!
//! Every field has a default matching the stock helmet scene, so a JSON
//! override only needs the keys it changes:
//!
//! ```
//! use helmet_viewer::config::ViewerConfig;
//!
//! let config = ViewerConfig::from_json(r#"{ "post": { "amount": 0.003 } }"#).unwrap();
//! assert_eq!(config.post.amount, 0.003);
//! assert_eq!(config.camera.fov, 40.0);
//! ```

use crate::animation::Easing;
use crate::controls::PointerTilt;
use crate::core::{RenderConfig, ToneMapping};
use crate::math::consts::PI;
use crate::postprocessing::RgbShiftSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The JSON could not be parsed or had the wrong shape.
    #[error("invalid viewer config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Perspective camera settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Camera position; the camera looks at the origin.
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 40.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 0.0, 3.5],
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Transparent canvas.
    pub alpha: bool,
    /// Tone mapping operator.
    pub tone_mapping: ToneMapping,
    /// Exposure applied before tone mapping.
    pub exposure: f32,
    /// Upper bound on the device pixel ratio. `None` uses the device value unchanged.
    pub max_pixel_ratio: Option<f32>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            alpha: true,
            tone_mapping: ToneMapping::AcesFilmic,
            exposure: 1.0,
            max_pixel_ratio: None,
        }
    }
}

impl RendererConfig {
    /// GPU-level config with these output settings applied.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            alpha: self.alpha,
            tone_mapping: self.tone_mapping,
            tone_mapping_exposure: self.exposure,
            ..RenderConfig::default()
        }
    }

    /// Apply `max_pixel_ratio` to a device pixel ratio.
    pub fn effective_pixel_ratio(&self, device_pixel_ratio: f32) -> f32 {
        match self.max_pixel_ratio {
            Some(max) if max > 0.0 => device_pixel_ratio.min(max),
            _ => device_pixel_ratio,
        }
    }
}

/// Pointer rotation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Full angular range across the viewport, in radians.
    pub rotation_range: f32,
    /// Tween duration in seconds.
    pub tween_duration: f32,
    /// Tween easing.
    pub easing: Easing,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            rotation_range: PI * 0.09,
            tween_duration: 0.3,
            easing: Easing::QuadOut,
        }
    }
}

impl InputConfig {
    /// Pointer mapping for these settings.
    pub fn pointer_tilt(&self) -> PointerTilt {
        PointerTilt::new(self.rotation_range)
    }
}

/// Asset locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Equirectangular HDR environment.
    pub environment_url: String,
    /// glTF model, relative to the page.
    pub model_url: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            environment_url: "https://dl.polyhaven.org/file/ph-assets/HDRIs/hdr/1k/lilienstein_1k.hdr".into(),
            model_url: "./DamagedHelmet.gltf".into(),
        }
    }
}

/// Complete viewer configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Camera.
    pub camera: CameraConfig,
    /// Renderer output.
    pub renderer: RendererConfig,
    /// Chromatic aberration.
    pub post: RgbShiftSettings,
    /// Pointer rotation.
    pub input: InputConfig,
    /// Asset URLs.
    pub assets: AssetsConfig,
}

impl ViewerConfig {
    /// Parse a JSON object; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_scene() {
        let config = ViewerConfig::default();
        assert_eq!(config.camera.fov, 40.0);
        assert_eq!(config.camera.position, [0.0, 0.0, 3.5]);
        assert_eq!(config.post.amount, 0.0015);
        assert_eq!(config.post.angle, 0.0);
        assert_eq!(config.input.tween_duration, 0.3);
        assert_eq!(config.input.easing, Easing::QuadOut);
        assert_eq!(config.renderer.tone_mapping, ToneMapping::AcesFilmic);
        assert!(config.assets.environment_url.ends_with("lilienstein_1k.hdr"));
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(ViewerConfig::from_json("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ViewerConfig::from_json(
            r#"{
                "renderer": { "tone_mapping": "none", "max_pixel_ratio": 2.0 },
                "input": { "easing": "none" },
                "assets": { "model_url": "models/helmet.glb" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.renderer.tone_mapping, ToneMapping::None);
        assert_eq!(config.renderer.exposure, 1.0);
        assert_eq!(config.input.easing, Easing::Linear);
        assert_eq!(config.assets.model_url, "models/helmet.glb");
        assert_eq!(config.renderer.effective_pixel_ratio(3.0), 2.0);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = ViewerConfig::from_json(r#"{ "camera": { "fov": "wide" } }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid viewer config"));
    }

    #[test]
    fn test_pixel_ratio_passthrough_by_default() {
        assert_eq!(RendererConfig::default().effective_pixel_ratio(2.625), 2.625);
    }

    #[test]
    fn test_render_config_carries_output_settings() {
        let renderer = RendererConfig {
            alpha: false,
            exposure: 1.5,
            ..RendererConfig::default()
        };
        let rc = renderer.render_config();
        assert!(!rc.alpha);
        assert_eq!(rc.tone_mapping_exposure, 1.5);
    }
}
