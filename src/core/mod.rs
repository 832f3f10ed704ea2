//! # Core Module
//!
//! wgpu context management, the renderer that owns the drawing surface,
//! and timing utilities.

mod context;
mod renderer;
mod clock;
mod id;

pub use context::{Context, ContextError};
pub use renderer::{RenderInfo, Renderer};
pub use clock::Clock;
pub use id::Id;

use serde::{Deserialize, Serialize};

/// Tone mapping operator applied when shading into the output target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    /// Linear output, clamped by the target format.
    None,
    /// ACES filmic curve.
    #[default]
    AcesFilmic,
}

impl ToneMapping {
    /// Value passed to shaders.
    pub fn shader_mode(self) -> u32 {
        match self {
            ToneMapping::None => 0,
            ToneMapping::AcesFilmic => 1,
        }
    }
}

/// GPU-level render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Backends to try when creating the instance.
    pub backends: wgpu::Backends,
    /// Transparent drawing surface (premultiplied alpha when supported).
    pub alpha: bool,
    /// Power preference for GPU selection.
    pub power_preference: wgpu::PowerPreference,
    /// Present mode (vsync).
    pub present_mode: wgpu::PresentMode,
    /// Tone mapping operator.
    pub tone_mapping: ToneMapping,
    /// Exposure applied before tone mapping.
    pub tone_mapping_exposure: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            alpha: true,
            power_preference: wgpu::PowerPreference::HighPerformance,
            present_mode: wgpu::PresentMode::AutoVsync,
            tone_mapping: ToneMapping::AcesFilmic,
            tone_mapping_exposure: 1.0,
        }
    }
}
