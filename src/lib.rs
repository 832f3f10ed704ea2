//! # helmet-viewer
//!
//! A single-model glTF viewer for the browser, built on wgpu. The model is
//! lit only by an equirectangular HDR environment, tone mapped with ACES
//! Filmic and finished with a chromatic-aberration (RGB shift) pass. Moving
//! the pointer tilts the model toward it with a short eased tween.
//!
//! ## Layout
//!
//! - **math**, **camera**, **scene**: transforms, the perspective camera and the scene graph
//! - **loaders**: HDR and glTF decoding behind an [`loaders::AssetSource`]
//! - **texture**, **geometry**, **material**: GPU resources for the environment-lit PBR material
//! - **postprocessing**: the render pass and RGB shift pass, chained by an effect composer
//! - **animation**, **controls**: pointer-to-rotation mapping and tweening
//! - **app**: the [`app::Viewer`], asset startup and the frame driver
//!
//! ## Example
//!
//! ```
//! use helmet_viewer::prelude::*;
//!
//! let mut viewer = Viewer::new(ViewerConfig::default(), 800, 600, 1.0);
//! viewer.on_resize(1600, 900, 1.0);
//! assert_eq!(viewer.camera().aspect, 1600.0 / 900.0);
//! // No model yet: pointer input is ignored.
//! assert!(viewer.on_pointer_move(0.0, 0.0).is_none());
//! ```

#![warn(missing_docs)]

pub mod math;
pub mod core;
pub mod camera;
pub mod scene;
pub mod texture;
pub mod geometry;
pub mod material;
pub mod loaders;
pub mod animation;
pub mod controls;
pub mod postprocessing;
pub mod config;
pub mod app;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::animation::{Easing, Tween};
    pub use crate::app::{load_assets, FrameDriver, FrameTarget, StartupError, Viewer};
    pub use crate::camera::PerspectiveCamera;
    pub use crate::config::ViewerConfig;
    pub use crate::controls::{PointerTilt, TiltTarget};
    pub use crate::core::{Context, Renderer, ToneMapping};
    pub use crate::loaders::{AssetSource, GltfLoader, HdrLoader, LoadError, MemorySource};
    pub use crate::math::{Euler, Matrix4, Vector3};
    pub use crate::postprocessing::{EffectComposer, RgbShiftSettings};
    pub use crate::scene::{Object3D, Scene};
    pub use crate::texture::{EnvironmentMap, TextureMapping};
}

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = "helmet-viewer";
