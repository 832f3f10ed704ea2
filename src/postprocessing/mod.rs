//! Post-processing: a fixed render-then-shift chain.
//!
//! The scene is rasterized into an offscreen target by [`RenderPass`], then
//! [`RgbShiftPass`] writes the chromatic-aberration result to the surface.

mod pass;
mod effect_composer;
pub mod effects;

pub use pass::{FullscreenVertex, Pass, FULLSCREEN_QUAD_VERTICES};
pub use effect_composer::{EffectComposer, RenderTarget};
pub use effects::{DrawStats, RenderPass, RgbShiftPass, RgbShiftSettings};
