//! Tweened animation of scalar and vector values.

mod easing;
mod tween;

pub use easing::Easing;
pub use tween::{Interpolate, Tween};
