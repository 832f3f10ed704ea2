//! Pointer-driven tilt of a model.

use crate::math::consts::PI;
use serde::{Deserialize, Serialize};

/// Rotation angles, in radians, for the model's X and Y axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TiltTarget {
    /// Rotation about X, driven by the vertical pointer position.
    pub x: f32,
    /// Rotation about Y, driven by the horizontal pointer position.
    pub y: f32,
}

impl TiltTarget {
    /// `[x, y]`, the layout tweened by the viewer.
    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

/// Maps pointer coordinates to a bounded rotation target.
///
/// The pointer position is normalized to `[-0.5, 0.5]` on each axis and
/// multiplied by `range`, so targets stay within `±range / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerTilt {
    /// Full angular range in radians across the viewport.
    pub range: f32,
}

impl Default for PointerTilt {
    fn default() -> Self {
        Self { range: PI * 0.09 }
    }
}

impl PointerTilt {
    /// Create with a custom range.
    pub fn new(range: f32) -> Self {
        Self { range }
    }

    /// Largest absolute angle this mapping produces for points inside the viewport.
    #[inline]
    pub fn max_angle(&self) -> f32 {
        self.range * 0.5
    }

    /// Target for a pointer at (`client_x`, `client_y`) in a `width` x `height` viewport.
    ///
    /// A degenerate viewport maps to the neutral target.
    pub fn target(&self, client_x: f32, client_y: f32, width: f32, height: f32) -> TiltTarget {
        let normalize = |v: f32, extent: f32| {
            if extent > 0.0 && v.is_finite() {
                v / extent - 0.5
            } else {
                0.0
            }
        };
        TiltTarget {
            x: normalize(client_y, height) * self.range,
            y: normalize(client_x, width) * self.range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_is_neutral() {
        let tilt = PointerTilt::default();
        assert_eq!(tilt.target(400.0, 300.0, 800.0, 600.0), TiltTarget { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_origin_gives_negative_extreme() {
        let tilt = PointerTilt::default();
        let t = tilt.target(0.0, 0.0, 800.0, 600.0);
        let expected = -PI * 0.045;
        assert!((t.x - expected).abs() < 1e-6);
        assert!((t.y - expected).abs() < 1e-6);
    }

    #[test]
    fn test_targets_stay_in_bounds() {
        let tilt = PointerTilt::default();
        let (w, h) = (1280.0, 720.0);
        for i in 0..=32 {
            for j in 0..=32 {
                let t = tilt.target(w * i as f32 / 32.0, h * j as f32 / 32.0, w, h);
                assert!(t.x.abs() <= tilt.max_angle() + 1e-6);
                assert!(t.y.abs() <= tilt.max_angle() + 1e-6);
            }
        }
    }

    #[test]
    fn test_axes_are_swapped() {
        let tilt = PointerTilt::new(1.0);
        let t = tilt.target(800.0, 300.0, 800.0, 600.0);
        assert!((t.y - 0.5).abs() < 1e-6);
        assert_eq!(t.x, 0.0);
    }

    #[test]
    fn test_zero_viewport_is_neutral() {
        let t = PointerTilt::default().target(10.0, 10.0, 0.0, 0.0);
        assert_eq!(t, TiltTarget::default());
    }
}
