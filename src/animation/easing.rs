//! Easing curves for tweens.

use serde::{Deserialize, Serialize};

/// Maps normalized time in `[0, 1]` to eased progress.
///
/// Serialized names follow the `powerN` convention used by web tween
/// libraries, so `"power1.out"` is a quadratic ease-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    /// Constant speed.
    #[serde(rename = "none", alias = "linear")]
    Linear,
    /// Quadratic ease in.
    #[serde(rename = "power1.in")]
    QuadIn,
    /// Quadratic ease out.
    #[default]
    #[serde(rename = "power1.out")]
    QuadOut,
    /// Quadratic ease in/out.
    #[serde(rename = "power1.inOut")]
    QuadInOut,
    /// Cubic ease in.
    #[serde(rename = "power2.in")]
    CubicIn,
    /// Cubic ease out.
    #[serde(rename = "power2.out")]
    CubicOut,
    /// Cubic ease in/out.
    #[serde(rename = "power2.inOut")]
    CubicInOut,
}

impl Easing {
    /// Eased progress for `t`, clamped to `[0, 1]`.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_fixed() {
        for easing in [
            Easing::Linear,
            Easing::QuadIn,
            Easing::QuadOut,
            Easing::QuadInOut,
            Easing::CubicIn,
            Easing::CubicOut,
            Easing::CubicInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?}");
        }
    }

    #[test]
    fn test_quad_out_front_loads_motion() {
        assert_eq!(Easing::QuadOut.apply(0.5), 0.75);
        assert_eq!(Easing::QuadOut.apply(2.0), 1.0);
    }

    #[test]
    fn test_serde_names() {
        let easing: Easing = serde_json::from_str("\"power1.out\"").unwrap();
        assert_eq!(easing, Easing::QuadOut);
        let easing: Easing = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(easing, Easing::Linear);
        assert_eq!(serde_json::to_string(&Easing::CubicIn).unwrap(), "\"power2.in\"");
    }
}
