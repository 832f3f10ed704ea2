//! Euler angles.

use serde::{Deserialize, Serialize};

/// Rotation expressed as intrinsic X, then Y, then Z angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Euler {
    /// Rotation around X axis in radians.
    pub x: f32,
    /// Rotation around Y axis in radians.
    pub y: f32,
    /// Rotation around Z axis in radians.
    pub z: f32,
}

impl Euler {
    /// Zero rotation.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create new Euler angles.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}
