//! # Math Module
//!
//! The small slice of 3D math the viewer needs: vectors, quaternions,
//! XYZ Euler angles and column-major 4x4 matrices.
//!
//! Types are `#[repr(C)]` and `Pod` so they can be written straight into
//! uniform buffers. Heavier operations (inversion) are delegated to `glam`.

mod vector3;
mod quaternion;
mod euler;
mod matrix4;

pub use vector3::Vector3;
pub use quaternion::Quaternion;
pub use euler::Euler;
pub use matrix4::Matrix4;

/// Common math constants.
pub mod consts {
    /// Pi constant.
    pub const PI: f32 = std::f32::consts::PI;
}
