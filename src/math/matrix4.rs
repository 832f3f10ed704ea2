//! 4x4 Matrix implementation.

use super::{Quaternion, Vector3};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A 4x4 matrix stored in column-major order, ready for WGSL `mat4x4<f32>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Matrix4 {
    /// Matrix elements in column-major order.
    pub elements: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        elements: [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Compose a transformation matrix from position, quaternion, and scale.
    pub fn compose(position: &Vector3, quaternion: &Quaternion, scale: &Vector3) -> Self {
        let q = quaternion;
        let (x2, y2, z2) = (q.x + q.x, q.y + q.y, q.z + q.z);
        let (xx, xy, xz) = (q.x * x2, q.x * y2, q.x * z2);
        let (yy, yz, zz) = (q.y * y2, q.y * z2, q.z * z2);
        let (wx, wy, wz) = (q.w * x2, q.w * y2, q.w * z2);

        Self {
            elements: [
                (1.0 - (yy + zz)) * scale.x,
                (xy + wz) * scale.x,
                (xz - wy) * scale.x,
                0.0,
                (xy - wz) * scale.y,
                (1.0 - (xx + zz)) * scale.y,
                (yz + wx) * scale.y,
                0.0,
                (xz + wy) * scale.z,
                (yz - wx) * scale.z,
                (1.0 - (xx + yy)) * scale.z,
                0.0,
                position.x,
                position.y,
                position.z,
                1.0,
            ],
        }
    }

    /// Right-handed view matrix looking from `eye` towards `target`.
    pub fn look_at(eye: &Vector3, target: &Vector3, up: &Vector3) -> Self {
        let f = (*target - *eye).normalized();
        let r = f.cross(up).normalized();
        let u = r.cross(&f);

        Self {
            elements: [
                r.x, u.x, -f.x, 0.0,
                r.y, u.y, -f.y, 0.0,
                r.z, u.z, -f.z, 0.0,
                -r.dot(eye), -u.dot(eye), f.dot(eye), 1.0,
            ],
        }
    }

    /// Perspective projection with wgpu's 0..1 depth range.
    ///
    /// `fov_y` is the vertical field of view in radians.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y / 2.0).tan();

        Self {
            elements: [
                f / aspect, 0.0, 0.0, 0.0,
                0.0, f, 0.0, 0.0,
                0.0, 0.0, far / (near - far), -1.0,
                0.0, 0.0, (near * far) / (near - far), 0.0,
            ],
        }
    }

    /// Matrix product `self * other`.
    pub fn multiply(&self, other: &Matrix4) -> Self {
        let a = &self.elements;
        let b = &other.elements;
        let mut out = [0.0f32; 16];

        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
            }
        }

        Self { elements: out }
    }

    /// Inverse matrix.
    pub fn inverse(&self) -> Self {
        glam::Mat4::from(*self).inverse().into()
    }

    /// Inverse-transpose, used to transform normals.
    pub fn normal_matrix(&self) -> Self {
        glam::Mat4::from(*self).inverse().transpose().into()
    }

    /// Transform a point (w = 1) and divide by w.
    pub fn transform_point(&self, v: &Vector3) -> Vector3 {
        glam::Mat4::from(*self).project_point3((*v).into()).into()
    }

    /// Column-major 2D array, the layout WGSL expects.
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        let e = &self.elements;
        [
            [e[0], e[1], e[2], e[3]],
            [e[4], e[5], e[6], e[7]],
            [e[8], e[9], e[10], e[11]],
            [e[12], e[13], e[14], e[15]],
        ]
    }

    /// Approximate equality within `epsilon` per element.
    pub fn approx_eq(&self, other: &Matrix4, epsilon: f32) -> bool {
        self.elements
            .iter()
            .zip(other.elements.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl std::ops::Mul for Matrix4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}

impl From<glam::Mat4> for Matrix4 {
    fn from(m: glam::Mat4) -> Self {
        Self {
            elements: m.to_cols_array(),
        }
    }
}

impl From<Matrix4> for glam::Mat4 {
    fn from(m: Matrix4) -> Self {
        glam::Mat4::from_cols_array(&m.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Euler;

    #[test]
    fn test_compose_matches_glam() {
        let position = Vector3::new(1.0, -2.0, 3.0);
        let rotation = Quaternion::from_euler(&Euler::new(0.2, 0.4, -0.1));
        let scale = Vector3::new(2.0, 2.0, 0.5);

        let ours = Matrix4::compose(&position, &rotation, &scale);
        let theirs: Matrix4 = glam::Mat4::from_scale_rotation_translation(
            scale.into(),
            rotation.into(),
            position.into(),
        )
        .into();

        assert!(ours.approx_eq(&theirs, 1e-5));
    }

    #[test]
    fn test_multiply_matches_glam() {
        let a = Matrix4::compose(
            &Vector3::new(0.5, 0.0, 1.0),
            &Quaternion::from_euler(&Euler::new(0.0, 0.8, 0.0)),
            &Vector3::ONE,
        );
        let b = Matrix4::perspective(0.7, 1.5, 0.1, 100.0);
        let theirs: Matrix4 = (glam::Mat4::from(a) * glam::Mat4::from(b)).into();
        assert!(a.multiply(&b).approx_eq(&theirs, 1e-5));
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let eye = Vector3::new(0.0, 0.0, 3.5);
        let view = Matrix4::look_at(&eye, &Vector3::ZERO, &Vector3::UP);
        let p = view.transform_point(&eye);
        assert!(p.length() < 1e-5);
        let target = view.transform_point(&Vector3::ZERO);
        assert!((target.z + 3.5).abs() < 1e-5);
    }
}
