//! Transform component for scene objects.

use crate::math::{Euler, Matrix4, Quaternion, Vector3};

/// Position, rotation and scale with cached local and world matrices.
#[derive(Debug, Clone)]
pub struct Transform {
    /// Local position.
    pub position: Vector3,
    /// Local rotation as Euler angles.
    pub rotation: Euler,
    /// Local rotation as quaternion, kept in sync with `rotation`.
    pub quaternion: Quaternion,
    /// Local scale.
    pub scale: Vector3,
    local_matrix: Matrix4,
    world_matrix: Matrix4,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Identity transform.
    pub fn new() -> Self {
        Self {
            position: Vector3::ZERO,
            rotation: Euler::ZERO,
            quaternion: Quaternion::IDENTITY,
            scale: Vector3::ONE,
            local_matrix: Matrix4::IDENTITY,
            world_matrix: Matrix4::IDENTITY,
            dirty: false,
        }
    }

    /// Set position.
    #[inline]
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position.set(x, y, z);
        self.dirty = true;
    }

    /// Set rotation from Euler angles in radians.
    #[inline]
    pub fn set_rotation(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Euler::new(x, y, z);
        self.quaternion = Quaternion::from_euler(&self.rotation);
        self.dirty = true;
    }

    /// Set scale.
    #[inline]
    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.scale.set(x, y, z);
        self.dirty = true;
    }

    /// Whether the local matrix is stale.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Local matrix, recomputed if stale.
    pub fn local_matrix(&mut self) -> &Matrix4 {
        if self.dirty {
            self.update_local_matrix();
        }
        &self.local_matrix
    }

    /// Recompose the local matrix.
    pub fn update_local_matrix(&mut self) {
        self.local_matrix = Matrix4::compose(&self.position, &self.quaternion, &self.scale);
        self.dirty = false;
    }

    /// Recompute the world matrix from an optional parent world matrix.
    pub fn update_world_matrix(&mut self, parent: Option<&Matrix4>) {
        if self.dirty {
            self.update_local_matrix();
        }
        self.world_matrix = match parent {
            Some(parent) => parent.multiply(&self.local_matrix),
            None => self.local_matrix,
        };
    }

    /// World matrix as of the last [`Self::update_world_matrix`].
    #[inline]
    pub fn world_matrix(&self) -> &Matrix4 {
        &self.world_matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transform() {
        let t = Transform::new();
        assert_eq!(t.position, Vector3::ZERO);
        assert_eq!(t.scale, Vector3::ONE);
        assert_eq!(*t.world_matrix(), Matrix4::IDENTITY);
    }

    #[test]
    fn test_translation() {
        let mut t = Transform::new();
        t.set_position(1.0, 2.0, 3.0);
        assert!(t.is_dirty());
        let m = *t.local_matrix();
        assert_eq!(&m.elements[12..15], &[1.0, 2.0, 3.0]);
        assert!(!t.is_dirty());
    }

    #[test]
    fn test_rotation_keeps_quaternion_in_sync() {
        let mut t = Transform::new();
        t.set_rotation(0.1, -0.2, 0.0);
        assert_eq!(t.quaternion, Quaternion::from_euler(&Euler::new(0.1, -0.2, 0.0)));
    }

    #[test]
    fn test_world_matrix_applies_parent() {
        let mut parent = Transform::new();
        parent.set_position(0.0, 1.0, 0.0);
        parent.update_world_matrix(None);

        let mut child = Transform::new();
        child.set_position(2.0, 0.0, 0.0);
        child.update_world_matrix(Some(parent.world_matrix()));

        assert_eq!(&child.world_matrix().elements[12..15], &[2.0, 1.0, 0.0]);
    }
}
