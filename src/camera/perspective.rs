//! Perspective camera.

use crate::core::Id;
use crate::math::{Matrix4, Vector3};

/// A perspective projection camera looking at a target point.
///
/// Changing projection parameters marks the matrices stale; they are
/// recomputed by [`PerspectiveCamera::update_projection_matrix`] or lazily by
/// the matrix accessors.
pub struct PerspectiveCamera {
    id: Id,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Camera position.
    pub position: Vector3,
    /// Look-at point.
    pub target: Vector3,
    /// Up vector.
    pub up: Vector3,
    view_matrix: Matrix4,
    projection_matrix: Matrix4,
    view_projection_matrix: Matrix4,
    needs_update: bool,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(40.0, 1.0, 0.1, 1000.0)
    }
}

impl PerspectiveCamera {
    /// Create a camera at `z = 5` looking at the origin.
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            id: Id::new(),
            fov,
            aspect,
            near,
            far,
            position: Vector3::new(0.0, 0.0, 5.0),
            target: Vector3::ZERO,
            up: Vector3::UP,
            view_matrix: Matrix4::IDENTITY,
            projection_matrix: Matrix4::IDENTITY,
            view_projection_matrix: Matrix4::IDENTITY,
            needs_update: true,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Move the camera.
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.needs_update = true;
    }

    /// Point the camera at `target`.
    pub fn look_at(&mut self, target: Vector3) {
        self.target = target;
        self.needs_update = true;
    }

    /// Set the aspect ratio. Call [`Self::update_projection_matrix`] afterwards.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.needs_update = true;
    }

    /// Whether matrices are stale.
    #[inline]
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Recompute view, projection and view-projection matrices.
    pub fn update_projection_matrix(&mut self) {
        self.view_matrix = Matrix4::look_at(&self.position, &self.target, &self.up);
        self.projection_matrix = Matrix4::perspective(self.fov.to_radians(), self.aspect, self.near, self.far);
        self.view_projection_matrix = self.projection_matrix.multiply(&self.view_matrix);
        self.needs_update = false;
    }

    /// View matrix.
    pub fn view_matrix(&mut self) -> &Matrix4 {
        if self.needs_update {
            self.update_projection_matrix();
        }
        &self.view_matrix
    }

    /// Projection matrix.
    pub fn projection_matrix(&mut self) -> &Matrix4 {
        if self.needs_update {
            self.update_projection_matrix();
        }
        &self.projection_matrix
    }

    /// Combined view-projection matrix.
    pub fn view_projection_matrix(&mut self) -> &Matrix4 {
        if self.needs_update {
            self.update_projection_matrix();
        }
        &self.view_projection_matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_aspect_marks_stale() {
        let mut camera = PerspectiveCamera::default();
        assert!(!camera.needs_update());
        camera.set_aspect(2.0);
        assert!(camera.needs_update());
        camera.update_projection_matrix();
        assert!(!camera.needs_update());
    }

    #[test]
    fn test_projection_follows_aspect() {
        let mut camera = PerspectiveCamera::new(40.0, 1.0, 0.1, 1000.0);
        let square_x = camera.projection_matrix().elements[0];
        camera.set_aspect(2.0);
        let wide_x = camera.projection_matrix().elements[0];
        assert!((square_x / wide_x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let mut camera = PerspectiveCamera::new(40.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.set_position(Vector3::new(0.0, 0.0, 3.5));
        let clip = camera.view_projection_matrix().transform_point(&Vector3::ZERO);
        assert!(clip.x.abs() < 1e-6 && clip.y.abs() < 1e-6);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }
}
