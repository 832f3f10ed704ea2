//! Scene graph node.

use super::{ObjectType, Transform};
use crate::core::Id;
use crate::loaders::LoadedScene;
use crate::math::{Euler, Matrix4, Quaternion, Vector3};
use std::sync::{Arc, RwLock};

/// A node in the scene graph.
///
/// Model nodes carry the decoded asset they display; the renderer keys its
/// GPU buffers on the node [`Id`].
pub struct Object3D {
    id: Id,
    name: String,
    object_type: ObjectType,
    transform: Transform,
    children: Vec<Arc<RwLock<Object3D>>>,
    model: Option<Arc<LoadedScene>>,
}

impl Default for Object3D {
    fn default() -> Self {
        Self::new()
    }
}

impl Object3D {
    /// Create an empty group node.
    pub fn new() -> Self {
        Self::with_type(ObjectType::Group)
    }

    /// Create a node of a specific type.
    pub fn with_type(object_type: ObjectType) -> Self {
        Self {
            id: Id::new(),
            name: String::new(),
            object_type,
            transform: Transform::new(),
            children: Vec::new(),
            model: None,
        }
    }

    /// Create a model node displaying `scene`.
    pub fn from_model(scene: Arc<LoadedScene>) -> Self {
        let mut obj = Self::with_type(ObjectType::Model);
        obj.name = scene.name.clone();
        obj.model = Some(scene);
        obj
    }

    /// Unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Object name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the object name.
    #[inline]
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Object type.
    #[inline]
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// The decoded model, for model nodes.
    #[inline]
    pub fn model(&self) -> Option<&Arc<LoadedScene>> {
        self.model.as_ref()
    }

    /// Transform component.
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Position.
    #[inline]
    pub fn position(&self) -> &Vector3 {
        &self.transform.position
    }

    /// Set position.
    #[inline]
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.transform.set_position(x, y, z);
    }

    /// Rotation (XYZ Euler angles, radians).
    #[inline]
    pub fn rotation(&self) -> &Euler {
        &self.transform.rotation
    }

    /// Rotation as a quaternion.
    #[inline]
    pub fn quaternion(&self) -> &Quaternion {
        &self.transform.quaternion
    }

    /// Set rotation from Euler angles.
    #[inline]
    pub fn set_rotation(&mut self, x: f32, y: f32, z: f32) {
        self.transform.set_rotation(x, y, z);
    }

    /// Scale.
    #[inline]
    pub fn scale(&self) -> &Vector3 {
        &self.transform.scale
    }

    /// Set scale.
    #[inline]
    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.transform.set_scale(x, y, z);
    }

    /// World matrix as of the last update.
    #[inline]
    pub fn world_matrix(&self) -> &Matrix4 {
        self.transform.world_matrix()
    }

    /// Update this node's world matrix and then its descendants'.
    pub fn update_world_matrix(&mut self, parent: Option<&Matrix4>) {
        self.transform.update_world_matrix(parent);
        let world = *self.transform.world_matrix();
        for child in &self.children {
            if let Ok(mut child) = child.write() {
                child.update_world_matrix(Some(&world));
            }
        }
    }

    /// Children.
    #[inline]
    pub fn children(&self) -> &[Arc<RwLock<Object3D>>] {
        &self.children
    }

    /// Number of direct children.
    #[inline]
    pub fn children_count(&self) -> usize {
        self.children.len()
    }

    /// Append a child.
    pub fn add(&mut self, child: Arc<RwLock<Object3D>>) {
        self.children.push(child);
    }

    /// Visit every descendant depth-first.
    pub fn traverse<F: FnMut(&Object3D)>(&self, f: &mut F) {
        for child in &self.children {
            if let Ok(child) = child.read() {
                f(&child);
                child.traverse(f);
            }
        }
    }
}

impl std::fmt::Debug for Object3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object3D")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.object_type)
            .field("has_model", &self.model.is_some())
            .field("children", &self.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_node_takes_scene_name() {
        let node = Object3D::from_model(Arc::new(LoadedScene::new("Helmet")));
        assert_eq!(node.object_type(), ObjectType::Model);
        assert_eq!(node.name(), "Helmet");
        assert!(node.model().is_some());
    }

    #[test]
    fn test_traverse_visits_descendants() {
        let mut root = Object3D::new();
        let mut group = Object3D::new();
        group.add(Arc::new(RwLock::new(Object3D::new())));
        root.add(Arc::new(RwLock::new(group)));

        let mut visited = 0;
        root.traverse(&mut |_| visited += 1);
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_world_matrix_propagates() {
        let mut root = Object3D::new();
        root.set_position(0.0, 0.0, -1.0);
        let child = Arc::new(RwLock::new(Object3D::new()));
        root.add(child.clone());
        root.update_world_matrix(None);
        assert_eq!(child.read().unwrap().world_matrix().elements[14], -1.0);
    }
}
