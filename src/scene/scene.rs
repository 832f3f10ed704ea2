//! Scene container - the root of the scene graph.

use super::{Object3D, ObjectType};
use crate::core::Id;
use crate::texture::EnvironmentMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors raised when mutating the scene.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The environment map is write-once.
    #[error("scene environment is already set to {existing}")]
    EnvironmentAlreadySet {
        /// Id of the environment that stays in place.
        existing: Id,
    },

    /// The viewer holds at most one model node.
    #[error("a model is already attached as {existing}")]
    ModelAlreadyAttached {
        /// Id of the node that stays in place.
        existing: Id,
    },
}

/// The scene: a root node plus the environment used for reflections.
///
/// Objects are only ever added; the environment can be installed once.
pub struct Scene {
    root: Object3D,
    environment: Option<Arc<EnvironmentMap>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        let mut root = Object3D::with_type(ObjectType::Scene);
        root.set_name("Scene");

        Self { root, environment: None }
    }

    /// Scene ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.root.id()
    }

    /// Environment map used for image-based lighting.
    #[inline]
    pub fn environment(&self) -> Option<&Arc<EnvironmentMap>> {
        self.environment.as_ref()
    }

    /// Install the environment map. Fails if one is already installed.
    pub fn set_environment(&mut self, environment: Arc<EnvironmentMap>) -> Result<(), SceneError> {
        if let Some(existing) = &self.environment {
            return Err(SceneError::EnvironmentAlreadySet { existing: existing.id() });
        }
        log::debug!("scene environment set to {}", environment.id());
        self.environment = Some(environment);
        Ok(())
    }

    /// Add an object to the root.
    pub fn add(&mut self, object: Arc<RwLock<Object3D>>) {
        self.root.add(object);
    }

    /// Direct children of the root.
    #[inline]
    pub fn children(&self) -> &[Arc<RwLock<Object3D>>] {
        self.root.children()
    }

    /// Number of direct children of the root.
    #[inline]
    pub fn children_count(&self) -> usize {
        self.root.children_count()
    }

    /// Number of model nodes anywhere in the graph.
    pub fn model_count(&self) -> usize {
        let mut count = 0;
        self.root.traverse(&mut |obj| {
            if obj.object_type() == ObjectType::Model {
                count += 1;
            }
        });
        count
    }

    /// Visit every object depth-first.
    pub fn traverse<F: FnMut(&Object3D)>(&self, mut f: F) {
        self.root.traverse(&mut f);
    }

    /// Refresh world matrices for the whole graph.
    pub fn update_world_matrices(&mut self) {
        self.root.update_world_matrix(None);
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id())
            .field("children", &self.children_count())
            .field("environment", &self.environment.as_ref().map(|e| e.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::{HdrImage, LoadedScene};

    fn environment() -> Arc<EnvironmentMap> {
        let image = HdrImage::new(2, 1, vec![1.0; 6]);
        Arc::new(EnvironmentMap::from_hdr(image))
    }

    #[test]
    fn test_new_scene_is_empty() {
        let scene = Scene::new();
        assert_eq!(scene.children_count(), 0);
        assert_eq!(scene.model_count(), 0);
        assert!(scene.environment().is_none());
    }

    #[test]
    fn test_environment_is_write_once() {
        let mut scene = Scene::new();
        let first = environment();
        scene.set_environment(first.clone()).unwrap();
        let err = scene.set_environment(environment()).unwrap_err();
        assert!(matches!(err, SceneError::EnvironmentAlreadySet { existing } if existing == first.id()));
        assert_eq!(scene.environment().unwrap().id(), first.id());
    }

    #[test]
    fn test_model_count() {
        let mut scene = Scene::new();
        scene.add(Arc::new(RwLock::new(Object3D::new())));
        scene.add(Arc::new(RwLock::new(Object3D::from_model(Arc::new(LoadedScene::new("m"))))));
        assert_eq!(scene.children_count(), 2);
        assert_eq!(scene.model_count(), 1);
    }
}
