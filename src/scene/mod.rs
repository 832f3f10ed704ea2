//! # Scene Module
//!
//! A minimal scene graph: a root holding loaded models, each with its own
//! transform, plus the environment map used for image-based lighting.

mod object3d;
mod scene;
mod transform;

pub use object3d::Object3D;
pub use scene::{Scene, SceneError};
pub use transform::Transform;

/// Object type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Scene root.
    Scene,
    /// Group node.
    Group,
    /// Node carrying a loaded model.
    Model,
}
