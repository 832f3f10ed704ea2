//! Asset loaders for the environment map and the glTF model.

mod loader;
mod loading_manager;
mod source;
mod hdr_loader;
mod gltf_loader;

#[cfg(test)]
pub(crate) mod fixtures;

pub use loader::*;
pub use loading_manager::LoadingManager;
pub use source::{decode_data_uri, resolve_uri, AssetSource, MemorySource};
pub use hdr_loader::{direction_to_equirect, HdrImage, HdrLoader};
pub use gltf_loader::GltfLoader;
