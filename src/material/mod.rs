//! Materials: shader pipelines and their uniform layouts.

mod pbr_environment;

pub use pbr_environment::{
    CameraUniform, MaterialTextures, MaterialUniform, ModelUniform, PbrEnvironmentMaterial, PipelineKey,
};
