//! Textures, samplers and environment maps.

mod environment;
mod sampler;
mod texture2d;

pub use environment::{EnvironmentMap, TextureMapping};
pub use sampler::{AddressMode, FilterMode, Sampler, SamplerDescriptor};
pub use texture2d::Texture2D;
