//! GPU vertex data.

mod vertex;

pub use vertex::{interleave, Vertex};
