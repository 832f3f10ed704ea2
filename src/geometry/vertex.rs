//! Vertex layout shared by the mesh pipeline.

use crate::loaders::LoadedGeometry;
use bytemuck::{Pod, Zeroable};

/// Interleaved vertex with position, normal and UV.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// Position in local space.
    pub position: [f32; 3],
    /// Normal vector.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
}

impl Vertex {
    /// Create a vertex.
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv }
    }

    /// Vertex buffer layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];
}

/// Interleave the attribute streams of a loaded primitive.
///
/// Missing normals or UVs are filled with zeros.
pub fn interleave(geometry: &LoadedGeometry) -> Vec<Vertex> {
    geometry
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let normal = geometry.normals.get(i).copied().unwrap_or([0.0; 3]);
            let uv = geometry.uvs.get(i).copied().unwrap_or([0.0; 2]);
            Vertex::new(position, normal, uv)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_matches_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::layout().array_stride, 32);
        assert_eq!(Vertex::ATTRIBUTES[2].offset, 24);
    }

    #[test]
    fn test_interleave_fills_missing_streams() {
        let geometry = LoadedGeometry {
            positions: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            normals: vec![[0.0, 0.0, 1.0]],
            uvs: Vec::new(),
            indices: vec![0, 1, 0],
        };
        let vertices = interleave(&geometry);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[1].normal, [0.0; 3]);
        assert_eq!(vertices[1].uv, [0.0; 2]);
    }
}
