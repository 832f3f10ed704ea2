//! Shared pieces of the post-processing passes.

/// A stage of the [`EffectComposer`](super::EffectComposer) chain.
pub trait Pass {
    /// Stable stage name.
    fn name(&self) -> &'static str;

    /// Called when the drawing buffer size changes.
    fn resize(&mut self, width: u32, height: u32);
}

/// Vertex for the fullscreen quad (position + uv).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FullscreenVertex {
    /// Clip-space position.
    pub position: [f32; 2],
    /// Texture coordinates, `v` growing downward.
    pub uv: [f32; 2],
}

impl FullscreenVertex {
    /// Vertex buffer layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
}

/// Two triangles covering the viewport.
pub const FULLSCREEN_QUAD_VERTICES: [FullscreenVertex; 6] = [
    FullscreenVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    FullscreenVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    FullscreenVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    FullscreenVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    FullscreenVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    FullscreenVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_corners_map_to_uv_corners() {
        for v in FULLSCREEN_QUAD_VERTICES {
            assert_eq!(v.uv[0], (v.position[0] + 1.0) * 0.5);
            assert_eq!(v.uv[1], (1.0 - v.position[1]) * 0.5);
        }
    }
}
