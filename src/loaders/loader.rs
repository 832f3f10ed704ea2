//! Shared loader types: progress, decoded scene data and errors.

use crate::math::{Matrix4, Quaternion, Vector3};
use std::collections::HashMap;
use thiserror::Error;

/// State of a tracked load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Not started.
    Idle,
    /// Currently loading.
    Loading,
    /// Successfully loaded.
    Loaded,
    /// Failed to load.
    Failed,
}

/// Byte-level progress of a single fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgress {
    /// URL being fetched.
    pub url: String,
    /// Bytes received so far.
    pub loaded: u64,
    /// Expected size, when the server announced one.
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Progress for `url` with `loaded` of `total` bytes received.
    pub fn new(url: impl Into<String>, loaded: u64, total: Option<u64>) -> Self {
        Self {
            url: url.into(),
            loaded,
            total,
        }
    }

    /// Completion in percent, when the total size is known.
    pub fn percentage(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.loaded as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}

/// Errors produced while fetching or decoding assets.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The request could not be made or the body could not be read.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Transport error description.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} responded with HTTP {status}")]
    Http {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The bytes arrived but could not be decoded.
    #[error("failed to decode {url}: {message}")]
    Decode {
        /// Source URL.
        url: String,
        /// Decoder error description.
        message: String,
    },

    /// The asset uses a feature this loader does not handle.
    #[error("unsupported content in {url}: {message}")]
    Unsupported {
        /// Source URL.
        url: String,
        /// What is unsupported.
        message: String,
    },
}

impl LoadError {
    /// Decode error for `url`.
    pub fn decode(url: &str, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// URL the error refers to.
    pub fn url(&self) -> &str {
        match self {
            Self::Fetch { url, .. }
            | Self::Http { url, .. }
            | Self::Decode { url, .. }
            | Self::Unsupported { url, .. } => url,
        }
    }
}

/// Triangle geometry of one glTF primitive.
#[derive(Debug, Clone, Default)]
pub struct LoadedGeometry {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals.
    pub normals: Vec<[f32; 3]>,
    /// First texture coordinate set.
    pub uvs: Vec<[f32; 2]>,
    /// Triangle-list indices.
    pub indices: Vec<u32>,
}

impl LoadedGeometry {
    /// Vertex count.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Triangle count.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Generate area-weighted vertex normals from positions and indices.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3::ZERO; self.positions.len()];

        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(pa), Some(pb), Some(pc)) =
                (self.positions.get(a), self.positions.get(b), self.positions.get(c))
            else {
                continue;
            };
            let (pa, pb, pc) = (Vector3::from_array(*pa), Vector3::from_array(*pb), Vector3::from_array(*pc));
            let n = (pb - pa).cross(&(pc - pa));
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }

        self.normals = normals.into_iter().map(|n| n.normalized().to_array()).collect();
    }
}

/// Alpha blending mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    /// Fully opaque.
    #[default]
    Opaque,
    /// Alpha mask with cutoff.
    Mask,
    /// Alpha blending.
    Blend,
}

/// Metallic-roughness material. Texture fields index [`LoadedScene::textures`].
#[derive(Debug, Clone)]
pub struct LoadedMaterial {
    /// Material name.
    pub name: String,
    /// Base color factor (linear RGBA).
    pub base_color: [f32; 4],
    /// Metallic factor.
    pub metallic: f32,
    /// Roughness factor.
    pub roughness: f32,
    /// Emissive factor (linear RGB).
    pub emissive: [f32; 3],
    /// Normal map scale.
    pub normal_scale: f32,
    /// Occlusion strength.
    pub occlusion_strength: f32,
    /// Base color texture.
    pub base_color_texture: Option<usize>,
    /// Metallic (B) / roughness (G) texture.
    pub metallic_roughness_texture: Option<usize>,
    /// Tangent-space normal map.
    pub normal_texture: Option<usize>,
    /// Ambient occlusion (R) texture.
    pub occlusion_texture: Option<usize>,
    /// Emissive texture.
    pub emissive_texture: Option<usize>,
    /// Alpha mode.
    pub alpha_mode: AlphaMode,
    /// Alpha cutoff for [`AlphaMode::Mask`].
    pub alpha_cutoff: f32,
    /// Disable back-face culling.
    pub double_sided: bool,
}

impl LoadedMaterial {
    /// Default white dielectric, matching glTF's default material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: [1.0; 4],
            metallic: 1.0,
            roughness: 1.0,
            emissive: [0.0; 3],
            normal_scale: 1.0,
            occlusion_strength: 1.0,
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
        }
    }
}

impl Default for LoadedMaterial {
    fn default() -> Self {
        Self::new("Default")
    }
}

/// A drawable primitive: geometry plus a material reference.
#[derive(Debug, Clone)]
pub struct LoadedMesh {
    /// Mesh name.
    pub name: String,
    /// Geometry data.
    pub geometry: LoadedGeometry,
    /// Index into [`LoadedScene::materials`]; `None` uses the default material.
    pub material_index: Option<usize>,
}

/// A node in the glTF hierarchy.
#[derive(Debug, Clone)]
pub struct LoadedNode {
    /// Node name.
    pub name: String,
    /// Local translation.
    pub translation: [f32; 3],
    /// Local rotation (quaternion xyzw).
    pub rotation: [f32; 4],
    /// Local scale.
    pub scale: [f32; 3],
    /// Indices into [`LoadedScene::meshes`].
    pub mesh_indices: Vec<usize>,
    /// Child node indices.
    pub children: Vec<usize>,
}

impl LoadedNode {
    /// Local transform matrix.
    pub fn local_matrix(&self) -> Matrix4 {
        Matrix4::compose(
            &Vector3::from_array(self.translation),
            &Quaternion::from_array(self.rotation),
            &Vector3::from_array(self.scale),
        )
    }
}

/// Decoded RGBA8 image.
#[derive(Debug, Clone)]
pub struct LoadedTexture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 pixels.
    pub data: Vec<u8>,
}

/// A mesh placed in model space by the node hierarchy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshInstance {
    /// Index into [`LoadedScene::meshes`].
    pub mesh_index: usize,
    /// Node-to-model transform.
    pub transform: Matrix4,
}

/// A fully decoded glTF scene.
#[derive(Debug, Clone)]
pub struct LoadedScene {
    /// Scene name.
    pub name: String,
    /// Primitives, flattened across glTF meshes.
    pub meshes: Vec<LoadedMesh>,
    /// Materials.
    pub materials: Vec<LoadedMaterial>,
    /// Nodes.
    pub nodes: Vec<LoadedNode>,
    /// Root node indices of the displayed scene.
    pub root_nodes: Vec<usize>,
    /// Decoded textures keyed by glTF texture index.
    pub textures: HashMap<usize, LoadedTexture>,
}

impl LoadedScene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
            materials: Vec::new(),
            nodes: Vec::new(),
            root_nodes: Vec::new(),
            textures: HashMap::new(),
        }
    }

    /// Total triangle count across all primitives.
    pub fn total_triangles(&self) -> usize {
        self.meshes.iter().map(|m| m.geometry.triangle_count()).sum()
    }

    /// Flatten the node hierarchy into positioned mesh instances.
    ///
    /// Nodes reachable twice (malformed files) are visited once.
    pub fn mesh_instances(&self) -> Vec<MeshInstance> {
        let mut out = Vec::new();
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, Matrix4)> = self
            .root_nodes
            .iter()
            .rev()
            .map(|&i| (i, Matrix4::IDENTITY))
            .collect();

        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else { continue };
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            let world = parent.multiply(&node.local_matrix());
            out.extend(node.mesh_indices.iter().map(|&mesh_index| MeshInstance {
                mesh_index,
                transform: world,
            }));
            stack.extend(node.children.iter().rev().map(|&c| (c, world)));
        }

        out
    }
}
