//! glTF 2.0 loader (`.gltf` with external or embedded buffers, and `.glb`).

use super::source::{decode_data_uri, resolve_uri};
use super::{
    AlphaMode, AssetSource, LoadError, LoadProgress, LoadedGeometry, LoadedMaterial, LoadedMesh, LoadedNode,
    LoadedScene, LoadedTexture,
};
use std::collections::HashMap;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// glTF loader.
///
/// The document is fetched through an [`AssetSource`]; buffers and images it
/// references by relative URI are fetched from the same source.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfLoader;

impl GltfLoader {
    /// Create a loader.
    pub fn new() -> Self {
        Self
    }

    /// Fetch and decode the glTF document at `url`.
    ///
    /// `on_progress` sees the byte progress of the document itself.
    pub async fn load<S: AssetSource>(
        &self,
        source: &S,
        url: &str,
        on_progress: &mut dyn FnMut(&LoadProgress),
    ) -> Result<LoadedScene, LoadError> {
        let bytes = source.fetch(url, on_progress).await?;
        let gltf = parse_document(url, &bytes)?;

        let buffers = load_buffers(&gltf, url, source).await?;
        let images = load_images(&gltf, &buffers, url, source).await;

        let scene = build_scene(&gltf, &buffers, &images, scene_name(&gltf, url))
            .map_err(|message| LoadError::Unsupported { url: url.to_string(), message })?;

        log::info!(
            "decoded {}: {} primitives, {} triangles, {} textures",
            url,
            scene.meshes.len(),
            scene.total_triangles(),
            scene.textures.len()
        );
        Ok(scene)
    }
}

/// Parse the document, retrying without `extensionsRequired` when validation rejects it.
fn parse_document(url: &str, bytes: &[u8]) -> Result<gltf::Gltf, LoadError> {
    match gltf::Gltf::from_slice(bytes) {
        Ok(gltf) => Ok(gltf),
        Err(first) => {
            let Some(relaxed) = strip_required_extensions(bytes) else {
                return Err(LoadError::decode(url, first));
            };
            log::warn!("{url}: ignoring extensionsRequired ({first})");
            gltf::Gltf::from_slice(&relaxed).map_err(|e| LoadError::decode(url, e))
        }
    }
}

/// Remove `extensionsRequired` from a glTF or GLB payload.
///
/// Returns `None` when there is nothing to strip or the payload is not parseable JSON.
fn strip_required_extensions(data: &[u8]) -> Option<Vec<u8>> {
    if data.starts_with(GLB_MAGIC) {
        let (json, bin) = split_glb(data)?;
        let json = strip_json(json)?;
        Some(join_glb(&json, bin))
    } else {
        strip_json(data)
    }
}

fn strip_json(json: &[u8]) -> Option<Vec<u8>> {
    let mut value: serde_json::Value = serde_json::from_slice(json).ok()?;
    value.as_object_mut()?.remove("extensionsRequired")?;
    serde_json::to_vec(&value).ok()
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Split a GLB container into its JSON chunk and optional BIN chunk.
fn split_glb(data: &[u8]) -> Option<(&[u8], Option<&[u8]>)> {
    let json_len = read_u32(data, 12)? as usize;
    if read_u32(data, 16)? != CHUNK_JSON {
        return None;
    }
    let json = data.get(20..20 + json_len)?;

    let bin_offset = 20 + json_len;
    let bin = match (read_u32(data, bin_offset), read_u32(data, bin_offset + 4)) {
        (Some(len), Some(CHUNK_BIN)) => data.get(bin_offset + 8..bin_offset + 8 + len as usize),
        _ => None,
    };
    Some((json, bin))
}

fn join_glb(json: &[u8], bin: Option<&[u8]>) -> Vec<u8> {
    let pad = |len: usize| (4 - len % 4) % 4;
    let json_padded = json.len() + pad(json.len());
    let bin_padded = bin.map(|b| b.len() + pad(b.len()));
    let total = 12 + 8 + json_padded + bin_padded.map_or(0, |len| 8 + len);

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json_padded as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(json);
    out.resize(out.len() + pad(json.len()), b' ');

    if let (Some(bin), Some(len)) = (bin, bin_padded) {
        out.extend_from_slice(&(len as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(bin);
        out.resize(out.len() + pad(bin.len()), 0);
    }
    out
}

async fn load_buffers<S: AssetSource>(gltf: &gltf::Gltf, url: &str, source: &S) -> Result<Vec<Vec<u8>>, LoadError> {
    let mut buffers = Vec::with_capacity(gltf.buffers().len());

    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| LoadError::decode(url, "buffer refers to a missing GLB binary chunk"))?,
            gltf::buffer::Source::Uri(uri) => match decode_data_uri(uri) {
                Some(decoded) => decoded.map_err(|e| LoadError::decode(url, e))?,
                None => source.fetch(&resolve_uri(url, uri), &mut |_| {}).await?,
            },
        };

        if data.len() < buffer.length() {
            return Err(LoadError::decode(
                url,
                format!("buffer {} holds {} bytes, expected {}", buffer.index(), data.len(), buffer.length()),
            ));
        }
        buffers.push(data);
    }

    Ok(buffers)
}

/// Decode every image referenced by the document, keyed by image index.
///
/// Images that fail to fetch or decode are logged and left out; materials
/// using them fall back to neutral textures.
async fn load_images<S: AssetSource>(
    gltf: &gltf::Gltf,
    buffers: &[Vec<u8>],
    url: &str,
    source: &S,
) -> HashMap<usize, LoadedTexture> {
    let mut images = HashMap::new();

    for image in gltf.images() {
        let encoded = match image.source() {
            gltf::image::Source::View { view, .. } => {
                let start = view.offset();
                let end = start + view.length();
                match buffers.get(view.buffer().index()).and_then(|b| b.get(start..end)) {
                    Some(bytes) => Ok(bytes.to_vec()),
                    None => Err(LoadError::decode(url, format!("image {} view is out of bounds", image.index()))),
                }
            }
            gltf::image::Source::Uri { uri, .. } => match decode_data_uri(uri) {
                Some(decoded) => decoded.map_err(|e| LoadError::decode(url, e)),
                None => source.fetch(&resolve_uri(url, uri), &mut |_| {}).await,
            },
        };

        let decoded = encoded.and_then(|bytes| image::load_from_memory(&bytes).map_err(|e| LoadError::decode(url, e)));
        match decoded {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                images.insert(image.index(), LoadedTexture { width, height, data: rgba.into_raw() });
            }
            Err(err) => log::warn!("skipping image {}: {}", image.index(), err),
        }
    }

    images
}

fn scene_name(gltf: &gltf::Gltf, url: &str) -> String {
    gltf.default_scene()
        .or_else(|| gltf.scenes().next())
        .and_then(|s| s.name().map(str::to_string))
        .unwrap_or_else(|| {
            let file = url.rsplit('/').next().unwrap_or(url);
            file.split('.').next().unwrap_or(file).to_string()
        })
}

fn build_scene(
    gltf: &gltf::Gltf,
    buffers: &[Vec<u8>],
    images: &HashMap<usize, LoadedTexture>,
    name: String,
) -> Result<LoadedScene, String> {
    let mut scene = LoadedScene::new(name);

    scene.materials = gltf.materials().map(|m| load_material(&m)).collect();

    for texture in gltf.textures() {
        if let Some(image) = images.get(&texture.source().index()) {
            scene.textures.insert(texture.index(), image.clone());
        }
    }

    // glTF meshes hold several primitives; ours are flattened, so remember where each mesh landed.
    let mut mesh_map: Vec<Vec<usize>> = Vec::with_capacity(gltf.meshes().len());
    for mesh in gltf.meshes() {
        let mut flattened = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("skipping {:?} primitive in mesh {}", primitive.mode(), mesh.index());
                continue;
            }
            let geometry = load_primitive(&primitive, buffers)?;
            flattened.push(scene.meshes.len());
            scene.meshes.push(LoadedMesh {
                name: mesh.name().unwrap_or("Mesh").to_string(),
                geometry,
                material_index: primitive.material().index(),
            });
        }
        mesh_map.push(flattened);
    }

    for node in gltf.nodes() {
        let (translation, rotation, scale) = node.transform().decomposed();
        scene.nodes.push(LoadedNode {
            name: node.name().unwrap_or("Node").to_string(),
            translation,
            rotation,
            scale,
            mesh_indices: node
                .mesh()
                .and_then(|m| mesh_map.get(m.index()))
                .cloned()
                .unwrap_or_default(),
            children: node.children().map(|c| c.index()).collect(),
        });
    }

    if let Some(root) = gltf.default_scene().or_else(|| gltf.scenes().next()) {
        scene.root_nodes = root.nodes().map(|n| n.index()).collect();
    }

    Ok(scene)
}

fn load_primitive(primitive: &gltf::Primitive, buffers: &[Vec<u8>]) -> Result<LoadedGeometry, String> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| format!("primitive {} has no POSITION attribute", primitive.index()))?
        .collect();
    let vertex_count = positions.len();

    let mut geometry = LoadedGeometry {
        normals: reader.read_normals().map(Iterator::collect).unwrap_or_default(),
        uvs: reader
            .read_tex_coords(0)
            .map(|uvs| uvs.into_f32().collect())
            .unwrap_or_else(|| vec![[0.0, 0.0]; vertex_count]),
        indices: reader
            .read_indices()
            .map(|i| i.into_u32().collect())
            .unwrap_or_else(|| (0..vertex_count as u32).collect()),
        positions,
    };

    if let Some(bad) = geometry.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(format!("primitive {} index {} out of range", primitive.index(), bad));
    }
    if geometry.normals.len() != vertex_count {
        geometry.compute_vertex_normals();
    }
    if geometry.uvs.len() != vertex_count {
        geometry.uvs = vec![[0.0, 0.0]; vertex_count];
    }

    Ok(geometry)
}

fn load_material(material: &gltf::Material) -> LoadedMaterial {
    let pbr = material.pbr_metallic_roughness();
    let mut loaded = LoadedMaterial::new(material.name().unwrap_or("Material"));

    loaded.base_color = pbr.base_color_factor();
    loaded.metallic = pbr.metallic_factor();
    loaded.roughness = pbr.roughness_factor();
    loaded.emissive = material.emissive_factor();
    loaded.double_sided = material.double_sided();
    loaded.alpha_cutoff = material.alpha_cutoff().unwrap_or(0.5);
    loaded.alpha_mode = match material.alpha_mode() {
        gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
        gltf::material::AlphaMode::Mask => AlphaMode::Mask,
        gltf::material::AlphaMode::Blend => AlphaMode::Blend,
    };

    loaded.base_color_texture = pbr.base_color_texture().map(|t| t.texture().index());
    loaded.metallic_roughness_texture = pbr.metallic_roughness_texture().map(|t| t.texture().index());
    loaded.emissive_texture = material.emissive_texture().map(|t| t.texture().index());
    if let Some(normal) = material.normal_texture() {
        loaded.normal_texture = Some(normal.texture().index());
        loaded.normal_scale = normal.scale();
    }
    if let Some(occlusion) = material.occlusion_texture() {
        loaded.occlusion_texture = Some(occlusion.texture().index());
        loaded.occlusion_strength = occlusion.strength();
    }

    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::fixtures::{triangle_buffer, triangle_gltf};
    use crate::loaders::MemorySource;

    #[test]
    fn test_load_embedded_triangle() {
        let source = MemorySource::new().with("./tri.gltf", triangle_gltf(None));
        let scene = pollster::block_on(GltfLoader::new().load(&source, "./tri.gltf", &mut |_| {})).unwrap();

        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.total_triangles(), 1);
        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.materials[0].metallic, 0.25);
        assert_eq!(scene.root_nodes, vec![0]);
        assert_eq!(scene.mesh_instances().len(), 1);
        // No NORMAL attribute in the fixture, so normals are generated.
        assert_eq!(scene.meshes[0].geometry.normals, vec![[0.0, 0.0, 1.0]; 3]);
        assert_eq!(scene.name, "tri");
    }

    #[test]
    fn test_external_buffer_resolved_against_document() {
        let source = MemorySource::new()
            .with("models/tri.gltf", triangle_gltf(Some("tri.bin")))
            .with("models/tri.bin", triangle_buffer());
        let scene = pollster::block_on(GltfLoader::new().load(&source, "models/tri.gltf", &mut |_| {})).unwrap();

        assert_eq!(scene.total_triangles(), 1);
        assert_eq!(source.requests(), vec!["models/tri.gltf".to_string(), "models/tri.bin".to_string()]);
    }

    #[test]
    fn test_missing_external_buffer_fails() {
        let source = MemorySource::new().with("tri.gltf", triangle_gltf(Some("gone.bin")));
        let err = pollster::block_on(GltfLoader::new().load(&source, "tri.gltf", &mut |_| {})).unwrap_err();
        assert!(matches!(err, LoadError::Http { status: 404, .. }));
    }

    #[test]
    fn test_progress_is_forwarded() {
        let source = MemorySource::new().with("tri.gltf", triangle_gltf(None));
        let mut last = None;
        pollster::block_on(GltfLoader::new().load(&source, "tri.gltf", &mut |p| last = p.percentage())).unwrap();
        assert_eq!(last, Some(100.0));
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let source = MemorySource::new().with("bad.gltf", b"{ not json".to_vec());
        let err = pollster::block_on(GltfLoader::new().load(&source, "bad.gltf", &mut |_| {})).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn test_strip_required_extensions_json() {
        let json = br#"{"asset":{"version":"2.0"},"extensionsRequired":["EXT_unknown"]}"#;
        let stripped = strip_required_extensions(json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&stripped).unwrap();
        assert!(value.get("extensionsRequired").is_none());
        assert!(strip_required_extensions(br#"{"asset":{"version":"2.0"}}"#).is_none());
    }

    #[test]
    fn test_glb_split_join_keeps_binary_chunk() {
        let json = br#"{"asset":{"version":"2.0"}}"#;
        let bin = [1u8, 2, 3, 4, 5];
        let glb = join_glb(json, Some(&bin));
        assert_eq!(glb.len() % 4, 0);
        assert_eq!(read_u32(&glb, 8), Some(glb.len() as u32));

        let (json_out, bin_out) = split_glb(&glb).unwrap();
        assert!(json_out.starts_with(json));
        assert!(bin_out.unwrap().starts_with(&bin));
    }
}
