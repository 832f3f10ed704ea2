//! In-memory assets for tests.

use base64::Engine as _;

/// Radiance HDR bytes of a `width` x `height` image filled with one color.
pub(crate) fn encode_hdr(width: usize, height: usize, value: f32) -> Vec<u8> {
    let pixels = vec![image::Rgb([value, value * 0.5, value * 0.25]); width * height];
    let mut out = Vec::new();
    image::codecs::hdr::HdrEncoder::new(&mut out)
        .encode(&pixels, width, height)
        .unwrap();
    out
}

/// Vertex positions of one counter-clockwise triangle in the XY plane.
pub(crate) fn triangle_buffer() -> Vec<u8> {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    bytemuck::cast_slice(&positions).to_vec()
}

/// A one-triangle glTF document. The buffer is embedded as a data URI unless
/// `external` names a separate file.
pub(crate) fn triangle_gltf(external: Option<&str>) -> Vec<u8> {
    let buffer = triangle_buffer();
    let uri = match external {
        Some(name) => name.to_string(),
        None => format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&buffer)
        ),
    };

    let doc = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
        "materials": [{ "pbrMetallicRoughness": { "metallicFactor": 0.25 } }],
        "buffers": [{ "byteLength": buffer.len(), "uri": uri }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": buffer.len() }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }]
    });
    serde_json::to_vec(&doc).unwrap()
}
