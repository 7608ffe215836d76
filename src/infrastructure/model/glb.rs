//! Minimal binary glTF 2.0 writer for indexed triangle meshes.

use serde_json::{Value, json};

const GLB_MAGIC: u32 = 0x4654_6C67;
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const COMPONENT_FLOAT: u32 = 5126;
const COMPONENT_UNSIGNED_SHORT: u32 = 5123;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Encodes one mesh primitive (positions + u16 indices) as a GLB container.
pub fn encode_mesh(
    positions: &[[f32; 3]],
    indices: &[u16],
    extras: Value,
) -> Result<Vec<u8>, serde_json::Error> {
    let mut bin = Vec::with_capacity(positions.len() * 12 + indices.len() * 2 + 3);
    for position in positions {
        for component in position {
            bin.extend_from_slice(&component.to_le_bytes());
        }
    }
    let positions_len = bin.len();
    for index in indices {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    let indices_len = bin.len() - positions_len;
    pad_to_four(&mut bin, 0);

    let (min, max) = bounds(positions);
    let document = json!({
        "asset": { "version": "2.0", "generator": concat!("triposr-service ", env!("CARGO_PKG_VERSION")) },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "mode": 4 }],
            "extras": extras
        }],
        "buffers": [{ "byteLength": bin.len() }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": positions_len, "target": TARGET_ARRAY_BUFFER },
            { "buffer": 0, "byteOffset": positions_len, "byteLength": indices_len, "target": TARGET_ELEMENT_ARRAY_BUFFER }
        ],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": COMPONENT_FLOAT,
                "count": positions.len(),
                "type": "VEC3",
                "min": min,
                "max": max
            },
            {
                "bufferView": 1,
                "componentType": COMPONENT_UNSIGNED_SHORT,
                "count": indices.len(),
                "type": "SCALAR"
            }
        ]
    });

    let mut json_chunk = serde_json::to_vec(&document)?;
    pad_to_four(&mut json_chunk, b' ');

    let total_len = 12 + 8 + json_chunk.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total_len);
    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&(total_len as u32).to_le_bytes());

    glb.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(&json_chunk);

    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    glb.extend_from_slice(&bin);

    Ok(glb)
}

/// Unit tetrahedron, used as a placeholder mesh.
pub fn tetrahedron(extras: Value) -> Result<Vec<u8>, serde_json::Error> {
    const POSITIONS: [[f32; 3]; 4] = [
        [0.0, 0.5, 0.0],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.0, -0.5, -0.5],
    ];
    const INDICES: [u16; 12] = [0, 1, 2, 0, 2, 3, 0, 3, 1, 1, 3, 2];

    encode_mesh(&POSITIONS, &INDICES, extras)
}

fn pad_to_four(buffer: &mut Vec<u8>, fill: u8) {
    while buffer.len() % 4 != 0 {
        buffer.push(fill);
    }
}

fn bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    if positions.is_empty() {
        return ([0.0; 3], [0.0; 3]);
    }

    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for position in positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(position[axis]);
            max[axis] = max[axis].max(position[axis]);
        }
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::MeshArtifact;

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_tetrahedron_layout() {
        let glb = tetrahedron(json!({ "placeholder": true })).unwrap();

        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(read_u32(&glb, 4), 2);
        assert_eq!(read_u32(&glb, 8) as usize, glb.len());
        assert_eq!(glb.len() % 4, 0);

        let json_len = read_u32(&glb, 12) as usize;
        assert_eq!(read_u32(&glb, 16), CHUNK_JSON);
        let document: Value = serde_json::from_slice(&glb[20..20 + json_len]).unwrap();
        assert_eq!(document["asset"]["version"], "2.0");
        assert_eq!(document["accessors"][0]["count"], 4);
        assert_eq!(document["accessors"][1]["count"], 12);
        assert_eq!(document["meshes"][0]["extras"]["placeholder"], true);

        let bin_header = 20 + json_len;
        let bin_len = read_u32(&glb, bin_header) as usize;
        assert_eq!(read_u32(&glb, bin_header + 4), CHUNK_BIN);
        // 4 * 12 bytes of positions + 12 * 2 bytes of indices
        assert_eq!(bin_len, 72);
        assert_eq!(document["buffers"][0]["byteLength"], 72);
    }

    #[test]
    fn test_encoded_mesh_is_accepted_as_artifact() {
        let glb = encode_mesh(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[0, 1, 2], Value::Null)
            .unwrap();
        let artifact = MeshArtifact::from_glb(glb).unwrap();
        assert!(artifact.len() > 20);
    }

    #[test]
    fn test_bounds() {
        let (min, max) = bounds(&[[1.0, -2.0, 3.0], [-1.0, 2.0, 0.0]]);
        assert_eq!(min, [-1.0, -2.0, 0.0]);
        assert_eq!(max, [1.0, 2.0, 3.0]);
        assert_eq!(bounds(&[]), ([0.0; 3], [0.0; 3]));
    }
}
