//! glTF 2.0 (`.glb` and self-contained `.gltf`) to [`SceneNode`].

use std::collections::HashSet;

use ::gltf::mesh::Mode;
use ::gltf::{Document, Gltf};
use glam::Mat4;

use super::LoadError;
use crate::scene::{Material, Mesh, SceneNode};

/// glTF extension name for Draco-compressed primitives.
pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

const MAX_NODE_DEPTH: usize = 256;

/// A compressed primitive handed to a [`MeshDecoder`].
#[derive(Debug, Clone)]
pub struct CompressedPrimitive<'a> {
    /// The compressed payload (the extension's buffer view).
    pub data: &'a [u8],
    /// Attribute semantic (`POSITION`, `NORMAL`, ...) to the attribute id
    /// inside the payload.
    pub attributes: Vec<(String, u32)>,
}

/// Output of a [`MeshDecoder`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedMesh {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals; may be empty.
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
}

/// Decodes compressed glTF primitives.
pub trait MeshDecoder: Send + Sync {
    /// Take the decoder asset path named by the model source. Called once
    /// per load, before the model is fetched.
    ///
    /// # Errors
    ///
    /// A message describing why the asset cannot be used.
    fn configure(&self, _asset_path: &str) -> Result<(), String> {
        Ok(())
    }

    /// Decode one primitive.
    ///
    /// # Errors
    ///
    /// A message describing why the payload could not be decoded.
    fn decode(&self, primitive: &CompressedPrimitive<'_>) -> Result<DecodedMesh, String>;
}

struct Context<'a> {
    document: &'a Document,
    buffers: &'a [::gltf::buffer::Data],
    decoder: Option<&'a dyn MeshDecoder>,
}

fn parse_error(e: impl std::fmt::Display) -> LoadError {
    LoadError::Parse(e.to_string())
}

fn requires_draco(document: &Document) -> bool {
    document.extensions_required().any(|ext| ext == DRACO_EXTENSION)
}

pub(super) fn parse_gltf(
    bytes: &[u8],
    decoder: Option<&dyn MeshDecoder>,
    name: &str,
) -> Result<SceneNode, LoadError> {
    // Validation rejects required extensions the gltf crate does not know,
    // so compressed files are accepted unvalidated and decoded by hand.
    let gltf = match Gltf::from_slice(bytes) {
        Ok(gltf) => gltf,
        Err(err) => {
            let raw = Gltf::from_slice_without_validation(bytes).map_err(parse_error)?;
            if !requires_draco(&raw.document) {
                return Err(parse_error(err));
            }
            raw
        }
    };
    if requires_draco(&gltf.document) && decoder.is_none() {
        return Err(LoadError::UnsupportedCompression(DRACO_EXTENSION.into()));
    }
    for ext in gltf.document.extensions_required() {
        if ext != DRACO_EXTENSION {
            log::warn!("model requires unsupported extension {ext}; rendering may be wrong");
        }
    }

    let Gltf { document, blob } = gltf;
    let buffers = ::gltf::import_buffers(&document, None, blob).map_err(parse_error)?;
    let ctx = Context {
        document: &document,
        buffers: &buffers,
        decoder,
    };

    let mut root = SceneNode::group(name);
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                root.children.push(convert_node(&node, &ctx, 0)?);
            }
        }
        None => {
            let children: HashSet<usize> = document
                .nodes()
                .flat_map(|n| n.children().map(|c| c.index()).collect::<Vec<_>>())
                .collect();
            for node in document.nodes().filter(|n| !children.contains(&n.index())) {
                root.children.push(convert_node(&node, &ctx, 0)?);
            }
        }
    }
    Ok(root)
}

fn convert_node(
    node: &::gltf::Node<'_>,
    ctx: &Context<'_>,
    depth: usize,
) -> Result<SceneNode, LoadError> {
    if depth > MAX_NODE_DEPTH {
        return Err(LoadError::Parse("node hierarchy too deep".into()));
    }
    let mut out = SceneNode {
        name: node.name().unwrap_or_default().to_owned(),
        transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
        ..SceneNode::default()
    };
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if let Some(mesh) = convert_primitive(&primitive, ctx)? {
                out.meshes.push(mesh);
            }
        }
    }
    for child in node.children() {
        out.children.push(convert_node(&child, ctx, depth + 1)?);
    }
    Ok(out)
}

fn convert_primitive(
    primitive: &::gltf::Primitive<'_>,
    ctx: &Context<'_>,
) -> Result<Option<Mesh>, LoadError> {
    if primitive.mode() != Mode::Triangles {
        log::debug!("skipping {:?} primitive", primitive.mode());
        return Ok(None);
    }
    let gltf_material = primitive.material();
    let material = Material {
        name: gltf_material.name().unwrap_or_default().to_owned(),
        base_color: gltf_material.pbr_metallic_roughness().base_color_factor(),
    };

    let compressed = primitive.extension_value(DRACO_EXTENSION);
    let has_plain_positions = primitive
        .get(&::gltf::Semantic::Positions)
        .is_some_and(|a| a.view().is_some());

    let mut mesh = match (compressed, ctx.decoder) {
        (Some(ext), Some(decoder)) => decode_draco(ext, decoder, ctx)?,
        (Some(_), None) if !has_plain_positions => {
            return Err(LoadError::UnsupportedCompression(DRACO_EXTENSION.into()));
        }
        _ => read_plain(primitive, ctx),
    };
    mesh.material = material;
    mesh.ensure_normals();
    Ok(Some(mesh))
}

fn read_plain(primitive: &::gltf::Primitive<'_>, ctx: &Context<'_>) -> Mesh {
    let reader = primitive.reader(|buffer| ctx.buffers.get(buffer.index()).map(|d| d.0.as_slice()));
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .map(Iterator::collect)
        .unwrap_or_default();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(Iterator::collect)
        .unwrap_or_default();
    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    Mesh {
        positions,
        normals,
        indices,
        material: Material::default(),
    }
}

fn decode_draco(
    ext: &serde_json::Value,
    decoder: &dyn MeshDecoder,
    ctx: &Context<'_>,
) -> Result<Mesh, LoadError> {
    let view_index = ext
        .get("bufferView")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| LoadError::Parse(format!("{DRACO_EXTENSION} without bufferView")))?;
    let view = usize::try_from(view_index)
        .ok()
        .and_then(|i| ctx.document.views().nth(i))
        .ok_or_else(|| LoadError::Parse(format!("buffer view {view_index} out of range")))?;
    let data = ctx
        .buffers
        .get(view.buffer().index())
        .and_then(|b| b.0.get(view.offset()..view.offset() + view.length()))
        .ok_or_else(|| LoadError::Parse(format!("buffer view {view_index} out of bounds")))?;

    let attributes = ext
        .get("attributes")
        .and_then(serde_json::Value::as_object)
        .map(|attrs| {
            attrs
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), u32::try_from(v.as_u64()?).ok()?)))
                .collect()
        })
        .unwrap_or_default();

    let decoded = decoder
        .decode(&CompressedPrimitive { data, attributes })
        .map_err(LoadError::Parse)?;
    Ok(Mesh {
        positions: decoded.positions,
        normals: decoded.normals,
        indices: decoded.indices,
        material: Material::default(),
    })
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    const TRIANGLE_JSON: &str = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "deck", "mesh": 0, "translation": [0, 0, 5]}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 0}]}],
        "materials": [{"name": "steel", "pbrMetallicRoughness": {"baseColorFactor": [1, 0, 0, 1]}}],
        "buffers": [{"byteLength": 44}],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 6}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0, 0, 0], "max": [1, 1, 0]},
            {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
        ]
    }"#;

    const DRACO_JSON: &str = r#"{
        "asset": {"version": "2.0"},
        "extensionsUsed": ["KHR_draco_mesh_compression"],
        "extensionsRequired": ["KHR_draco_mesh_compression"],
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": [{
            "attributes": {"POSITION": 0},
            "extensions": {"KHR_draco_mesh_compression": {"bufferView": 0, "attributes": {"POSITION": 0}}}
        }]}],
        "buffers": [{"byteLength": 44}],
        "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 44}],
        "accessors": [
            {"componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0]}
        ]
    }"#;

    fn triangle_bin() -> Vec<u8> {
        let mut bin = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        bin.extend_from_slice(&[0, 0]);
        bin
    }

    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(bin);
        out
    }

    struct FixedDecoder;

    impl MeshDecoder for FixedDecoder {
        fn decode(&self, primitive: &CompressedPrimitive<'_>) -> Result<DecodedMesh, String> {
            assert_eq!(primitive.data.len(), 44);
            assert_eq!(primitive.attributes, vec![("POSITION".to_owned(), 0)]);
            Ok(DecodedMesh {
                positions: vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
                normals: Vec::new(),
                indices: vec![0, 1, 2],
            })
        }
    }

    #[test]
    fn binary_gltf_keeps_transform_and_material() {
        let root = parse_gltf(&glb(TRIANGLE_JSON, &triangle_bin()), None, "bridge").unwrap();
        assert_eq!(root.name, "bridge");
        assert_eq!(root.stats(), (3, 1));
        let deck = &root.children[0];
        assert_eq!(deck.name, "deck");
        assert_eq!(deck.meshes[0].material.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(deck.meshes[0].normals.len(), 3);
        let b = root.bounding_box();
        assert_eq!(b.min, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 5.0));
    }

    #[test]
    fn compressed_model_without_decoder_is_rejected() {
        let err = parse_gltf(&glb(DRACO_JSON, &triangle_bin()), None, "m").unwrap_err();
        assert_eq!(err, LoadError::UnsupportedCompression(DRACO_EXTENSION.into()));
    }

    #[test]
    fn compressed_model_goes_through_decoder() {
        let root = parse_gltf(&glb(DRACO_JSON, &triangle_bin()), Some(&FixedDecoder), "m").unwrap();
        assert_eq!(root.stats(), (3, 1));
        assert_eq!(root.bounding_box().max, Vec3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_gltf(b"definitely not a model", None, "m").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }
}
