//! Wavefront OBJ + MTL to [`SceneNode`].

use std::io::Cursor;

use super::LoadError;
use crate::scene::{Material, Mesh, SceneNode};

/// Parsed `.mtl` materials, loaded before the geometry that references
/// them.
#[derive(Debug, Clone, Default)]
pub(super) struct MaterialLibrary {
    materials: Vec<tobj::Material>,
}

impl MaterialLibrary {
    pub(super) fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        let (materials, _) = tobj::load_mtl_buf(&mut Cursor::new(bytes))
            .map_err(|e| LoadError::Parse(format!("material library: {e}")))?;
        log::debug!("material library: {} materials", materials.len());
        Ok(Self { materials })
    }

    fn material(&self, id: Option<usize>) -> Material {
        let Some(mtl) = id.and_then(|i| self.materials.get(i)) else {
            return Material::default();
        };
        let [r, g, b] = mtl.diffuse.unwrap_or([1.0, 1.0, 1.0]);
        Material {
            name: mtl.name.clone(),
            base_color: [r, g, b, mtl.dissolve.unwrap_or(1.0)],
        }
    }
}

pub(super) fn parse_obj(
    bytes: &[u8],
    library: &MaterialLibrary,
    name: &str,
) -> Result<SceneNode, LoadError> {
    // Every `mtllib` line resolves to the preloaded library.
    let (models, _) = tobj::load_obj_buf(&mut Cursor::new(bytes), &tobj::GPU_LOAD_OPTIONS, |_| {
        let names = library
            .materials
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        Ok((library.materials.clone(), names))
    })
    .map_err(|e| LoadError::Parse(format!("geometry: {e}")))?;

    let mut root = SceneNode::group(name);
    for model in models {
        let tobj::Mesh {
            positions,
            normals,
            indices,
            material_id,
            ..
        } = model.mesh;
        let mut mesh = Mesh {
            positions: to_vec3(&positions),
            normals: to_vec3(&normals),
            indices,
            material: library.material(material_id),
        };
        mesh.ensure_normals();
        root.children.push(SceneNode {
            name: model.name,
            meshes: vec![mesh],
            ..SceneNode::default()
        });
    }
    Ok(root)
}

fn to_vec3(flat: &[f32]) -> Vec<[f32; 3]> {
    flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    const MTL: &str = "newmtl red\nKd 1.0 0.0 0.0\nd 0.5\n";

    const QUAD: &str = "mtllib quad.mtl\n\
        o quad\n\
        v 0 0 0\nv 2 0 0\nv 2 2 0\nv 0 2 0\n\
        usemtl red\n\
        f 1 2 3 4\n";

    #[test]
    fn quad_is_triangulated_with_its_material() {
        let library = MaterialLibrary::parse(MTL.as_bytes()).unwrap();
        let root = parse_obj(QUAD.as_bytes(), &library, "quad").unwrap();
        assert_eq!(root.stats(), (4, 2));
        let mesh = &root.children[0].meshes[0];
        assert_eq!(root.children[0].name, "quad");
        assert_eq!(mesh.material.name, "red");
        assert_eq!(mesh.material.base_color, [1.0, 0.0, 0.0, 0.5]);
        assert_eq!(mesh.normals.len(), 4);
        assert_eq!(root.bounding_box().max, Vec3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn unknown_material_falls_back_to_white() {
        let library = MaterialLibrary::default();
        let root = parse_obj(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", &library, "t").unwrap();
        assert_eq!(root.children[0].meshes[0].material, Material::default());
    }
}
