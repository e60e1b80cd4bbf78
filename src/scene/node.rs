use glam::{Mat4, Vec3};

use crate::bounds::BoundingBox;

/// Surface appearance of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name from the source file (may be empty).
    pub name: String,
    /// Linear RGBA base (diffuse) color.
    pub base_color: [f32; 4],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Indexed triangle mesh in its node's local space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals; either empty or one per position.
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices into `positions`.
    pub indices: Vec<u32>,
    /// Surface material.
    pub material: Material,
}

impl Mesh {
    /// Number of whole triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space bounds of the positions.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.positions.iter().copied().map(Vec3::from))
    }

    /// Fill `normals` with area-weighted smooth normals if the source had
    /// none. Triangles referencing out-of-range vertices are skipped.
    pub fn ensure_normals(&mut self) {
        if self.normals.len() == self.positions.len() {
            return;
        }
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(&pa), Some(&pb), Some(&pc)) = (
                self.positions.get(a),
                self.positions.get(b),
                self.positions.get(c),
            ) else {
                continue;
            };
            let n = (Vec3::from(pb) - Vec3::from(pa))
                .cross(Vec3::from(pc) - Vec3::from(pa));
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
        self.normals = acc
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }
}

/// A node in the model's scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Node name from the source file (may be empty).
    pub name: String,
    /// Transform from this node's space to its parent's.
    pub transform: Mat4,
    /// Meshes attached to this node.
    pub meshes: Vec<Mesh>,
    /// Child nodes.
    pub children: Vec<SceneNode>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Mat4::IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl SceneNode {
    /// Empty group node.
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Visit every mesh with its accumulated transform, starting from
    /// `parent`.
    pub fn visit_meshes<'a>(&'a self, parent: Mat4, f: &mut impl FnMut(Mat4, &'a Mesh)) {
        let world = parent * self.transform;
        for mesh in &self.meshes {
            f(world, mesh);
        }
        for child in &self.children {
            child.visit_meshes(world, f);
        }
    }

    /// World-space bounds of every vertex under this node, assuming the
    /// node sits directly under the scene root.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bounds = BoundingBox::EMPTY;
        self.visit_meshes(Mat4::IDENTITY, &mut |world, mesh| {
            for &p in &mesh.positions {
                bounds.expand_by_point(world.transform_point3(Vec3::from(p)));
            }
        });
        bounds
    }

    /// Total vertex and triangle counts under this node.
    #[must_use]
    pub fn stats(&self) -> (usize, usize) {
        let mut counts = (0, 0);
        self.visit_meshes(Mat4::IDENTITY, &mut |_, mesh| {
            counts.0 += mesh.positions.len();
            counts.1 += mesh.triangle_count();
        });
        counts
    }

    /// Horizontal square of edge `size` at y = 0, facing up.
    #[must_use]
    pub fn ground_plane(size: f32) -> Self {
        let h = size * 0.5;
        let mesh = Mesh {
            positions: vec![[-h, 0.0, h], [h, 0.0, h], [h, 0.0, -h], [-h, 0.0, -h]],
            normals: vec![[0.0, 1.0, 0.0]; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
            material: Material {
                name: "ground".into(),
                base_color: [0.6, 0.6, 0.6, 1.0],
            },
        };
        Self {
            name: "ground".into(),
            meshes: vec![mesh],
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
            ..Mesh::default()
        }
    }

    #[test]
    fn bounds_follow_nested_transforms() {
        let child = SceneNode {
            transform: Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)),
            meshes: vec![triangle()],
            ..SceneNode::default()
        };
        let root = SceneNode {
            transform: Mat4::from_scale(Vec3::splat(2.0)),
            children: vec![child],
            ..SceneNode::default()
        };
        let b = root.bounding_box();
        assert_eq!(b.min, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(b.max, Vec3::new(2.0, 2.0, 10.0));
    }

    #[test]
    fn empty_node_has_empty_bounds() {
        assert!(SceneNode::group("empty").bounding_box().is_empty());
    }

    #[test]
    fn generated_normals_face_out_of_ccw_triangle() {
        let mut mesh = triangle();
        mesh.ensure_normals();
        assert_eq!(mesh.normals.len(), 3);
        for n in &mesh.normals {
            assert_eq!(*n, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn ground_plane_is_flat() {
        let plane = SceneNode::ground_plane(40.0);
        let b = plane.bounding_box();
        assert_eq!(b.extents(), Vec3::new(40.0, 0.0, 40.0));
        assert_eq!(plane.stats(), (4, 2));
    }
}
