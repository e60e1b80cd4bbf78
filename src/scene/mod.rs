//! CPU scene graph.
//!
//! The [`SceneGraph`] trait is the narrow capability the viewport needs
//! from a scene: add nodes and lights, and measure a node. [`Scene`] is the
//! in-memory implementation the GPU renderer draws from.

mod light;
mod node;

use glam::Mat4;

pub use self::light::{light_rig, Light};
pub use self::node::{Material, Mesh, SceneNode};
use crate::bounds::BoundingBox;

/// Handle to a top-level node added to a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// What the viewport needs from a scene.
pub trait SceneGraph {
    /// Add a top-level node and return its handle.
    fn add_node(&mut self, node: SceneNode) -> NodeId;
    /// Add a light.
    fn add_light(&mut self, light: Light);
    /// World-space bounds of a node's subtree; `None` for an unknown id.
    fn bounding_box(&self, id: NodeId) -> Option<BoundingBox>;
}

/// In-memory scene: top-level nodes and lights.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    lights: Vec<Light>,
    revision: u64,
}

impl Scene {
    /// Empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Node by handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    /// Lights in insertion order.
    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Counter bumped on every structural change, so renderers can tell
    /// when to re-upload geometry.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Visit every mesh in the scene with its world transform.
    pub fn visit_meshes<'a>(&'a self, f: &mut impl FnMut(Mat4, &'a Mesh)) {
        for node in &self.nodes {
            node.visit_meshes(Mat4::IDENTITY, f);
        }
    }
}

impl SceneGraph for Scene {
    fn add_node(&mut self, node: SceneNode) -> NodeId {
        self.nodes.push(node);
        self.revision += 1;
        NodeId(self.nodes.len() - 1)
    }

    fn add_light(&mut self, light: Light) {
        self.lights.push(light);
        self.revision += 1;
    }

    fn bounding_box(&self, id: NodeId) -> Option<BoundingBox> {
        self.node(id).map(SceneNode::bounding_box)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn add_node_bumps_revision_and_measures() {
        let mut scene = Scene::new();
        let before = scene.revision();
        let id = scene.add_node(SceneNode::ground_plane(2.0));
        assert!(scene.revision() > before);
        let b = scene.bounding_box(id).unwrap();
        assert_eq!(b.center(), Vec3::ZERO);
        assert_eq!(scene.bounding_box(NodeId(7)), None);
    }

    #[test]
    fn visits_meshes_of_all_nodes() {
        let mut scene = Scene::new();
        let _ = scene.add_node(SceneNode::ground_plane(1.0));
        let _ = scene.add_node(SceneNode::ground_plane(3.0));
        let mut count = 0;
        scene.visit_meshes(&mut |_, _| count += 1);
        assert_eq!(count, 2);
    }
}
