//! Arena-backed scene graph.
//!
//! Nodes live in a [`SlotMap`] and refer to each other through [`NodeId`] handles, so cloning a
//! graph keeps every handle valid in the copy. Geometry and materials are immutable and shared
//! through `Arc`; customization swaps the `Arc` on a node instead of touching the shared value.

use super::material::MaterialDescriptor;
use crate::utils::error::{BouquetError, Result};
use slotmap::{new_key_type, SlotMap};
use std::sync::Arc;

new_key_type! {
    /// Stable handle to a node inside one [`SceneGraph`] (and its clones)
    pub struct NodeId;
}

/// Local TRS transform, glTF conventions (rotation is a unit quaternion `[x, y, z, w]`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Indexed triangle geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Empty, or one normal per position
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds `(min, max)`; `None` for an empty mesh
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;
        for position in &self.positions[1..] {
            for axis in 0..3 {
                min[axis] = min[axis].min(position[axis]);
                max[axis] = max[axis].max(position[axis]);
            }
        }
        Some((min, max))
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub mesh: Option<Arc<Mesh>>,
    pub material: Option<Arc<MaterialDescriptor>>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            visible: true,
            mesh: None,
            material: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: Arc<Mesh>, material: Option<Arc<MaterialDescriptor>>) -> Self {
        self.mesh = Some(mesh);
        self.material = material;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub name: String,
    nodes: SlotMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
        }
    }

    pub fn add_root(&mut self, mut node: SceneNode) -> NodeId {
        node.parent = None;
        let id = self.nodes.insert(node);
        self.roots.push(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> Result<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(BouquetError::transform(format!(
                "cannot attach '{}': parent node does not exist",
                node.name
            )));
        }

        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut SceneNode)> {
        self.nodes.iter_mut()
    }

    /// First node with exactly this name, in depth-first order
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.depth_first()
            .into_iter()
            .find(|id| self.nodes.get(*id).is_some_and(|node| node.name == name))
    }

    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                order.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// 依名稱排序的節點名稱列表
    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.values().map(|node| node.name.clone()).collect();
        names.sort();
        names
    }

    /// Structural check: non-empty, and every root/child handle resolves with a matching parent link.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() || self.roots.is_empty() {
            return Err(BouquetError::transform(format!(
                "base scene '{}' has no nodes",
                self.name
            )));
        }

        for root in &self.roots {
            if !self.nodes.contains_key(*root) {
                return Err(BouquetError::transform("base scene has a dangling root handle"));
            }
        }

        for (id, node) in &self.nodes {
            for child in &node.children {
                match self.nodes.get(*child) {
                    Some(child_node) if child_node.parent == Some(id) => {}
                    Some(child_node) => {
                        return Err(BouquetError::transform(format!(
                            "node '{}' lists '{}' as a child but is not its parent",
                            node.name, child_node.name
                        )))
                    }
                    None => {
                        return Err(BouquetError::transform(format!(
                            "node '{}' has a dangling child handle",
                            node.name
                        )))
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Arc<Mesh> {
        Arc::new(Mesh {
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, -1.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
        })
    }

    #[test]
    fn test_hierarchy_and_depth_first_order() {
        let mut graph = SceneGraph::new("test");
        let root = graph.add_root(SceneNode::new("root"));
        let a = graph.add_child(root, SceneNode::new("a")).unwrap();
        graph.add_child(a, SceneNode::new("a1")).unwrap();
        graph.add_child(root, SceneNode::new("b")).unwrap();

        let names: Vec<&str> = graph
            .depth_first()
            .into_iter()
            .map(|id| graph.node(id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["root", "a", "a1", "b"]);
        assert_eq!(graph.node(a).unwrap().parent(), Some(root));
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_clone_keeps_handles_and_is_independent() {
        let mut graph = SceneGraph::new("test");
        let root = graph.add_root(SceneNode::new("root"));
        let leaf = graph
            .add_child(root, SceneNode::new("leaf").with_mesh(triangle(), None))
            .unwrap();

        let mut copy = graph.clone();
        copy.node_mut(leaf).unwrap().visible = false;

        assert!(graph.node(leaf).unwrap().visible);
        assert!(!copy.node(leaf).unwrap().visible);
        assert!(Arc::ptr_eq(
            graph.node(leaf).unwrap().mesh.as_ref().unwrap(),
            copy.node(leaf).unwrap().mesh.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_empty_graph_fails_validation() {
        let graph = SceneGraph::new("empty");
        assert!(matches!(
            graph.validate(),
            Err(BouquetError::TransformError { .. })
        ));
    }

    #[test]
    fn test_add_child_to_missing_parent() {
        let mut graph = SceneGraph::new("test");
        let root = graph.add_root(SceneNode::new("root"));
        let mut other = SceneGraph::new("other");
        other.add_root(SceneNode::new("x"));
        let foreign = other.add_root(SceneNode::new("y"));

        // handle from a different arena with a higher index does not resolve here
        assert!(graph.add_child(foreign, SceneNode::new("orphan")).is_err());
        assert!(graph.add_child(root, SceneNode::new("ok")).is_ok());
    }

    #[test]
    fn test_mesh_bounds() {
        let mesh = triangle();
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, [0.0, 0.0, -1.0]);
        assert_eq!(max, [1.0, 2.0, 0.0]);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.has_normals());
        assert!(Mesh::default().bounds().is_none());
    }

    #[test]
    fn test_find_by_name() {
        let mut graph = SceneGraph::new("test");
        let root = graph.add_root(SceneNode::new("root"));
        let target = graph.add_child(root, SceneNode::new("string_top")).unwrap();
        assert_eq!(graph.find_by_name("string_top"), Some(target));
        assert_eq!(graph.find_by_name("missing"), None);
    }
}
