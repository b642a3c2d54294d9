//! Arena-backed scene graph
//!
//! Nodes are stored in a flat `Vec` and addressed by [`NodeId`]. Parents are
//! kept as plain ids for upward traversal only; a child never owns its parent.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use super::geometry::MeshGeometry;
use super::material::MaterialHandle;

/// Index of a node inside a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index
    pub fn index(self) -> usize {
        self.0
    }

    /// Shift this id by the base index of an appended graph
    pub fn offset(self, offset: NodeOffset) -> Self {
        NodeId(self.0 + offset.0)
    }
}

/// Base index returned by [`SceneGraph::append`]
///
/// Ids taken from the appended graph must be shifted by this offset before
/// they can be used against the destination graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeOffset(pub(crate) usize);

/// Local translation / rotation / scale of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Local matrix (T * R * S)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decompose an affine matrix into TRS
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Renderable payload of a mesh node: geometry plus one material slot
///
/// The slot holds a shared, read-only [`MaterialHandle`]. Reassigning the slot
/// swaps which material the node points at; the material itself can't be
/// modified through the handle.
#[derive(Debug, Clone)]
pub struct Mesh {
    geometry: Arc<MeshGeometry>,
    material: MaterialHandle,
}

impl Mesh {
    pub fn new(geometry: Arc<MeshGeometry>, material: MaterialHandle) -> Self {
        Self { geometry, material }
    }

    pub fn geometry(&self) -> &Arc<MeshGeometry> {
        &self.geometry
    }

    /// Material currently assigned to the slot
    pub fn material(&self) -> &MaterialHandle {
        &self.material
    }

    /// Point the slot at another material
    pub fn set_material(&mut self, material: MaterialHandle) {
        self.material = material;
    }
}

/// A node in the scene hierarchy
#[derive(Debug, Clone)]
pub struct Node {
    /// Stable name used for part lookup and animation routing
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    mesh: Option<Mesh>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        self.mesh.as_mut()
    }

    pub fn is_mesh(&self) -> bool {
        self.mesh.is_some()
    }
}

/// Flat node arena with parent/child links
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a group/transform node
    pub fn add_node(&mut self, name: impl Into<String>, parent: Option<NodeId>) -> NodeId {
        self.insert(name.into(), parent, None)
    }

    /// Add a mesh node
    pub fn add_mesh(&mut self, name: impl Into<String>, parent: Option<NodeId>, mesh: Mesh) -> NodeId {
        self.insert(name.into(), parent, Some(mesh))
    }

    fn insert(&mut self, name: String, parent: Option<NodeId>, mesh: Option<Mesh>) -> NodeId {
        let id = NodeId(self.nodes.len());
        // A dangling parent id degrades to a root node
        let parent = parent.filter(|p| p.0 < self.nodes.len());
        self.nodes.push(Node {
            name,
            transform: Transform::IDENTITY,
            visible: true,
            parent,
            children: Vec::new(),
            mesh,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Nodes without a parent, in insertion order
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| NodeId(i))
    }

    /// Move every node of `other` into this graph
    ///
    /// Roots of `other` become roots here. Returns the offset to apply to ids
    /// that referred to `other`.
    pub fn append(&mut self, other: SceneGraph) -> NodeOffset {
        let offset = NodeOffset(self.nodes.len());
        for mut node in other.nodes {
            node.parent = node.parent.map(|p| p.offset(offset));
            for child in &mut node.children {
                *child = child.offset(offset);
            }
            self.nodes.push(node);
        }
        offset
    }

    /// Depth-first search below (and including) `root` for a node by name
    pub fn find_by_name_from(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.nodes[id.0].name == name)
    }

    /// Depth-first search across all roots for a node by name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.roots()
            .find_map(|root| self.find_by_name_from(root, name))
    }

    /// `id` followed by its parent chain up to the root
    pub fn self_and_ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.node(id).map(|_| id),
        }
    }

    /// `root` and every node below it, depth-first, pre-order
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.node(root).is_none() {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            // Reverse so the first child is visited first
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// Every mesh node at or below `root`
    pub fn mesh_descendants(&self, root: NodeId) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.nodes[id.0].is_mesh())
            .collect()
    }

    /// Every mesh node in the graph
    pub fn mesh_nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_mesh())
            .map(|(i, n)| (NodeId(i), n))
    }

    /// World matrix of a node (product of local matrices from the root down)
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        self.self_and_ancestors(id)
            .fold(Mat4::IDENTITY, |acc, ancestor| {
                self.nodes[ancestor.0].transform.to_matrix() * acc
            })
    }

    /// Whether the node and all its ancestors are visible
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.self_and_ancestors(id)
            .all(|ancestor| self.nodes[ancestor.0].visible)
    }
}

/// Iterator over a node and its ancestors
pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.graph.node(current).and_then(|n| n.parent);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::material::Material;

    fn mesh() -> Mesh {
        Mesh::new(
            Arc::new(MeshGeometry::cuboid(Vec3::splat(0.5))),
            Arc::new(Material::standard("grey")),
        )
    }

    #[test]
    fn test_find_by_name_depth_first() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("Scene", None);
        let a = graph.add_node("A", Some(root));
        let dup = graph.add_mesh("Target", Some(a), mesh());
        graph.add_mesh("Target", Some(root), mesh());

        assert_eq!(graph.find_by_name("Target"), Some(dup));
        assert_eq!(graph.find_by_name("Missing"), None);
    }

    #[test]
    fn test_ancestor_walk() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("Scene", None);
        let group = graph.add_node("Pickup", Some(root));
        let leaf = graph.add_mesh("Arm", Some(group), mesh());

        let chain: Vec<_> = graph.self_and_ancestors(leaf).collect();
        assert_eq!(chain, vec![leaf, group, root]);
    }

    #[test]
    fn test_append_rebases_ids() {
        let mut scene = SceneGraph::new();
        scene.add_node("Existing", None);

        let mut model = SceneGraph::new();
        let root = model.add_node("Model", None);
        let child = model.add_mesh("Base", Some(root), mesh());

        let offset = scene.append(model);
        let child = child.offset(offset);
        let root = root.offset(offset);

        assert_eq!(scene.len(), 3);
        assert_eq!(scene.node(child).unwrap().parent(), Some(root));
        assert_eq!(scene.node(root).unwrap().children(), &[child]);
        assert_eq!(scene.roots().count(), 2);
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("Scene", None);
        graph.node_mut(root).unwrap().transform.scale = Vec3::splat(2.0);
        let child = graph.add_node("Child", Some(root));
        graph.node_mut(child).unwrap().transform.translation = Vec3::new(1.0, 0.0, 0.0);

        let world = graph.world_matrix(child);
        let p = world.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_mesh_descendants() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("Scene", None);
        let group = graph.add_node("Group", Some(root));
        let m1 = graph.add_mesh("M1", Some(group), mesh());
        let m2 = graph.add_mesh("M2", Some(root), mesh());

        assert_eq!(graph.mesh_descendants(root), vec![m1, m2]);
        assert_eq!(graph.mesh_descendants(m1), vec![m1]);
    }
}
