//! Customizable parts and the as-shipped material snapshot

use std::collections::BTreeMap;

use crate::scene::{Material, MaterialHandle, NodeId, SceneGraph};

/// Parts whose material can be customized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartKey {
    Base,
    Feet,
    Needle,
    VinylBase,
}

impl PartKey {
    pub const ALL: [PartKey; 4] = [
        PartKey::Base,
        PartKey::Feet,
        PartKey::Needle,
        PartKey::VinylBase,
    ];

    /// Node name the part is looked up by
    pub fn node_name(self) -> &'static str {
        match self {
            PartKey::Base => "Base",
            PartKey::Feet => "Feet",
            PartKey::Needle => "Cylinder004",
            PartKey::VinylBase => "VinylBase",
        }
    }

    /// Display label for host UIs
    pub fn label(self) -> &'static str {
        match self {
            PartKey::Base => "Base",
            PartKey::Feet => "Pés",
            PartKey::Needle => "Agulha",
            PartKey::VinylBase => "Base do vinil",
        }
    }
}

/// Part key -> node, resolved once per model load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartRegistry {
    parts: BTreeMap<PartKey, NodeId>,
}

impl PartRegistry {
    /// Look up every part by node name below `root`
    ///
    /// A part is a material slot, so a named group resolves to its first mesh
    /// descendant.
    pub fn resolve(graph: &SceneGraph, root: NodeId) -> Self {
        let mut parts = BTreeMap::new();
        for key in PartKey::ALL {
            let found = graph
                .find_by_name_from(root, key.node_name())
                .and_then(|named| graph.mesh_descendants(named).first().copied());
            match found {
                Some(id) => {
                    parts.insert(key, id);
                }
                None => tracing::warn!("Part node {} not found in model", key.node_name()),
            }
        }
        Self { parts }
    }

    pub fn get(&self, key: PartKey) -> Option<NodeId> {
        self.parts.get(&key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PartKey, NodeId)> + '_ {
        self.parts.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Material currently in the part's slot
    pub fn material<'a>(&self, graph: &'a SceneGraph, key: PartKey) -> Option<&'a MaterialHandle> {
        graph.node(self.get(key)?)?.mesh().map(|m| m.material())
    }

    /// Point the part's slot at `material`; returns whether the part exists
    pub fn assign(&self, graph: &mut SceneGraph, key: PartKey, material: MaterialHandle) -> bool {
        let Some(mesh) = self
            .get(key)
            .and_then(|id| graph.node_mut(id))
            .and_then(|n| n.mesh_mut())
        else {
            return false;
        };
        mesh.set_material(material);
        true
    }
}

/// Deep copies of each part's as-shipped material
///
/// Captured once after load. The copies are private allocations, so nothing
/// that edits or repoints the model's own materials can reach them.
#[derive(Debug, Clone, Default)]
pub struct MaterialSnapshot {
    materials: BTreeMap<PartKey, MaterialHandle>,
}

impl MaterialSnapshot {
    pub fn capture(graph: &SceneGraph, parts: &PartRegistry) -> Self {
        let materials = PartKey::ALL
            .into_iter()
            .filter_map(|key| {
                let current = parts.material(graph, key)?;
                Some((key, Material::deep_clone(current)))
            })
            .collect();
        Self { materials }
    }

    pub fn get(&self, key: PartKey) -> Option<&MaterialHandle> {
        self.materials.get(&key)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use super::*;
    use crate::scene::{Mesh, MeshGeometry};

    fn graph_with_parts() -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("Scene", None);
        let shared = Arc::new(Material::standard("shipped"));
        for name in ["Base", "Feet", "Cylinder004"] {
            graph.add_mesh(
                name,
                Some(root),
                Mesh::new(Arc::new(MeshGeometry::cuboid(Vec3::ONE)), shared.clone()),
            );
        }
        // Named group without meshes has no slot
        graph.add_node("VinylBase", Some(root));
        (graph, root)
    }

    #[test]
    fn test_resolve_by_name() {
        let (graph, root) = graph_with_parts();
        let parts = PartRegistry::resolve(&graph, root);
        assert_eq!(parts.len(), 3);
        assert!(parts.get(PartKey::Needle).is_some());
        assert!(parts.get(PartKey::VinylBase).is_none());
    }

    #[test]
    fn test_snapshot_is_a_private_copy() {
        let (mut graph, root) = graph_with_parts();
        let parts = PartRegistry::resolve(&graph, root);
        let snapshot = MaterialSnapshot::capture(&graph, &parts);

        let shipped = parts.material(&graph, PartKey::Base).unwrap().clone();
        let copy = snapshot.get(PartKey::Base).unwrap().clone();
        assert!(!Arc::ptr_eq(&shipped, &copy));
        assert_eq!(*shipped, *copy);

        parts.assign(&mut graph, PartKey::Base, Arc::new(Material::standard("gold")));
        assert_eq!(snapshot.get(PartKey::Base).unwrap().name, "shipped");
    }

    #[test]
    fn test_assign_missing_part() {
        let (mut graph, root) = graph_with_parts();
        let parts = PartRegistry::resolve(&graph, root);
        assert!(!parts.assign(&mut graph, PartKey::VinylBase, Arc::new(Material::standard("x"))));
    }
}
