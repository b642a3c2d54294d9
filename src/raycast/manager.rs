//! Pointer picking against registered clickable meshes

use glam::Vec3;

use crate::scene::{NodeId, PerspectiveCamera, Ray, SceneGraph};

use super::pointer::{to_ndc, PointerButton, PointerEvent, Rect};

/// Receiver of click notifications
pub trait ClickTarget {
    fn on_click(&mut self, hit: NodeId);
}

impl<F: FnMut(NodeId)> ClickTarget for F {
    fn on_click(&mut self, hit: NodeId) {
        self(hit)
    }
}

/// Nearest intersection of a pick ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The mesh node that was hit
    pub node: NodeId,
    /// World-space distance from the camera
    pub distance: f32,
    pub point: Vec3,
}

/// Owns the clickable mesh list and resolves pointer-downs into hits
#[derive(Debug, Clone, Default)]
pub struct RaycastManager {
    clickables: Vec<NodeId>,
    disposed: bool,
}

impl RaycastManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh, or every mesh below a group node
    pub fn add_clickable_object(&mut self, graph: &SceneGraph, node: NodeId) {
        if self.disposed {
            return;
        }
        for mesh in graph.mesh_descendants(node) {
            if !self.clickables.contains(&mesh) {
                self.clickables.push(mesh);
            }
        }
    }

    pub fn clear_clickable_objects(&mut self) {
        self.clickables.clear();
    }

    pub fn clickable_count(&self) -> usize {
        self.clickables.len()
    }

    pub fn clickables(&self) -> &[NodeId] {
        &self.clickables
    }

    /// Cast a ray through the event position and return the nearest hit
    pub fn pick(
        &self,
        event: &PointerEvent,
        bounds: Rect,
        camera: &PerspectiveCamera,
        graph: &SceneGraph,
    ) -> Option<RaycastHit> {
        if self.disposed {
            return None;
        }
        let ndc = to_ndc(event.client_x, event.client_y, bounds)?;
        let inv_view_proj = camera.view_projection_matrix().inverse();
        let ray = Ray::from_ndc(camera.position, ndc.x, ndc.y, inv_view_proj);

        self.clickables
            .iter()
            .filter_map(|&node| {
                let mesh = graph.node(node)?.mesh()?;
                let distance = mesh.geometry().intersect_ray(&ray, graph.world_matrix(node))?;
                Some(RaycastHit {
                    node,
                    distance,
                    point: ray.point_at(distance),
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Handle a pointer-down: primary button only, at most one callback
    ///
    /// Returns whether `target` was notified.
    pub fn handle_pointer_down(
        &self,
        event: &PointerEvent,
        bounds: Rect,
        camera: &PerspectiveCamera,
        graph: &SceneGraph,
        target: &mut impl ClickTarget,
    ) -> bool {
        if event.button != PointerButton::Primary {
            return false;
        }
        let Some(hit) = self.pick(event, bounds, camera, graph) else {
            return false;
        };
        tracing::debug!(
            "Picked {} at distance {:.3}",
            graph
                .node(hit.node)
                .map(|n| n.name.as_str())
                .filter(|n| !n.is_empty())
                .unwrap_or("(unnamed)"),
            hit.distance
        );
        target.on_click(hit.node);
        true
    }

    /// Stop handling events and forget every clickable
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.clear_clickable_objects();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::scene::{Material, Mesh, MeshGeometry};

    fn cube() -> Mesh {
        Mesh::new(
            Arc::new(MeshGeometry::cuboid(Vec3::splat(0.5))),
            Arc::new(Material::standard("grey")),
        )
    }

    /// Camera on +Z looking at two cubes lined up along the view axis
    fn setup() -> (SceneGraph, PerspectiveCamera, NodeId, NodeId, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("Scene", None);
        let near = graph.add_mesh("Near", Some(root), cube());
        graph.node_mut(near).unwrap().transform.translation = Vec3::new(0.0, 0.0, 2.0);
        let far = graph.add_mesh("Far", Some(root), cube());

        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 1000.0);
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        camera.look_at(Vec3::ZERO);
        (graph, camera, root, near, far)
    }

    #[test]
    fn test_add_group_registers_mesh_descendants() {
        let (graph, _, root, near, far) = setup();
        let mut raycast = RaycastManager::new();
        raycast.add_clickable_object(&graph, root);
        raycast.add_clickable_object(&graph, near);
        assert_eq!(raycast.clickables(), &[near, far]);
    }

    #[test]
    fn test_nearest_hit_wins_single_callback() {
        let (graph, camera, root, near, _) = setup();
        let mut raycast = RaycastManager::new();
        raycast.add_clickable_object(&graph, root);

        let mut hits = Vec::new();
        let handled = raycast.handle_pointer_down(
            &PointerEvent::primary(50.0, 50.0),
            Rect::sized(100.0, 100.0),
            &camera,
            &graph,
            &mut |id: NodeId| hits.push(id),
        );
        assert!(handled);
        assert_eq!(hits, vec![near]);
    }

    #[test]
    fn test_miss_never_calls_back() {
        let (graph, camera, root, _, _) = setup();
        let mut raycast = RaycastManager::new();
        raycast.add_clickable_object(&graph, root);

        let mut calls = 0;
        let handled = raycast.handle_pointer_down(
            &PointerEvent::primary(2.0, 2.0),
            Rect::sized(100.0, 100.0),
            &camera,
            &graph,
            &mut |_: NodeId| calls += 1,
        );
        assert!(!handled);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_non_primary_button_ignored() {
        let (graph, camera, root, _, _) = setup();
        let mut raycast = RaycastManager::new();
        raycast.add_clickable_object(&graph, root);

        let event = PointerEvent {
            client_x: 50.0,
            client_y: 50.0,
            button: PointerButton::Secondary,
        };
        let mut calls = 0;
        raycast.handle_pointer_down(&event, Rect::sized(100.0, 100.0), &camera, &graph, &mut |_: NodeId| {
            calls += 1
        });
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_disposed_manager_ignores_events() {
        let (graph, camera, root, _, _) = setup();
        let mut raycast = RaycastManager::new();
        raycast.add_clickable_object(&graph, root);
        raycast.dispose();

        assert_eq!(raycast.clickable_count(), 0);
        let hit = raycast.pick(&PointerEvent::primary(50.0, 50.0), Rect::sized(100.0, 100.0), &camera, &graph);
        assert!(hit.is_none());
    }

    #[test]
    fn test_hit_distance_and_point() {
        let (graph, camera, root, near, _) = setup();
        let mut raycast = RaycastManager::new();
        raycast.add_clickable_object(&graph, root);

        let hit = raycast
            .pick(&PointerEvent::primary(50.0, 50.0), Rect::sized(100.0, 100.0), &camera, &graph)
            .unwrap();
        assert_eq!(hit.node, near);
        assert!((hit.distance - 7.5).abs() < 1e-3);
        assert!((hit.point.z - 2.5).abs() < 1e-3);
    }
}
