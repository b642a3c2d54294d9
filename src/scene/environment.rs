//! Scene container: node graph, environment lighting, background, lights

use std::sync::Arc;

use glam::Vec3;

use super::graph::{NodeId, NodeOffset, SceneGraph};
use super::material::Color;

/// How an environment image wraps around the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvironmentMapping {
    /// Latitude/longitude panorama
    #[default]
    Equirectangular,
}

/// Decoded high-dynamic-range environment image
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    pub width: u32,
    pub height: u32,
    /// Linear RGBA texels, row-major, top row first
    pub texels: Vec<[f32; 4]>,
    pub mapping: EnvironmentMapping,
}

impl EnvironmentMap {
    /// Mean radiance over the whole panorama, used as flat ambient light
    pub fn average_radiance(&self) -> Color {
        if self.texels.is_empty() {
            return Color::BLACK;
        }
        let sum = self
            .texels
            .iter()
            .fold(Vec3::ZERO, |acc, t| acc + Vec3::new(t[0], t[1], t[2]));
        let mean = sum / self.texels.len() as f32;
        Color::rgb(mean.x, mean.y, mean.z)
    }
}

/// Omnidirectional light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

impl PointLight {
    pub fn new(color: Color, intensity: f32, position: Vec3) -> Self {
        Self {
            color,
            intensity,
            position,
        }
    }
}

/// Everything the renderer draws
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub graph: SceneGraph,
    /// Image-based lighting source, absent when the environment failed to load
    pub environment: Option<Arc<EnvironmentMap>>,
    /// Clear color; `None` leaves the renderer default
    pub background: Option<Color>,
    pub lights: Vec<PointLight>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    /// Move a loaded model graph into the scene
    ///
    /// Returns the offset for ids that referred to the model graph.
    pub fn add_model(&mut self, model: SceneGraph) -> NodeOffset {
        self.graph.append(model)
    }

    /// Number of mesh nodes currently in the scene
    pub fn mesh_count(&self) -> usize {
        self.graph.mesh_nodes().count()
    }

    /// Root of the first appended model, if any
    pub fn first_root(&self) -> Option<NodeId> {
        self.graph.roots().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_radiance() {
        let env = EnvironmentMap {
            width: 2,
            height: 1,
            texels: vec![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]],
            mapping: EnvironmentMapping::Equirectangular,
        };
        assert_eq!(env.average_radiance(), Color::rgb(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_new_scene_is_bare() {
        let scene = Scene::new();
        assert!(scene.environment.is_none());
        assert!(scene.background.is_none());
        assert_eq!(scene.mesh_count(), 0);
    }
}
