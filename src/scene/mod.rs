//! Scene graph and scene-level state
//!
//! Holds the node hierarchy produced by the asset loaders, the material
//! handles assigned to mesh slots, the perspective camera with its orbit
//! controls, and the environment/background/lights container the renderer
//! draws from.

pub mod camera;
pub mod environment;
pub mod geometry;
pub mod graph;
pub mod material;

pub use camera::{OrbitControls, PerspectiveCamera};
pub use environment::{EnvironmentMap, EnvironmentMapping, PointLight, Scene};
pub use geometry::{Aabb, MeshGeometry, Ray};
pub use graph::{Mesh, Node, NodeId, NodeOffset, SceneGraph, Transform};
pub use material::{AlphaMode, Color, ColorSpace, Material, MaterialHandle, Side, TextureRef};
