//! Turntable Viewer Library
//!
//! Interactive 3D product viewer for a record turntable: loads a GLB model and
//! an HDR environment, orbits the camera, plays part animations on click and
//! swaps part materials through presets or per-part overrides.

pub mod animation;
pub mod assets;
pub mod audio;
pub mod materials;
pub mod raycast;
pub mod render;
pub mod scene;
pub mod settings;
pub mod shaders;
pub mod telemetry;
pub mod viewer;

pub use assets::{AssetError, AssetLoader, FileAssetLoader};
pub use materials::{MaterialLibrary, PartKey, DEFAULT_PRESET};
pub use render::WgpuSurface;
pub use settings::{SettingsError, ViewerSettings};
pub use viewer::{LayoutBox, RenderSurface, Viewer, ViewerError, ViewerOptions};
