//! Asset loading
//!
//! The viewer asks an [`AssetLoader`] for two things: a model (scene graph
//! plus embedded clips) and an equirectangular environment map. Both requests
//! are futures so the viewer can run them concurrently and join them.

pub mod gltf;
pub mod hdri;

use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;
use glam::Vec3;

use crate::animation::AnimationClip;
use crate::scene::{EnvironmentMap, SceneGraph};

pub use self::gltf::import_model;
pub use hdri::decode_environment;

/// Errors that can occur while loading assets
#[derive(Debug)]
pub enum AssetError {
    /// Reading the file failed
    Io(std::io::Error),
    /// The model could not be parsed
    Gltf(::gltf::Error),
    /// The environment image could not be decoded
    Image(image::ImageError),
    /// The model file has no scene to instantiate
    MissingScene,
    /// The background task ended before producing a result
    Cancelled,
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Io(e) => write!(f, "IO error: {}", e),
            AssetError::Gltf(e) => write!(f, "glTF error: {}", e),
            AssetError::Image(e) => write!(f, "Image decode error: {}", e),
            AssetError::MissingScene => write!(f, "Model contains no scene"),
            AssetError::Cancelled => write!(f, "Load task was cancelled"),
        }
    }
}

impl std::error::Error for AssetError {}

impl From<std::io::Error> for AssetError {
    fn from(e: std::io::Error) -> Self {
        AssetError::Io(e)
    }
}

impl From<::gltf::Error> for AssetError {
    fn from(e: ::gltf::Error) -> Self {
        AssetError::Gltf(e)
    }
}

impl From<image::ImageError> for AssetError {
    fn from(e: image::ImageError) -> Self {
        AssetError::Image(e)
    }
}

/// Placement and content options for a model load
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptions {
    /// Uniform scale applied to the model root
    pub scale: f32,
    /// Translation applied to the model root
    pub position: Vec3,
    /// Whether to import embedded animation clips
    pub with_animations: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position: Vec3::ZERO,
            with_animations: true,
        }
    }
}

impl ModelOptions {
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_animations(mut self, with_animations: bool) -> Self {
        self.with_animations = with_animations;
        self
    }
}

/// Result of a model load
#[derive(Debug, Clone, Default)]
pub struct LoadedModel {
    /// Model hierarchy; its first root is the model root
    pub graph: SceneGraph,
    /// Embedded clips, targeting ids of `graph`
    pub clips: Vec<AnimationClip>,
}

/// Source of models and environment maps
pub trait AssetLoader: Send + Sync {
    /// Load an equirectangular environment map by identifier
    fn load_environment(&self, id: &str) -> BoxFuture<'static, Result<EnvironmentMap, AssetError>>;

    /// Load a model by identifier
    fn load_model(
        &self,
        id: &str,
        options: ModelOptions,
    ) -> BoxFuture<'static, Result<LoadedModel, AssetError>>;
}

/// Loads assets from files below a root directory
///
/// Reads and decodes on tokio's blocking pool so the caller's runtime
/// threads stay free.
#[derive(Debug, Clone)]
pub struct FileAssetLoader {
    root: PathBuf,
}

impl FileAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, id: &str) -> PathBuf {
        let path = Path::new(id);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl AssetLoader for FileAssetLoader {
    fn load_environment(&self, id: &str) -> BoxFuture<'static, Result<EnvironmentMap, AssetError>> {
        let path = self.resolve(id);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                let bytes = std::fs::read(&path)?;
                let env = decode_environment(&bytes)?;
                tracing::info!(
                    "Loaded environment {} ({}x{})",
                    path.display(),
                    env.width,
                    env.height
                );
                Ok(env)
            })
            .await
            .map_err(|_| AssetError::Cancelled)?
        })
    }

    fn load_model(
        &self,
        id: &str,
        options: ModelOptions,
    ) -> BoxFuture<'static, Result<LoadedModel, AssetError>> {
        let path = self.resolve(id);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                let bytes = std::fs::read(&path)?;
                let model = import_model(&bytes, path.parent(), &options)?;
                tracing::info!(
                    "Loaded model {} ({} nodes, {} clips)",
                    path.display(),
                    model.graph.len(),
                    model.clips.len()
                );
                Ok(model)
            })
            .await
            .map_err(|_| AssetError::Cancelled)?
        })
    }
}
