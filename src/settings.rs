//! Settings management for the turntable viewer
//!
//! Handles loading/saving of the viewer's XML settings file.

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::viewer::ViewerOptions;

/// A 3D position stored as `<x>`, `<y>`, `<z>` children
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSetting {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<PositionSetting> for Vec3 {
    fn from(p: PositionSetting) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

impl From<Vec3> for PositionSetting {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// Viewer settings stored in `settings.xml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "TurntableViewer")]
pub struct ViewerSettings {
    /// Model asset id, relative to the asset root
    #[serde(rename = "modelPath", default = "default_model_path")]
    pub model_path: String,

    /// Radiance HDR environment asset id
    #[serde(rename = "environmentPath", default = "default_environment_path")]
    pub environment_path: String,

    /// Directory library textures and thumbnails live under
    #[serde(rename = "textureRoot", default = "default_texture_root")]
    pub texture_root: String,

    /// Uniform scale applied to the model root
    #[serde(rename = "modelScale", default = "default_model_scale")]
    pub model_scale: f32,

    /// Preset applied once the model is loaded
    #[serde(rename = "initialPreset", default = "default_initial_preset")]
    pub initial_preset: String,

    #[serde(rename = "windowWidth", default = "default_window_width")]
    pub window_width: u32,

    #[serde(rename = "windowHeight", default = "default_window_height")]
    pub window_height: u32,

    /// Tone-mapping exposure
    #[serde(rename = "exposure", default = "default_exposure")]
    pub exposure: f32,

    /// Orbit damping (0-1]
    #[serde(rename = "dampingFactor", default = "default_damping_factor")]
    pub damping_factor: f32,

    #[serde(rename = "cameraPosition", default = "default_camera_position")]
    pub camera_position: PositionSetting,

    /// Start with sound cues muted
    #[serde(rename = "audioMuted", default)]
    pub audio_muted: bool,
}

fn default_model_path() -> String {
    "models/Final.glb".to_string()
}

fn default_environment_path() -> String {
    "textures/hdr/studio_small_09_4k.hdr".to_string()
}

fn default_texture_root() -> String {
    "assets".to_string()
}

fn default_model_scale() -> f32 {
    12.0
}

fn default_initial_preset() -> String {
    crate::materials::DEFAULT_PRESET.to_string()
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    960
}

fn default_exposure() -> f32 {
    1.6
}

fn default_damping_factor() -> f32 {
    0.08
}

fn default_camera_position() -> PositionSetting {
    PositionSetting {
        x: 12.0,
        y: 8.0,
        z: 0.0,
    }
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            environment_path: default_environment_path(),
            texture_root: default_texture_root(),
            model_scale: default_model_scale(),
            initial_preset: default_initial_preset(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            exposure: default_exposure(),
            damping_factor: default_damping_factor(),
            camera_position: default_camera_position(),
            audio_muted: false,
        }
    }
}

impl ViewerSettings {
    /// Replace out-of-range values with usable ones
    pub fn clamp(&mut self) {
        if !(self.model_scale.is_finite() && self.model_scale > 0.0) {
            self.model_scale = default_model_scale();
        }
        if !(self.exposure.is_finite() && self.exposure > 0.0) {
            self.exposure = default_exposure();
        }
        if !(self.damping_factor.is_finite() && self.damping_factor > 0.0) {
            self.damping_factor = default_damping_factor();
        }
        self.damping_factor = self.damping_factor.min(1.0);
        self.window_width = self.window_width.max(1);
        self.window_height = self.window_height.max(1);
    }

    /// Load settings from an XML file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(SettingsError::Io)?;
        let mut settings: Self = from_str(&contents).map_err(SettingsError::XmlParse)?;
        settings.clamp();
        Ok(settings)
    }

    /// Save settings to an XML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        let xml = to_string(self).map_err(SettingsError::XmlWrite)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(SettingsError::Io)?;
        }
        fs::write(path, formatted).map_err(SettingsError::Io)?;
        Ok(())
    }

    /// Get the settings file path in the config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("TurntableViewer");
            p.push("settings.xml");
            p
        })
    }

    /// Load from the config directory, falling back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                tracing::warn!("Failed to load settings from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save to the config directory
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::default_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to_file(&path)
    }

    /// Viewer construction options for these settings
    pub fn viewer_options(&self) -> ViewerOptions {
        ViewerOptions {
            initial_preset: self.initial_preset.clone(),
            model_id: self.model_path.clone(),
            environment_id: self.environment_path.clone(),
            texture_root: PathBuf::from(&self.texture_root),
            model_scale: self.model_scale,
            camera_position: self.camera_position.into(),
            damping_factor: self.damping_factor,
            audio_muted: self.audio_muted,
        }
    }
}

/// Errors that can occur during settings operations
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    XmlParse(quick_xml::DeError),
    XmlWrite(quick_xml::SeError),
    NoConfigDir,
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::XmlParse(e) => write!(f, "XML parse error: {}", e),
            SettingsError::XmlWrite(e) => write!(f, "XML write error: {}", e),
            SettingsError::NoConfigDir => write!(f, "Could not find config directory"),
        }
    }
}

impl std::error::Error for SettingsError {}
