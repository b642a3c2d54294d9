//! Surface appearance definitions
//!
//! A [`Material`] is a plain value. Once it is wrapped in a [`MaterialHandle`]
//! it is shared read-only; mesh slots are repointed, never edited through.

use std::path::PathBuf;
use std::sync::Arc;

/// Shared, read-only material reference
pub type MaterialHandle = Arc<Material>;

/// Linear RGB color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a `0xRRGGBB` sRGB value, converting to linear
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self::rgb(channel(16), channel(8), channel(0))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// How texel values of a texture are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// Color data (base color maps)
    Srgb,
    /// Non-color data (normal, roughness, metalness maps)
    #[default]
    Linear,
}

/// Reference to a texture image by path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub path: PathBuf,
    pub color_space: ColorSpace,
}

impl TextureRef {
    pub fn srgb(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            color_space: ColorSpace::Srgb,
        }
    }

    pub fn linear(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            color_space: ColorSpace::Linear,
        }
    }
}

/// Which faces are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// How the alpha channel is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

/// Physically based surface parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: Color,
    pub map: Option<TextureRef>,
    pub normal_map: Option<TextureRef>,
    pub roughness_map: Option<TextureRef>,
    pub metalness_map: Option<TextureRef>,
    pub roughness: f32,
    pub metalness: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub depth_write: bool,
    pub alpha_mode: AlphaMode,
    pub transmission: f32,
    pub side: Side,
}

impl Material {
    /// White, fully rough, non-metallic, opaque
    pub fn standard(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Color::WHITE,
            map: None,
            normal_map: None,
            roughness_map: None,
            metalness_map: None,
            roughness: 1.0,
            metalness: 0.0,
            opacity: 1.0,
            transparent: false,
            depth_write: true,
            alpha_mode: AlphaMode::Opaque,
            transmission: 0.0,
            side: Side::Front,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_map(mut self, map: TextureRef) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_normal_map(mut self, map: TextureRef) -> Self {
        self.normal_map = Some(map);
        self
    }

    pub fn with_roughness_map(mut self, map: TextureRef) -> Self {
        self.roughness_map = Some(map);
        self
    }

    pub fn with_metalness_map(mut self, map: TextureRef) -> Self {
        self.metalness_map = Some(map);
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness.clamp(0.0, 1.0);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_alpha_mode(mut self, alpha_mode: AlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    pub fn with_transmission(mut self, transmission: f32) -> Self {
        self.transmission = transmission.clamp(0.0, 1.0);
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Whether the surface lets anything behind it show through
    pub fn needs_blending(&self) -> bool {
        self.opacity < 1.0 || self.alpha_mode == AlphaMode::Blend || self.transmission > 0.0
    }

    /// Mark partially opaque, blended or transmissive materials as
    /// transparent with depth writes off
    pub fn normalize_transparency(&mut self) {
        if self.needs_blending() {
            self.transparent = true;
            self.depth_write = false;
        }
    }

    /// Copy that owns its own allocation
    ///
    /// Used for snapshots so later slot reassignments can't alias the copy.
    pub fn deep_clone(handle: &MaterialHandle) -> MaterialHandle {
        Arc::new(Material::clone(handle))
    }
}
