//! Material library, presets and per-part customization
//!
//! Library materials are created once and shared as [`MaterialHandle`]s.
//! Presets and overrides only ever repoint part slots at them.
//!
//! [`MaterialHandle`]: crate::scene::MaterialHandle

pub mod library;
pub mod overrides;
pub mod parts;
pub mod preset;

pub use library::{LibraryMaterial, MaterialLibrary, MaterialOption, OptionKind, Preview};
pub use overrides::CustomOverride;
pub use parts::{MaterialSnapshot, PartKey, PartRegistry};
pub use preset::{Preset, DEFAULT_PRESET, PRESET_ORDER};
