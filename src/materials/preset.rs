//! Whole-model material presets

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scene::MaterialHandle;

use super::library::LibraryMaterial;
use super::parts::PartKey;

/// Id of the preset that restores the as-shipped materials
pub const DEFAULT_PRESET: &str = "default";

/// Menu order of the built-in presets
pub const PRESET_ORDER: [&str; 4] = [DEFAULT_PRESET, "luxo", "moderno", "vintage"];

/// A named bundle assigning one material to each customizable part
#[derive(Debug, Clone)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub thumbnail: PathBuf,
    /// `None` means every part falls back to its snapshot material
    pub materials: Option<HashMap<PartKey, MaterialHandle>>,
}

impl Preset {
    /// The preset's material for `part`, if it carries a payload for it
    pub fn material(&self, part: PartKey) -> Option<&MaterialHandle> {
        self.materials.as_ref()?.get(&part)
    }

    /// Whether this preset restores snapshot materials
    pub fn uses_snapshot(&self) -> bool {
        self.id == DEFAULT_PRESET || self.materials.is_none()
    }
}

pub(crate) fn builtin_presets(root: &Path, materials: &[LibraryMaterial]) -> Vec<Preset> {
    let images = root.join("images");
    let lookup = |id: &str| {
        let found = materials.iter().find(|m| m.id == id).map(|m| m.material.clone());
        if found.is_none() {
            tracing::warn!("Preset references unknown material {}", id);
        }
        found
    };
    // Base gets one material, the three accent parts share another
    let bundle = |base: &str, accent: &str| {
        let mut parts = HashMap::new();
        if let Some(m) = lookup(base) {
            parts.insert(PartKey::Base, m);
        }
        if let Some(m) = lookup(accent) {
            for part in [PartKey::Feet, PartKey::Needle, PartKey::VinylBase] {
                parts.insert(part, m.clone());
            }
        }
        Some(parts)
    };

    vec![
        Preset {
            id: DEFAULT_PRESET,
            name: "Original",
            description: "Material original do modelo",
            thumbnail: images.join("Wood.png"),
            materials: None,
        },
        Preset {
            id: "luxo",
            name: "Luxo",
            description: "Mármore e Ouro",
            thumbnail: images.join("Marble.png"),
            materials: bundle("marble", "gold"),
        },
        Preset {
            id: "moderno",
            name: "Moderno",
            description: "Chrome e Plástico",
            thumbnail: images.join("Wood.png"),
            materials: bundle("plastic", "chrome"),
        },
        Preset {
            id: "vintage",
            name: "Vintage",
            description: "Madeira e Cobre",
            thumbnail: images.join("Wood.png"),
            materials: bundle("wood", "copper"),
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::materials::MaterialLibrary;

    #[test]
    fn test_presets_in_menu_order() {
        let library = MaterialLibrary::builtin("assets");
        let ids: Vec<_> = library.presets().map(|p| p.id).collect();
        assert_eq!(ids, PRESET_ORDER);
        assert!(library.preset("festa").is_none());
    }

    #[test]
    fn test_default_preset_has_no_payload() {
        let library = MaterialLibrary::builtin("assets");
        let default = library.preset(DEFAULT_PRESET).unwrap();
        assert!(default.materials.is_none());
        assert!(default.uses_snapshot());
        assert!(default.material(PartKey::Base).is_none());
    }

    #[test]
    fn test_presets_share_library_instances() {
        let library = MaterialLibrary::builtin("assets");
        let gold = library.material("gold").unwrap();
        let luxo = library.preset("luxo").unwrap();

        assert!(Arc::ptr_eq(luxo.material(PartKey::Base).unwrap(), library.material("marble").unwrap()));
        for part in [PartKey::Feet, PartKey::Needle, PartKey::VinylBase] {
            assert!(Arc::ptr_eq(luxo.material(part).unwrap(), gold));
        }

        let moderno = library.preset("moderno").unwrap();
        let vintage = library.preset("vintage").unwrap();
        assert_eq!(moderno.material(PartKey::Feet).unwrap().name, "chrome");
        assert_eq!(vintage.material(PartKey::Base).unwrap().name, "wood");
        assert_eq!(vintage.thumbnail, Path::new("assets/images/Wood.png"));
    }
}
