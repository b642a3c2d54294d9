//! Built-in material catalog and per-part choices

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::scene::{Color, Material, MaterialHandle, Side, TextureRef};

use super::overrides::CustomOverride;
use super::parts::PartKey;
use super::preset::{builtin_presets, Preset, PRESET_ORDER};

/// Swatch shown next to a material in host UIs
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    /// CSS-style hex color, e.g. `#d4b47a`
    Color(&'static str),
    Image(PathBuf),
}

/// A named, shared library material
#[derive(Debug, Clone)]
pub struct LibraryMaterial {
    pub id: &'static str,
    pub label: &'static str,
    pub short_label: &'static str,
    pub material: MaterialHandle,
    pub preview: Preview,
}

/// What choosing an option does to a part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Restore the as-shipped material
    Original,
    /// Use the library material with the option's id
    Material,
}

/// One entry of a part's customization menu
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialOption {
    pub id: &'static str,
    pub kind: OptionKind,
    pub label: &'static str,
    pub short_label: &'static str,
}

impl MaterialOption {
    pub const ORIGINAL_ID: &'static str = "original";

    fn original() -> Self {
        Self {
            id: Self::ORIGINAL_ID,
            kind: OptionKind::Original,
            label: "Original do modelo",
            short_label: "Original",
        }
    }

    fn from_material(entry: &LibraryMaterial) -> Self {
        Self {
            id: entry.id,
            kind: OptionKind::Material,
            label: entry.label,
            short_label: entry.short_label,
        }
    }

    /// Override this option stands for; `None` if the material id is not in `library`
    pub fn to_override(&self, library: &MaterialLibrary) -> Option<CustomOverride> {
        match self.kind {
            OptionKind::Original => Some(CustomOverride::Original),
            OptionKind::Material => library
                .material(self.id)
                .map(|m| CustomOverride::Material(m.clone())),
        }
    }
}

/// Materials, presets and per-part options, declared once at startup
///
/// Every preset and option refers to the same [`MaterialHandle`] instances
/// held here.
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    materials: Vec<LibraryMaterial>,
    presets: Vec<Preset>,
    options: BTreeMap<PartKey, Vec<MaterialOption>>,
}

impl MaterialLibrary {
    /// The shipped catalog; texture and thumbnail paths resolve under `texture_root`
    pub fn builtin(texture_root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = texture_root.into();
        let materials = builtin_materials(&root);
        let presets = builtin_presets(&root, &materials);

        let mut library = Self {
            materials,
            presets,
            options: BTreeMap::new(),
        };
        let menus: [(PartKey, &[&str]); 4] = [
            (PartKey::Base, &["marble", "wood", "plastic"]),
            (PartKey::Feet, &["gold", "copper", "chrome"]),
            (PartKey::Needle, &["gold", "chrome", "copper"]),
            (PartKey::VinylBase, &["marble", "wood", "gold", "plastic"]),
        ];
        for (part, ids) in menus {
            let mut options = vec![MaterialOption::original()];
            options.extend(
                ids.iter()
                    .filter_map(|id| library.entry(id))
                    .map(MaterialOption::from_material),
            );
            library.options.insert(part, options);
        }
        library
    }

    pub fn entries(&self) -> &[LibraryMaterial] {
        &self.materials
    }

    pub fn entry(&self, id: &str) -> Option<&LibraryMaterial> {
        self.materials.iter().find(|m| m.id == id)
    }

    /// Shared handle of a library material
    pub fn material(&self, id: &str) -> Option<&MaterialHandle> {
        self.entry(id).map(|m| &m.material)
    }

    pub fn preset(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Presets in menu order
    pub fn presets(&self) -> impl Iterator<Item = &Preset> + '_ {
        PRESET_ORDER.iter().filter_map(|id| self.preset(id))
    }

    pub fn custom_options(&self, part: PartKey) -> &[MaterialOption] {
        self.options.get(&part).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find a part's option by id
    pub fn custom_option(&self, part: PartKey, id: &str) -> Option<&MaterialOption> {
        self.custom_options(part).iter().find(|o| o.id == id)
    }
}

fn builtin_materials(root: &Path) -> Vec<LibraryMaterial> {
    let marble_dir = root.join("materials/Comb1/Marble");
    let gold_dir = root.join("materials/Comb1/Gold");
    let images = root.join("images");

    let entry = |id, label, short_label, material: Material, preview| LibraryMaterial {
        id,
        label,
        short_label,
        material: Arc::new(material),
        preview,
    };

    vec![
        entry(
            "marble",
            "Mármore Carrara",
            "Mármore",
            Material::standard("marble")
                .with_map(TextureRef::srgb(marble_dir.join("Marble012_1K-JPG_Color.jpg")))
                .with_normal_map(TextureRef::linear(marble_dir.join("Marble012_1K-JPG_NormalGL.jpg")))
                .with_roughness_map(TextureRef::linear(marble_dir.join("Marble012_1K-JPG_Roughness.jpg")))
                .with_roughness(0.5)
                .with_side(Side::Double),
            Preview::Image(images.join("Marble.png")),
        ),
        entry(
            "gold",
            "Ouro escovado",
            "Ouro",
            Material::standard("gold")
                .with_map(TextureRef::srgb(gold_dir.join("Metal042A_1K-JPG_Color.jpg")))
                .with_normal_map(TextureRef::linear(gold_dir.join("Metal042A_1K-JPG_NormalGL.jpg")))
                .with_roughness_map(TextureRef::linear(gold_dir.join("Metal042A_1K-JPG_Roughness.jpg")))
                .with_metalness_map(TextureRef::linear(gold_dir.join("Metal042A_1K-JPG_Metalness.jpg")))
                .with_roughness(0.5)
                .with_metalness(0.7)
                .with_side(Side::Double),
            Preview::Color("#d4b47a"),
        ),
        entry(
            "chrome",
            "Cromado",
            "Chrome",
            flat("chrome", 0xcccccc, 0.1, 1.0),
            Preview::Color("#dfe4ed"),
        ),
        entry(
            "copper",
            "Cobre vintage",
            "Cobre",
            flat("copper", 0xb87333, 0.3, 0.9),
            Preview::Color("#b56a39"),
        ),
        entry(
            "wood",
            "Madeira natural",
            "Madeira",
            flat("wood", 0x8b4513, 0.8, 0.0),
            Preview::Image(images.join("Wood.png")),
        ),
        entry(
            "plastic",
            "Preto acetinado",
            "Preto",
            flat("plastic", 0x333333, 0.6, 0.1),
            Preview::Color("#2f2f2f"),
        ),
    ]
}

/// Untextured double-sided material
fn flat(name: &str, hex: u32, roughness: f32, metalness: f32) -> Material {
    Material::standard(name)
        .with_color(Color::from_hex(hex))
        .with_roughness(roughness)
        .with_metalness(metalness)
        .with_side(Side::Double)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let library = MaterialLibrary::builtin("assets");
        let ids: Vec<_> = library.entries().iter().map(|m| m.id).collect();
        assert_eq!(ids, ["marble", "gold", "chrome", "copper", "wood", "plastic"]);

        let gold = library.material("gold").unwrap();
        assert_eq!(gold.metalness, 0.7);
        assert_eq!(gold.side, Side::Double);
        assert_eq!(
            gold.map.as_ref().unwrap().path,
            Path::new("assets/materials/Comb1/Gold/Metal042A_1K-JPG_Color.jpg")
        );
        assert!(library.material("velvet").is_none());
    }

    #[test]
    fn test_part_menus_start_with_original() {
        let library = MaterialLibrary::builtin("assets");
        let ids: Vec<_> = library
            .custom_options(PartKey::VinylBase)
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, ["original", "marble", "wood", "gold", "plastic"]);

        let feet = library.custom_options(PartKey::Feet);
        assert_eq!(feet[0].kind, OptionKind::Original);
        assert_eq!(feet[0].short_label, "Original");
        assert_eq!(feet[1].label, "Ouro escovado");
    }

    #[test]
    fn test_option_to_override_shares_library_material() {
        let library = MaterialLibrary::builtin("assets");
        let chrome = library.custom_option(PartKey::Needle, "chrome").unwrap();
        match chrome.to_override(&library) {
            Some(CustomOverride::Material(handle)) => {
                assert!(Arc::ptr_eq(&handle, library.material("chrome").unwrap()));
            }
            other => panic!("unexpected override {other:?}"),
        }

        let original = library.custom_option(PartKey::Needle, "original").unwrap();
        assert_eq!(original.to_override(&library), Some(CustomOverride::Original));
        assert!(library.custom_option(PartKey::Needle, "wood").is_none());
    }
}
