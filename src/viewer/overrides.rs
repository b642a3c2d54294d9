//! Active per-part overrides

use std::collections::BTreeMap;

use crate::materials::{CustomOverride, MaterialSnapshot, PartKey};
use crate::scene::MaterialHandle;

/// Overrides layered over the active preset, at most one per part
#[derive(Debug, Clone, Default)]
pub struct OverrideSet {
    overrides: BTreeMap<PartKey, CustomOverride>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `choice` for `part`, replacing any earlier one
    pub fn set(&mut self, part: PartKey, choice: CustomOverride) {
        self.overrides.insert(part, choice);
    }

    pub fn remove(&mut self, part: PartKey) -> Option<CustomOverride> {
        self.overrides.remove(&part)
    }

    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    pub fn get(&self, part: PartKey) -> Option<&CustomOverride> {
        self.overrides.get(&part)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Material an override points a part at
    ///
    /// `Original` resolves through the snapshot and yields `None` when the
    /// part had no shipped material.
    pub fn resolve(
        choice: &CustomOverride,
        part: PartKey,
        snapshot: &MaterialSnapshot,
    ) -> Option<MaterialHandle> {
        match choice {
            CustomOverride::Original => snapshot.get(part).cloned(),
            CustomOverride::Material(material) => Some(material.clone()),
        }
    }

    /// Every override with its resolved material, in part order
    pub fn resolved<'a>(
        &'a self,
        snapshot: &'a MaterialSnapshot,
    ) -> impl Iterator<Item = (PartKey, MaterialHandle)> + 'a {
        self.overrides
            .iter()
            .filter_map(move |(part, choice)| Some((*part, Self::resolve(choice, *part, snapshot)?)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::scene::Material;

    #[test]
    fn test_latest_override_wins() {
        let mut set = OverrideSet::new();
        let gold = Arc::new(Material::standard("gold"));
        set.set(PartKey::Feet, CustomOverride::Original);
        set.set(PartKey::Feet, CustomOverride::Material(gold.clone()));
        assert_eq!(set.len(), 1);

        let resolved: Vec<_> = set.resolved(&MaterialSnapshot::default()).collect();
        assert_eq!(resolved.len(), 1);
        assert!(Arc::ptr_eq(&resolved[0].1, &gold));
    }

    #[test]
    fn test_original_without_snapshot_is_skipped() {
        let mut set = OverrideSet::new();
        set.set(PartKey::Base, CustomOverride::Original);
        assert_eq!(set.resolved(&MaterialSnapshot::default()).count(), 0);
        assert!(set.remove(PartKey::Base).is_some());
        assert!(set.is_empty());
    }
}
