//! Per-part override descriptors

use crate::scene::MaterialHandle;

/// A user's choice for one part, layered over the active preset
///
/// Having no override for a part means "follow the preset".
#[derive(Debug, Clone, PartialEq)]
pub enum CustomOverride {
    /// Restore the part's snapshot material
    Original,
    /// Point the part at this library material
    Material(MaterialHandle),
}
