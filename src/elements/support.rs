//! Support conditions

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, Named, SortKey};
use crate::ids::{EntityKind, SupportId};

/// A named set of nodal restraints, shared by any number of nodes
///
/// Each flag is `true` when the degree of freedom is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Support {
    pub(crate) id: SupportId,
    pub(crate) name: String,
    /// Restrained in X translation
    pub ux: bool,
    /// Restrained in Y translation
    pub uy: bool,
    /// Restrained in Z translation
    pub uz: bool,
    /// Restrained in X rotation
    pub rx: bool,
    /// Restrained in Y rotation
    pub ry: bool,
    /// Restrained in Z rotation
    pub rz: bool,
}

impl Support {
    /// Create a new support with no restraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fully fixed support (all DOFs restrained)
    pub fn fixed() -> Self {
        Self::with_restraints(true, true, true, true, true, true)
    }

    /// Create a pinned support (translations restrained, rotations free)
    pub fn pinned() -> Self {
        Self::with_restraints(true, true, true, false, false, false)
    }

    /// Create a roller support (X translation restrained only)
    pub fn roller_x() -> Self {
        Self::with_restraints(true, false, false, false, false, false)
    }

    /// Create a roller support (Y translation restrained only)
    pub fn roller_y() -> Self {
        Self::with_restraints(false, true, false, false, false, false)
    }

    /// Create a roller support (Z translation restrained only)
    pub fn roller_z() -> Self {
        Self::with_restraints(false, false, true, false, false, false)
    }

    /// Create a support with specific restraints
    pub fn with_restraints(ux: bool, uy: bool, uz: bool, rx: bool, ry: bool, rz: bool) -> Self {
        Self {
            ux,
            uy,
            uz,
            rx,
            ry,
            rz,
            ..Default::default()
        }
    }

    /// Handle of this support
    pub fn id(&self) -> SupportId {
        self.id
    }

    /// Name of this support
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Translational restraint flags [UX, UY, UZ]
    pub fn translations(&self) -> [bool; 3] {
        [self.ux, self.uy, self.uz]
    }
}

impl Default for Support {
    fn default() -> Self {
        Self {
            id: SupportId(0),
            name: String::new(),
            ux: false,
            uy: false,
            uz: false,
            rx: false,
            ry: false,
            rz: false,
        }
    }
}

impl CatalogEntry for Support {
    type Id = SupportId;
    const KIND: EntityKind = EntityKind::Support;

    fn id(&self) -> SupportId {
        self.id
    }

    fn sort_key(&self) -> SortKey<'_> {
        SortKey::Name(&self.name)
    }
}

impl Named for Support {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
