//! Stable handles into the model catalogs
//!
//! Entities never hold references to each other, only these handles. A
//! handle stays valid across renames and is never handed out twice by the
//! same catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six kinds of entities owned by a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Support,
    Release,
    Section,
    Material,
    Node,
    Bar,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Support => "support",
            EntityKind::Release => "release",
            EntityKind::Section => "section",
            EntityKind::Material => "material",
            EntityKind::Node => "node",
            EntityKind::Bar => "bar",
        };
        f.write_str(name)
    }
}

/// Conversion between a handle and its raw number
pub trait Handle: Copy + Ord + std::hash::Hash + fmt::Debug + fmt::Display {
    fn from_raw(raw: u32) -> Self;
    fn raw(self) -> u32;
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl Handle for $name {
            fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Handle of a support in the support catalog
    SupportId
);
entity_id!(
    /// Handle of a release in the release catalog
    ReleaseId
);
entity_id!(
    /// Handle of a section in the section catalog
    SectionId
);
entity_id!(
    /// Handle of a material in the material catalog
    MaterialId
);
entity_id!(
    /// Numeric id of a node, preserved verbatim across save/load
    NodeId
);
entity_id!(
    /// Numeric id of a bar, preserved verbatim across save/load
    BarId
);

/// A handle to any entity of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Support(SupportId),
    Release(ReleaseId),
    Section(SectionId),
    Material(MaterialId),
    Node(NodeId),
    Bar(BarId),
}

impl EntityRef {
    /// Kind of the referenced entity
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Support(_) => EntityKind::Support,
            EntityRef::Release(_) => EntityKind::Release,
            EntityRef::Section(_) => EntityKind::Section,
            EntityRef::Material(_) => EntityKind::Material,
            EntityRef::Node(_) => EntityKind::Node,
            EntityRef::Bar(_) => EntityKind::Bar,
        }
    }
}
