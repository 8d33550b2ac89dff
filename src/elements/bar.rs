//! Bar element - 3D frame element (beam/column)

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, SortKey};
use crate::ids::{BarId, EntityKind, MaterialId, NodeId, ReleaseId, SectionId};

/// A straight frame element between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub(crate) id: BarId,
    /// Start node
    pub start: NodeId,
    /// End node
    pub end: NodeId,
    /// Cross-section
    pub section: SectionId,
    /// Material
    pub material: MaterialId,
    /// Rotation about longitudinal axis (radians)
    pub rotation: f64,
    /// End releases, fully fixed when absent
    pub release: Option<ReleaseId>,
    /// Interior nodes, sorted by relative position
    pub(crate) interior: Vec<NodeId>,
}

impl Bar {
    /// Create a new bar
    pub fn new(start: NodeId, end: NodeId, section: SectionId, material: MaterialId) -> Self {
        Self {
            id: BarId(0),
            start,
            end,
            section,
            material,
            rotation: 0.0,
            release: None,
            interior: Vec::new(),
        }
    }

    /// Set bar rotation about its longitudinal axis
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set bar end releases
    pub fn with_release(mut self, release: ReleaseId) -> Self {
        self.release = Some(release);
        self
    }

    /// Id of this bar
    pub fn id(&self) -> BarId {
        self.id
    }

    /// Interior nodes, in ascending relative position
    pub fn interior(&self) -> &[NodeId] {
        &self.interior
    }

    /// Number of sub-elements the bar is split into
    pub fn discretization(&self) -> usize {
        self.interior.len() + 1
    }

    /// Start, end and interior nodes
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        [self.start, self.end]
            .into_iter()
            .chain(self.interior.iter().copied())
    }
}

impl CatalogEntry for Bar {
    type Id = BarId;
    const KIND: EntityKind = EntityKind::Bar;

    fn id(&self) -> BarId {
        self.id
    }

    fn sort_key(&self) -> SortKey<'_> {
        SortKey::Number(self.id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_creation() {
        let bar = Bar::new(NodeId(1), NodeId(2), SectionId(0), MaterialId(0))
            .with_rotation(0.5)
            .with_release(ReleaseId(3));
        assert_eq!(bar.start, NodeId(1));
        assert_eq!(bar.rotation, 0.5);
        assert_eq!(bar.release, Some(ReleaseId(3)));
        assert_eq!(bar.discretization(), 1);
    }

    #[test]
    fn test_bar_nodes() {
        let mut bar = Bar::new(NodeId(1), NodeId(2), SectionId(0), MaterialId(0));
        bar.interior = vec![NodeId(5), NodeId(4)];
        assert_eq!(bar.nodes().collect::<Vec<_>>(), vec![NodeId(1), NodeId(2), NodeId(5), NodeId(4)]);
        assert_eq!(bar.discretization(), 3);
    }
}
