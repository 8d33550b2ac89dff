//! Nodes - free points in space or points along a bar

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, SortKey};
use crate::ids::{BarId, EntityKind, NodeId, SupportId};

/// How a node's position is defined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Coordinates in space; offsets from `anchor` when one is set
    Free {
        x: f64,
        y: f64,
        z: f64,
        anchor: Option<NodeId>,
    },
    /// A point along `bar`, at relative position `t` in [0, 1]
    Interior { bar: BarId, t: f64 },
}

/// A node of the structural model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) id: NodeId,
    pub kind: NodeKind,
    pub support: Option<SupportId>,
}

impl Node {
    /// Create a free node at the given coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            id: NodeId(0),
            kind: NodeKind::Free {
                x,
                y,
                z,
                anchor: None,
            },
            support: None,
        }
    }

    /// Create a free node positioned relative to `anchor`
    pub fn anchored(anchor: NodeId, dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            id: NodeId(0),
            kind: NodeKind::Free {
                x: dx,
                y: dy,
                z: dz,
                anchor: Some(anchor),
            },
            support: None,
        }
    }

    pub(crate) fn interior(bar: BarId, t: f64) -> Self {
        Self {
            id: NodeId(0),
            kind: NodeKind::Interior { bar, t },
            support: None,
        }
    }

    /// Assign a support
    pub fn with_support(mut self, support: SupportId) -> Self {
        self.support = Some(support);
        self
    }

    /// Id of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Anchor of a free node
    pub fn anchor(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Free { anchor, .. } => anchor,
            NodeKind::Interior { .. } => None,
        }
    }

    /// Owning bar and relative position of an interior node
    pub fn owner(&self) -> Option<(BarId, f64)> {
        match self.kind {
            NodeKind::Interior { bar, t } => Some((bar, t)),
            NodeKind::Free { .. } => None,
        }
    }

    /// Check if this is a free node
    pub fn is_free(&self) -> bool {
        matches!(self.kind, NodeKind::Free { .. })
    }
}

impl CatalogEntry for Node {
    type Id = NodeId;
    const KIND: EntityKind = EntityKind::Node;

    fn id(&self) -> NodeId {
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
    fn test_node_creation() {
        let node = Node::new(1.0, 2.0, 3.0).with_support(SupportId(4));
        assert!(node.is_free());
        assert_eq!(node.anchor(), None);
        assert_eq!(node.support, Some(SupportId(4)));
    }

    #[test]
    fn test_anchored_and_interior() {
        let node = Node::anchored(NodeId(2), 4.0, -1.0, 0.0);
        assert_eq!(node.anchor(), Some(NodeId(2)));

        let node = Node::interior(BarId(1), 0.25);
        assert!(!node.is_free());
        assert_eq!(node.owner(), Some((BarId(1), 0.25)));
    }
}
