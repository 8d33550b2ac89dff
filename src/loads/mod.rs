//! Boundary with the load subsystem
//!
//! Loads are owned elsewhere. The model only needs to know which node or
//! bar each load hangs on, so it can report loads among the dependents of
//! an edit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ids::{BarId, NodeId};

/// Opaque identity of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadId(pub u32);

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The entity a load is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadOwner {
    Node(NodeId),
    Bar(BarId),
}

/// Lookup injected by the load subsystem
pub trait LoadLookup {
    /// Every known load
    fn loads(&self) -> Vec<LoadId>;

    /// The node or bar a load is applied to
    fn owner_of(&self, load: LoadId) -> Option<LoadOwner>;
}

/// Lookup for callers without loads
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoads;

impl LoadLookup for NoLoads {
    fn loads(&self) -> Vec<LoadId> {
        Vec::new()
    }

    fn owner_of(&self, _load: LoadId) -> Option<LoadOwner> {
        None
    }
}

/// In-memory load registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadTable {
    owners: BTreeMap<LoadId, LoadOwner>,
    next: u32,
}

impl LoadTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a load on a node
    pub fn add_node_load(&mut self, node: NodeId) -> LoadId {
        self.add(LoadOwner::Node(node))
    }

    /// Register a load on a bar
    pub fn add_bar_load(&mut self, bar: BarId) -> LoadId {
        self.add(LoadOwner::Bar(bar))
    }

    fn add(&mut self, owner: LoadOwner) -> LoadId {
        let id = LoadId(self.next);
        self.next += 1;
        self.owners.insert(id, owner);
        id
    }

    /// Drop a load
    pub fn remove(&mut self, load: LoadId) -> Option<LoadOwner> {
        self.owners.remove(&load)
    }

    /// Number of registered loads
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl LoadLookup for LoadTable {
    fn loads(&self) -> Vec<LoadId> {
        self.owners.keys().copied().collect()
    }

    fn owner_of(&self, load: LoadId) -> Option<LoadOwner> {
        self.owners.get(&load).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_table() {
        let mut table = LoadTable::new();
        let a = table.add_node_load(NodeId(1));
        let b = table.add_bar_load(BarId(2));
        assert_eq!(table.loads(), vec![a, b]);
        assert_eq!(table.owner_of(b), Some(LoadOwner::Bar(BarId(2))));

        table.remove(a);
        assert_eq!(table.len(), 1);
        assert_eq!(table.owner_of(a), None);
        assert!(NoLoads.loads().is_empty());
    }
}
