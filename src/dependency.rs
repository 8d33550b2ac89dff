//! Dependency resolution over the node/bar graph
//!
//! Nodes and bars form an implicit bipartite graph: a bar touches its start,
//! end and interior nodes. [`Walk`] is the one breadth-first closure over
//! that graph; the dependency resolver and the connectivity check are both
//! built on it. Anchors are a separate relation between free nodes, walked
//! only to keep anchor chains acyclic.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::catalog::Catalog;
use crate::elements::{Bar, Node, NodeKind};
use crate::error::{ModelError, ModelResult};
use crate::ids::{BarId, EntityRef, MaterialId, NodeId, ReleaseId, SectionId, SupportId};
use crate::loads::{LoadId, LoadLookup, LoadOwner};
use crate::model::Model;

/// Nodes and bars reached by a walk, seeds included
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reach {
    pub nodes: BTreeSet<NodeId>,
    pub bars: BTreeSet<BarId>,
}

/// Breadth-first closure over the node/bar graph
#[derive(Debug)]
pub(crate) struct Walk<'a> {
    bars: &'a Catalog<Bar>,
    /// Bars touching each node
    incident: HashMap<NodeId, Vec<BarId>>,
    /// Free nodes anchored directly to each node
    anchored: HashMap<NodeId, Vec<NodeId>>,
    follow_bars: bool,
    follow_anchors: bool,
    skip_bars: BTreeSet<BarId>,
}

impl<'a> Walk<'a> {
    /// Walk along bars only
    pub(crate) fn new(nodes: &'a Catalog<Node>, bars: &'a Catalog<Bar>) -> Self {
        let mut incident: HashMap<NodeId, Vec<BarId>> = HashMap::new();
        for bar in bars {
            for node in bar.nodes() {
                incident.entry(node).or_default().push(bar.id());
            }
        }

        let mut anchored: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in nodes {
            if let NodeKind::Free {
                anchor: Some(anchor),
                ..
            } = node.kind
            {
                anchored.entry(anchor).or_default().push(node.id());
            }
        }

        Self {
            bars,
            incident,
            anchored,
            follow_bars: true,
            follow_anchors: false,
            skip_bars: BTreeSet::new(),
        }
    }

    /// Follow the anchor relation only, from a node to the nodes anchored to it
    pub(crate) fn anchors_only(mut self) -> Self {
        self.follow_anchors = true;
        self.follow_bars = false;
        self
    }

    /// Never enter these bars
    pub(crate) fn skipping(mut self, bars: impl IntoIterator<Item = BarId>) -> Self {
        self.skip_bars.extend(bars);
        self
    }

    /// Compute everything reachable from the seeds
    pub(crate) fn run(
        &self,
        seed_nodes: impl IntoIterator<Item = NodeId>,
        seed_bars: impl IntoIterator<Item = BarId>,
    ) -> Reach {
        let mut reach = Reach::default();
        let mut node_queue = VecDeque::new();
        let mut bar_queue = VecDeque::new();

        for node in seed_nodes {
            if reach.nodes.insert(node) {
                node_queue.push_back(node);
            }
        }
        for bar in seed_bars {
            if !self.skip_bars.contains(&bar) && reach.bars.insert(bar) {
                bar_queue.push_back(bar);
            }
        }

        loop {
            if let Some(node) = node_queue.pop_front() {
                if self.follow_bars {
                    for &bar in self.incident.get(&node).into_iter().flatten() {
                        if !self.skip_bars.contains(&bar) && reach.bars.insert(bar) {
                            bar_queue.push_back(bar);
                        }
                    }
                }
                if self.follow_anchors {
                    for &child in self.anchored.get(&node).into_iter().flatten() {
                        if reach.nodes.insert(child) {
                            node_queue.push_back(child);
                        }
                    }
                }
            } else if let Some(bar) = bar_queue.pop_front() {
                let Some(bar) = self.bars.get(bar) else {
                    continue;
                };
                for node in bar.nodes() {
                    if reach.nodes.insert(node) {
                        node_queue.push_back(node);
                    }
                }
            } else {
                break;
            }
        }

        reach
    }
}

/// Entities whose dependents are requested
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Seeds {
    pub supports: BTreeSet<SupportId>,
    pub releases: BTreeSet<ReleaseId>,
    pub sections: BTreeSet<SectionId>,
    pub materials: BTreeSet<MaterialId>,
    pub nodes: BTreeSet<NodeId>,
    pub bars: BTreeSet<BarId>,
}

impl Seeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn support(mut self, id: SupportId) -> Self {
        self.supports.insert(id);
        self
    }

    pub fn release(mut self, id: ReleaseId) -> Self {
        self.releases.insert(id);
        self
    }

    pub fn section(mut self, id: SectionId) -> Self {
        self.sections.insert(id);
        self
    }

    pub fn material(mut self, id: MaterialId) -> Self {
        self.materials.insert(id);
        self
    }

    pub fn node(mut self, id: NodeId) -> Self {
        self.nodes.insert(id);
        self
    }

    pub fn bar(mut self, id: BarId) -> Self {
        self.bars.insert(id);
        self
    }

    /// Seeds holding a single entity
    pub fn of(entity: EntityRef) -> Self {
        let seeds = Self::new();
        match entity {
            EntityRef::Support(id) => seeds.support(id),
            EntityRef::Release(id) => seeds.release(id),
            EntityRef::Section(id) => seeds.section(id),
            EntityRef::Material(id) => seeds.material(id),
            EntityRef::Node(id) => seeds.node(id),
            EntityRef::Bar(id) => seeds.bar(id),
        }
    }

    /// Check if no seed is set
    pub fn is_empty(&self) -> bool {
        self.supports.is_empty()
            && self.releases.is_empty()
            && self.sections.is_empty()
            && self.materials.is_empty()
            && self.nodes.is_empty()
            && self.bars.is_empty()
    }
}

/// Nodes, bars and loads depending on a set of seeds
///
/// Seed nodes and bars are not listed among the dependents. Loads applied
/// to seed nodes or bars are listed, since they go wherever the seed goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dependents {
    pub nodes: BTreeSet<NodeId>,
    pub bars: BTreeSet<BarId>,
    pub loads: BTreeSet<LoadId>,
}

fn join_ids<T: ToString>(ids: impl Iterator<Item = T>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

impl Dependents {
    /// No node or bar depends on the seeds
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.bars.is_empty()
    }

    /// Human-readable list such as "bars 1, 2 and node 4"
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match self.bars.len() {
            0 => {}
            1 => parts.push(format!("bar {}", join_ids(self.bars.iter()))),
            _ => parts.push(format!("bars {}", join_ids(self.bars.iter()))),
        }
        match self.nodes.len() {
            0 => {}
            1 => parts.push(format!("node {}", join_ids(self.nodes.iter()))),
            _ => parts.push(format!("nodes {}", join_ids(self.nodes.iter()))),
        }
        if parts.is_empty() {
            "nothing".to_string()
        } else {
            parts.join(" and ")
        }
    }

    pub(crate) fn collect_loads(&mut self, reach: &Reach, loads: &dyn LoadLookup) {
        for load in loads.loads() {
            let owned = match loads.owner_of(load) {
                Some(LoadOwner::Node(node)) => reach.nodes.contains(&node),
                Some(LoadOwner::Bar(bar)) => reach.bars.contains(&bar),
                None => false,
            };
            if owned {
                self.loads.insert(load);
            }
        }
    }
}

fn check_seeds(model: &Model, seeds: &Seeds) -> ModelResult<()> {
    for &id in &seeds.supports {
        model.supports.require(id)?;
    }
    for &id in &seeds.releases {
        model.releases.require(id)?;
    }
    for &id in &seeds.sections {
        model.sections.require(id)?;
    }
    for &id in &seeds.materials {
        model.materials.require(id)?;
    }
    for &id in &seeds.nodes {
        model.nodes.require(id)?;
    }
    for &id in &seeds.bars {
        model.bars.require(id)?;
    }
    Ok(())
}

/// Compute every node, bar and load depending on the seeds
///
/// Bars using a seed section, material or release and nodes using a seed
/// support are direct dependents. The closure then spreads through the
/// node/bar graph. Anchored nodes are not followed: their position tracks
/// the anchor but they do not depend on it structurally.
pub fn compute_dependents(
    model: &Model,
    seeds: &Seeds,
    loads: &dyn LoadLookup,
) -> ModelResult<Dependents> {
    check_seeds(model, seeds)?;

    let direct_bars = model.bars.iter().filter(|bar| {
        seeds.sections.contains(&bar.section)
            || seeds.materials.contains(&bar.material)
            || bar.release.is_some_and(|r| seeds.releases.contains(&r))
    });
    let direct_nodes = model
        .nodes
        .iter()
        .filter(|node| node.support.is_some_and(|s| seeds.supports.contains(&s)));

    let reach = Walk::new(&model.nodes, &model.bars).run(
        seeds
            .nodes
            .iter()
            .copied()
            .chain(direct_nodes.map(Node::id)),
        seeds.bars.iter().copied().chain(direct_bars.map(Bar::id)),
    );

    let mut dependents = Dependents {
        nodes: reach.nodes.difference(&seeds.nodes).copied().collect(),
        bars: reach.bars.difference(&seeds.bars).copied().collect(),
        loads: BTreeSet::new(),
    };
    dependents.collect_loads(&reach, loads);
    Ok(dependents)
}

/// Free nodes whose position follows `node` through anchors
pub fn anchor_dependents(model: &Model, node: NodeId) -> BTreeSet<NodeId> {
    let mut reach = Walk::new(&model.nodes, &model.bars)
        .anchors_only()
        .run([node], []);
    reach.nodes.remove(&node);
    reach.nodes
}

/// Check that `node` may be anchored to `anchor`
///
/// The anchor must be an existing free node. Neither node may already follow
/// the other, directly or through a chain of anchors.
pub fn check_anchor(model: &Model, node: NodeId, anchor: NodeId) -> ModelResult<()> {
    model.nodes.require(node)?;
    let target = model.nodes.require(anchor)?;
    if !target.is_free() {
        return Err(ModelError::InvalidGeometry(format!(
            "node {anchor} lies on a bar and cannot be an anchor"
        )));
    }
    if anchor == node
        || anchor_dependents(model, node).contains(&anchor)
        || anchor_dependents(model, anchor).contains(&node)
    {
        return Err(ModelError::AnchorCycle {
            node: node.0,
            anchor: anchor.0,
        });
    }
    Ok(())
}
