//! Frame model - the structural model container and its mutation engine
//!
//! Every edit goes through a `Model` method. Each method validates its whole
//! input before touching any catalog, so an error always leaves the model as
//! it was. Edits that change the structure invalidate the cached solution.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::{self, AnalysisType, SolutionState, StructureReport};
use crate::catalog::Catalog;
use crate::dependency::{self, Dependents, Seeds, Walk};
use crate::elements::{Bar, Material, Node, NodeKind, Release, Section, Support};
use crate::error::{ModelError, ModelResult};
use crate::geometry::{Geometry, Pt3, Vec3};
use crate::ids::{
    BarId, EntityKind, EntityRef, MaterialId, NodeId, ReleaseId, SectionId, SupportId,
};
use crate::loads::{LoadLookup, NoLoads};
use crate::options::ModelOptions;

/// The 3D frame model: six ordered catalogs and the solution state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub(crate) supports: Catalog<Support>,
    pub(crate) releases: Catalog<Release>,
    pub(crate) sections: Catalog<Section>,
    pub(crate) materials: Catalog<Material>,
    pub(crate) nodes: Catalog<Node>,
    pub(crate) bars: Catalog<Bar>,
    #[serde(default)]
    pub(crate) options: ModelOptions,

    /// Analysis solution status
    #[serde(skip)]
    solution: SolutionState,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

fn check_finite(what: &str, values: &[f64]) -> ModelResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ModelError::InvalidInput(format!("{what} must be finite")))
    }
}

fn check_relative_position(t: f64) -> ModelResult<()> {
    if (0.0..=1.0).contains(&t) {
        Ok(())
    } else {
        Err(ModelError::InvalidPosition(t))
    }
}

impl Model {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::with_options(ModelOptions::default())
    }

    /// Create a new empty model with custom options
    pub fn with_options(options: ModelOptions) -> Self {
        Self {
            supports: Catalog::new(),
            releases: Catalog::new(),
            sections: Catalog::new(),
            materials: Catalog::new(),
            nodes: Catalog::new(),
            bars: Catalog::new(),
            options,
            solution: SolutionState::default(),
        }
    }

    // ========================
    // Read access
    // ========================

    pub fn supports(&self) -> &Catalog<Support> {
        &self.supports
    }

    pub fn releases(&self) -> &Catalog<Release> {
        &self.releases
    }

    pub fn sections(&self) -> &Catalog<Section> {
        &self.sections
    }

    pub fn materials(&self) -> &Catalog<Material> {
        &self.materials
    }

    pub fn nodes(&self) -> &Catalog<Node> {
        &self.nodes
    }

    pub fn bars(&self) -> &Catalog<Bar> {
        &self.bars
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Get a node, failing when absent
    pub fn node(&self, id: NodeId) -> ModelResult<&Node> {
        self.nodes.require(id)
    }

    /// Get a bar, failing when absent
    pub fn bar(&self, id: BarId) -> ModelResult<&Bar> {
        self.bars.require(id)
    }

    /// Position resolver over this model
    pub fn geometry(&self) -> Geometry<'_> {
        Geometry::new(&self.nodes, &self.bars)
    }

    /// Absolute position of a node
    pub fn position(&self, node: NodeId) -> ModelResult<Pt3> {
        self.geometry().position(node)
    }

    /// Euclidean distance between two nodes
    pub fn distance(&self, a: NodeId, b: NodeId) -> ModelResult<f64> {
        self.geometry().distance(a, b)
    }

    /// Per-axis deltas from `from` to `to`
    pub fn delta(&self, from: NodeId, to: NodeId) -> ModelResult<Vec3> {
        self.geometry().delta(from, to)
    }

    /// Nodes, bars depending on the seeds
    pub fn dependents(&self, seeds: &Seeds) -> ModelResult<Dependents> {
        dependency::compute_dependents(self, seeds, &NoLoads)
    }

    /// Nodes, bars and loads depending on the seeds
    pub fn dependents_with_loads(
        &self,
        seeds: &Seeds,
        loads: &dyn LoadLookup,
    ) -> ModelResult<Dependents> {
        dependency::compute_dependents(self, seeds, loads)
    }

    /// Run every structural check
    pub fn check_structure(&self) -> ModelResult<StructureReport> {
        analysis::check_structure(self)
    }

    /// Run every structural check, failing on the first report with issues
    pub fn validate_structure(&self) -> ModelResult<StructureReport> {
        let report = self.check_structure()?;
        if report.is_valid() {
            Ok(report)
        } else {
            Err(ModelError::Unstable(report.describe()))
        }
    }

    // ========================
    // Solution state
    // ========================

    /// Check if the cached solution is current
    pub fn is_analyzed(&self) -> bool {
        self.solution.solution().is_some()
    }

    /// Get the analysis type of the current solution
    pub fn solution_type(&self) -> Option<AnalysisType> {
        self.solution.solution()
    }

    /// Number of invalidations since the model was created or loaded
    pub fn revision(&self) -> u64 {
        self.solution.revision()
    }

    /// Record that the solver produced a solution for the current structure
    pub fn mark_solved(&mut self, analysis: AnalysisType) {
        self.solution.mark_solved(analysis);
    }

    /// Register a callback fired with the new revision on every invalidation
    pub fn on_invalidate(&mut self, listener: impl FnMut(u64) + Send + 'static) {
        self.solution.subscribe(Box::new(listener));
    }

    fn invalidate(&mut self) {
        self.solution.invalidate();
    }

    /// Invalidate when any bar depends on the edited entity
    fn invalidate_if_bars(&mut self, dependents: &Dependents) {
        if !dependents.bars.is_empty() {
            self.invalidate();
        }
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a support to the model
    pub fn add_support(&mut self, name: &str, mut support: Support) -> ModelResult<SupportId> {
        support.name = name.to_string();
        support.id = self.supports.next_id()?;
        let id = self.supports.insert(support)?;
        log::debug!("added support '{name}' ({id})");
        self.invalidate();
        Ok(id)
    }

    /// Add an end release to the model
    pub fn add_release(&mut self, name: &str, mut release: Release) -> ModelResult<ReleaseId> {
        release.validate()?;
        release.name = name.to_string();
        release.id = self.releases.next_id()?;
        let id = self.releases.insert(release)?;
        log::debug!("added release '{name}' ({id})");
        self.invalidate();
        Ok(id)
    }

    /// Add a section to the model
    pub fn add_section(&mut self, name: &str, mut section: Section) -> ModelResult<SectionId> {
        section.validate(&self.options.tolerance)?;
        section.name = name.to_string();
        section.id = self.sections.next_id()?;
        let id = self.sections.insert(section)?;
        log::debug!("added section '{name}' ({id})");
        self.invalidate();
        Ok(id)
    }

    /// Add a material to the model
    pub fn add_material(&mut self, name: &str, mut material: Material) -> ModelResult<MaterialId> {
        material.validate()?;
        material.name = name.to_string();
        material.id = self.materials.next_id()?;
        let id = self.materials.insert(material)?;
        log::debug!("added material '{name}' ({id})");
        self.invalidate();
        Ok(id)
    }

    /// Add a node to the model
    ///
    /// Interior nodes are attached to their bar at their relative position.
    pub fn add_node(&mut self, mut node: Node) -> ModelResult<NodeId> {
        if let Some(support) = node.support {
            self.supports.require(support)?;
        }
        match node.kind {
            NodeKind::Free { x, y, z, anchor } => {
                check_finite("coordinates", &[x, y, z])?;
                if let Some(anchor) = anchor {
                    if !self.nodes.require(anchor)?.is_free() {
                        return Err(ModelError::InvalidGeometry(format!(
                            "node {anchor} lies on a bar and cannot be an anchor"
                        )));
                    }
                }
            }
            NodeKind::Interior { bar, t } => {
                self.bars.require(bar)?;
                check_relative_position(t)?;
            }
        }

        node.id = self.nodes.next_id()?;
        let owner = node.owner();
        let id = self.nodes.insert(node)?;
        if let Some((bar, _)) = owner {
            if let Some(bar) = self.bars.get_mut(bar) {
                bar.interior.push(id);
            }
            self.sort_interior(bar);
        }
        log::debug!("added node {id}");
        self.invalidate();
        Ok(id)
    }

    /// Add a node along a bar, at relative position `t` in [0, 1]
    pub fn add_interior_node(&mut self, bar: BarId, t: f64) -> ModelResult<NodeId> {
        self.add_node(Node::interior(bar, t))
    }

    /// Add a bar to the model
    pub fn add_bar(&mut self, mut bar: Bar) -> ModelResult<BarId> {
        self.check_bar(&bar)?;
        bar.interior.clear();
        bar.id = self.bars.next_id()?;
        let id = self.bars.insert(bar)?;
        log::debug!("added bar {id}");
        self.invalidate();
        Ok(id)
    }

    fn check_bar(&self, bar: &Bar) -> ModelResult<()> {
        self.nodes.require(bar.start)?;
        self.nodes.require(bar.end)?;
        if bar.start == bar.end {
            return Err(ModelError::InvalidGeometry(format!(
                "bar starts and ends at node {}",
                bar.start
            )));
        }
        if bar.interior.contains(&bar.start) || bar.interior.contains(&bar.end) {
            return Err(ModelError::InvalidGeometry(format!(
                "bar {} cannot end on one of its own interior nodes",
                bar.id
            )));
        }
        self.sections.require(bar.section)?;
        self.materials.require(bar.material)?;
        if let Some(release) = bar.release {
            self.releases.require(release)?;
        }
        check_finite("rotation", &[bar.rotation])
    }

    /// Re-sort the interior nodes of a bar by relative position
    fn sort_interior(&mut self, bar: BarId) {
        let Some(entry) = self.bars.get(bar) else {
            return;
        };
        let mut order: Vec<(f64, NodeId)> = entry
            .interior
            .iter()
            .map(|&id| {
                let t = self
                    .nodes
                    .get(id)
                    .and_then(Node::owner)
                    .map_or(0.0, |(_, t)| t);
                (t, id)
            })
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(entry) = self.bars.get_mut(bar) {
            entry.interior = order.into_iter().map(|(_, id)| id).collect();
        }
    }

    // ========================
    // Modification Methods
    // ========================

    /// Replace the restraints and name of a support
    pub fn modify_support(&mut self, id: SupportId, name: &str, mut support: Support) -> ModelResult<()> {
        let dependents = self.dependents(&Seeds::new().support(id))?;
        support.id = id;
        support.name = name.to_string();
        self.supports.replace(support)?;
        log::debug!("modified support '{name}' ({id})");
        self.invalidate_if_bars(&dependents);
        Ok(())
    }

    /// Replace the fixities and name of a release
    pub fn modify_release(&mut self, id: ReleaseId, name: &str, mut release: Release) -> ModelResult<()> {
        release.validate()?;
        let dependents = self.dependents(&Seeds::new().release(id))?;
        release.id = id;
        release.name = name.to_string();
        self.releases.replace(release)?;
        log::debug!("modified release '{name}' ({id})");
        self.invalidate_if_bars(&dependents);
        Ok(())
    }

    /// Replace the shape and name of a section
    pub fn modify_section(&mut self, id: SectionId, name: &str, mut section: Section) -> ModelResult<()> {
        section.validate(&self.options.tolerance)?;
        let dependents = self.dependents(&Seeds::new().section(id))?;
        section.id = id;
        section.name = name.to_string();
        self.sections.replace(section)?;
        log::debug!("modified section '{name}' ({id})");
        self.invalidate_if_bars(&dependents);
        Ok(())
    }

    /// Replace the strengths and name of a material
    pub fn modify_material(
        &mut self,
        id: MaterialId,
        name: &str,
        mut material: Material,
    ) -> ModelResult<()> {
        material.validate()?;
        let dependents = self.dependents(&Seeds::new().material(id))?;
        material.id = id;
        material.name = name.to_string();
        self.materials.replace(material)?;
        log::debug!("modified material '{name}' ({id})");
        self.invalidate_if_bars(&dependents);
        Ok(())
    }

    /// Rename a support, a release, a section or a material
    pub fn rename(&mut self, entity: EntityRef, name: &str) -> ModelResult<()> {
        let seeds = Seeds::of(entity);
        let dependents = self.dependents(&seeds)?;
        match entity {
            EntityRef::Support(id) => self.supports.rename(id, name)?,
            EntityRef::Release(id) => self.releases.rename(id, name)?,
            EntityRef::Section(id) => self.sections.rename(id, name)?,
            EntityRef::Material(id) => self.materials.rename(id, name)?,
            EntityRef::Node(_) | EntityRef::Bar(_) => {
                return Err(ModelError::InvalidInput(format!(
                    "a {} is identified by number and has no name",
                    entity.kind()
                )));
            }
        }
        log::debug!("renamed {} to '{name}'", entity.kind());
        self.invalidate_if_bars(&dependents);
        Ok(())
    }

    /// Change the section, material, release and rotation of a bar
    pub fn modify_bar(
        &mut self,
        id: BarId,
        section: SectionId,
        material: MaterialId,
        release: Option<ReleaseId>,
        rotation: f64,
    ) -> ModelResult<()> {
        let mut bar = self.bars.require(id)?.clone();
        bar.section = section;
        bar.material = material;
        bar.release = release;
        bar.rotation = rotation;
        self.check_bar(&bar)?;
        self.bars.replace(bar)?;
        log::debug!("modified bar {id}");
        self.invalidate();
        Ok(())
    }

    /// Assign or clear the support of a node
    pub fn change_support(&mut self, node: NodeId, support: Option<SupportId>) -> ModelResult<()> {
        if let Some(support) = support {
            self.supports.require(support)?;
        }
        self.nodes.require_mut(node)?.support = support;
        log::debug!("node {node} support changed");
        self.invalidate();
        Ok(())
    }

    /// Set the coordinates of a free node (offsets when anchored)
    pub fn change_position(&mut self, node: NodeId, x: f64, y: f64, z: f64) -> ModelResult<()> {
        check_finite("coordinates", &[x, y, z])?;
        let entry = self.nodes.require_mut(node)?;
        match &mut entry.kind {
            NodeKind::Free {
                x: nx,
                y: ny,
                z: nz,
                ..
            } => {
                *nx = x;
                *ny = y;
                *nz = z;
            }
            NodeKind::Interior { .. } => {
                return Err(ModelError::InvalidGeometry(format!(
                    "node {node} lies on a bar; change its relative position instead"
                )));
            }
        }
        log::debug!("node {node} moved");
        self.invalidate();
        Ok(())
    }

    /// Anchor a free node to another free node, or release its anchor
    ///
    /// The node keeps its absolute position: its coordinates are rewritten as
    /// offsets from the new anchor, or as absolute values when released.
    pub fn change_anchor(&mut self, node: NodeId, anchor: Option<NodeId>) -> ModelResult<()> {
        if !self.nodes.require(node)?.is_free() {
            return Err(ModelError::InvalidGeometry(format!(
                "node {node} lies on a bar and cannot be anchored"
            )));
        }
        if self.nodes.require(node)?.anchor() == anchor {
            return Ok(());
        }
        let position = self.position(node)?;
        let coords = match anchor {
            Some(anchor) => {
                dependency::check_anchor(self, node, anchor)?;
                position - self.position(anchor)?
            }
            None => position.coords,
        };

        self.nodes.require_mut(node)?.kind = NodeKind::Free {
            x: coords.x,
            y: coords.y,
            z: coords.z,
            anchor,
        };
        log::debug!("node {node} anchor set to {anchor:?}");
        self.invalidate();
        Ok(())
    }

    /// Move an interior node along its bar, keeping siblings ordered
    pub fn change_relative_position(&mut self, node: NodeId, t: f64) -> ModelResult<()> {
        check_relative_position(t)?;
        let entry = self.nodes.require_mut(node)?;
        let bar = match &mut entry.kind {
            NodeKind::Interior { bar, t: current } => {
                *current = t;
                *bar
            }
            NodeKind::Free { .. } => {
                return Err(ModelError::InvalidGeometry(format!(
                    "node {node} is not on a bar"
                )));
            }
        };
        self.sort_interior(bar);
        log::debug!("node {node} moved to t = {t} on bar {bar}");
        self.invalidate();
        Ok(())
    }

    // ========================
    // Deletion Methods
    // ========================

    /// Delete a support; nodes using it lose their support
    pub fn delete_support(&mut self, id: SupportId, cascade: bool) -> ModelResult<Dependents> {
        self.delete(EntityRef::Support(id), cascade, &NoLoads)
    }

    /// Delete a release
    pub fn delete_release(&mut self, id: ReleaseId, cascade: bool) -> ModelResult<Dependents> {
        self.delete(EntityRef::Release(id), cascade, &NoLoads)
    }

    /// Delete a section
    pub fn delete_section(&mut self, id: SectionId, cascade: bool) -> ModelResult<Dependents> {
        self.delete(EntityRef::Section(id), cascade, &NoLoads)
    }

    /// Delete a material
    pub fn delete_material(&mut self, id: MaterialId, cascade: bool) -> ModelResult<Dependents> {
        self.delete(EntityRef::Material(id), cascade, &NoLoads)
    }

    /// Delete a node
    pub fn delete_node(&mut self, id: NodeId, cascade: bool) -> ModelResult<Dependents> {
        self.delete(EntityRef::Node(id), cascade, &NoLoads)
    }

    /// Delete a bar together with its interior nodes
    pub fn delete_bar(&mut self, id: BarId, cascade: bool) -> ModelResult<Dependents> {
        self.delete(EntityRef::Bar(id), cascade, &NoLoads)
    }

    fn display_name(&self, entity: EntityRef) -> ModelResult<String> {
        Ok(match entity {
            EntityRef::Support(id) => self.supports.require(id)?.name().to_string(),
            EntityRef::Release(id) => self.releases.require(id)?.name().to_string(),
            EntityRef::Section(id) => self.sections.require(id)?.name().to_string(),
            EntityRef::Material(id) => self.materials.require(id)?.name().to_string(),
            EntityRef::Node(id) => self.nodes.require(id)?.id().to_string(),
            EntityRef::Bar(id) => self.bars.require(id)?.id().to_string(),
        })
    }

    /// Nodes and bars that block deleting `entity`, plus the loads going away
    fn deletion_dependents(
        &self,
        entity: EntityRef,
        loads: &dyn LoadLookup,
    ) -> ModelResult<Dependents> {
        let walk = Walk::new(&self.nodes, &self.bars);
        let (seed_nodes, seed_bars, reach) = match entity {
            EntityRef::Node(id) => match self.nodes.require(id)?.owner() {
                // The owning bar only loses a sub-division point
                Some((owner, _)) => {
                    let reach = walk.skipping([owner]).run([id], []);
                    (BTreeSet::from([id]), BTreeSet::new(), reach)
                }
                None => return dependency::compute_dependents(self, &Seeds::of(entity), loads),
            },
            EntityRef::Bar(id) => {
                let interior = self.bars.require(id)?.interior.clone();
                let reach = walk.skipping([id]).run(interior.iter().copied(), []);
                let mut reach_with_bar = reach.clone();
                reach_with_bar.bars.insert(id);
                (interior.into_iter().collect(), BTreeSet::from([id]), reach_with_bar)
            }
            _ => return dependency::compute_dependents(self, &Seeds::of(entity), loads),
        };

        let mut dependents = Dependents {
            nodes: reach.nodes.difference(&seed_nodes).copied().collect(),
            bars: reach.bars.difference(&seed_bars).copied().collect(),
            loads: BTreeSet::new(),
        };
        dependents.collect_loads(&reach, loads);
        Ok(dependents)
    }

    /// Delete any entity
    ///
    /// When other nodes or bars depend on `entity`, the call fails unless
    /// `cascade` is set, in which case dependent bars are deleted with their
    /// interior nodes and nodes using a deleted support lose it. Nodes
    /// anchored to a deleted node are never blockers: they are detached and
    /// keep their absolute position. Returns the nodes and bars removed or
    /// orphaned, and the loads that applied to anything removed.
    pub fn delete(
        &mut self,
        entity: EntityRef,
        cascade: bool,
        loads: &dyn LoadLookup,
    ) -> ModelResult<Dependents> {
        let name = self.display_name(entity)?;
        let mut dependents = self.deletion_dependents(entity, loads)?;
        if !dependents.is_empty() && !cascade {
            return Err(ModelError::InUse {
                kind: entity.kind(),
                name,
                dependents: dependents.describe(),
            });
        }

        // Positions of nodes anchored to a deleted node, resolved up front
        let mut detached: BTreeMap<NodeId, Vec3> = BTreeMap::new();
        if let EntityRef::Node(id) = entity {
            for node in &self.nodes {
                if node.anchor() == Some(id) {
                    detached.insert(node.id(), self.position(node.id())?.coords);
                }
            }
        }

        // Nothing below can fail
        for &bar in &dependents.bars {
            self.remove_bar(bar);
        }
        for (&node, coords) in &detached {
            if let Some(entry) = self.nodes.get_mut(node) {
                entry.kind = NodeKind::Free {
                    x: coords.x,
                    y: coords.y,
                    z: coords.z,
                    anchor: None,
                };
            }
        }

        match entity {
            EntityRef::Support(id) => {
                for node in dependents.nodes.iter().copied() {
                    if let Some(entry) = self.nodes.get_mut(node) {
                        if entry.support == Some(id) {
                            entry.support = None;
                        }
                    }
                }
                self.supports.remove(id);
            }
            EntityRef::Release(id) => {
                self.releases.remove(id);
            }
            EntityRef::Section(id) => {
                self.sections.remove(id);
            }
            EntityRef::Material(id) => {
                self.materials.remove(id);
            }
            EntityRef::Node(id) => {
                if let Some((owner, _)) = self.nodes.get(id).and_then(Node::owner) {
                    if let Some(bar) = self.bars.get_mut(owner) {
                        bar.interior.retain(|&n| n != id);
                    }
                }
                self.nodes.remove(id);
            }
            EntityRef::Bar(id) => {
                dependents.nodes.extend(self.remove_bar(id));
            }
        }

        if cascade && !dependents.is_empty() {
            log::info!(
                "deleted {} '{}' and cascaded to {}",
                entity.kind(),
                name,
                dependents.describe()
            );
        } else {
            log::debug!("deleted {} '{}'", entity.kind(), name);
        }
        self.invalidate();
        Ok(dependents)
    }

    /// Remove a bar and free its interior nodes
    fn remove_bar(&mut self, id: BarId) -> Vec<NodeId> {
        let Some(bar) = self.bars.remove(id) else {
            return Vec::new();
        };
        for &node in &bar.interior {
            self.nodes.remove(node);
        }
        bar.interior
    }

    // ========================
    // Persistence boundary
    // ========================

    /// Serialize the model to JSON, ids preserved verbatim
    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a model from JSON and check its references
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let model: Model = serde_json::from_str(json)?;
        model.check_integrity()?;
        Ok(model)
    }

    /// Check that every handle refers to an existing entity and that node
    /// positions resolve
    pub fn check_integrity(&self) -> ModelResult<()> {
        self.supports.check_entries()?;
        self.releases.check_entries()?;
        self.sections.check_entries()?;
        self.materials.check_entries()?;
        self.nodes.check_entries()?;
        self.bars.check_entries()?;
        for release in &self.releases {
            release.validate()?;
        }
        for section in &self.sections {
            section.validate(&self.options.tolerance)?;
        }
        for node in &self.nodes {
            if let Some(support) = node.support {
                self.supports.require(support)?;
            }
            match node.kind {
                NodeKind::Free {
                    anchor: Some(anchor),
                    ..
                } => {
                    if !self.nodes.require(anchor)?.is_free() {
                        return Err(ModelError::InvalidGeometry(format!(
                            "node {} is anchored to interior node {anchor}",
                            node.id()
                        )));
                    }
                }
                NodeKind::Free { .. } => {}
                NodeKind::Interior { bar, t } => {
                    check_relative_position(t)?;
                    if !self.bars.require(bar)?.interior.contains(&node.id()) {
                        return Err(ModelError::InvalidGeometry(format!(
                            "node {} is missing from the interior nodes of bar {bar}",
                            node.id()
                        )));
                    }
                }
            }
        }
        for bar in &self.bars {
            self.check_bar(bar)?;
            for &node in &bar.interior {
                if self.nodes.require(node)?.owner().map(|(owner, _)| owner) != Some(bar.id()) {
                    return Err(ModelError::InvalidGeometry(format!(
                        "bar {} lists node {node} which lies elsewhere",
                        bar.id()
                    )));
                }
            }
        }
        let geometry = self.geometry();
        for node in &self.nodes {
            geometry.position(node.id())?;
        }
        Ok(())
    }

    /// Kind and number of entities, for reporting
    pub fn counts(&self) -> Vec<(EntityKind, usize)> {
        vec![
            (EntityKind::Support, self.supports.len()),
            (EntityKind::Release, self.releases.len()),
            (EntityKind::Section, self.sections.len()),
            (EntityKind::Material, self.materials.len()),
            (EntityKind::Node, self.nodes.len()),
            (EntityKind::Bar, self.bars.len()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadTable;
    use approx::assert_relative_eq;

    struct Cantilever {
        model: Model,
        section: SectionId,
        material: MaterialId,
        support: SupportId,
        a: NodeId,
        b: NodeId,
        bar: BarId,
    }

    fn cantilever() -> Cantilever {
        let mut model = Model::new();
        let section = model.add_section("R30x50", Section::rectangular(0.3, 0.5)).unwrap();
        let material = model.add_material("C25", Material::concrete(25e6)).unwrap();
        let support = model.add_support("Fixed", Support::fixed()).unwrap();
        let a = model
            .add_node(Node::new(0.0, 0.0, 0.0).with_support(support))
            .unwrap();
        let b = model.add_node(Node::new(10.0, 0.0, 0.0)).unwrap();
        let bar = model.add_bar(Bar::new(a, b, section, material)).unwrap();
        Cantilever {
            model,
            section,
            material,
            support,
            a,
            b,
            bar,
        }
    }

    #[test]
    fn test_simple_cantilever() {
        let c = cantilever();
        assert_eq!(c.model.nodes().len(), 2);
        assert_relative_eq!(c.model.distance(c.a, c.b).unwrap(), 10.0);
        assert!(c.model.validate_structure().is_ok());
    }

    #[test]
    fn test_bar_validation() {
        let mut c = cantilever();
        let before = c.model.clone();
        assert!(c
            .model
            .add_bar(Bar::new(c.a, c.a, c.section, c.material))
            .is_err());
        assert!(c
            .model
            .add_bar(Bar::new(c.a, NodeId(42), c.section, c.material))
            .is_err());
        assert!(c
            .model
            .add_bar(Bar::new(c.a, c.b, SectionId(9), c.material))
            .is_err());
        assert_eq!(c.model, before);
    }

    #[test]
    fn test_interior_nodes_sorted() {
        let mut c = cantilever();
        let m1 = c.model.add_interior_node(c.bar, 0.5).unwrap();
        let m2 = c.model.add_interior_node(c.bar, 0.25).unwrap();
        assert_eq!(c.model.bar(c.bar).unwrap().interior(), &[m2, m1]);
        assert_eq!(c.model.bar(c.bar).unwrap().discretization(), 3);

        c.model.change_relative_position(m2, 0.9).unwrap();
        assert_eq!(c.model.bar(c.bar).unwrap().interior(), &[m1, m2]);
        assert_relative_eq!(c.model.position(m2).unwrap().x, 9.0);

        assert!(matches!(
            c.model.change_relative_position(m2, 1.5),
            Err(ModelError::InvalidPosition(_))
        ));
        assert!(c.model.change_position(m2, 1.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_invalidation() {
        let mut c = cantilever();
        c.model.mark_solved(AnalysisType::Linear);
        assert!(c.model.is_analyzed());

        // Unused support: nothing to invalidate
        let unused = c.model.add_support("Roller", Support::roller_y()).unwrap();
        c.model.mark_solved(AnalysisType::Linear);
        c.model
            .modify_support(unused, "Roller", Support::roller_z())
            .unwrap();
        assert!(c.model.is_analyzed());

        // Section used by the bar
        c.model
            .modify_section(c.section, "R30x60", Section::rectangular(0.3, 0.6))
            .unwrap();
        assert!(!c.model.is_analyzed());
        assert_eq!(c.model.sections().id_of("R30x60").unwrap(), c.section);
    }

    #[test]
    fn test_rename_rules() {
        let mut c = cantilever();
        c.model.add_support("Pinned", Support::pinned()).unwrap();
        assert!(matches!(
            c.model.rename(EntityRef::Support(c.support), "Pinned"),
            Err(ModelError::DuplicateName { .. })
        ));
        c.model.rename(EntityRef::Support(c.support), "Zed").unwrap();
        let names: Vec<&str> = c.model.supports().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Pinned", "Zed"]);
        assert!(c.model.rename(EntityRef::Node(c.a), "N1").is_err());
    }

    #[test]
    fn test_change_anchor_keeps_position() {
        let mut c = cantilever();
        let n = c.model.add_node(Node::new(12.0, 3.0, 0.0)).unwrap();
        c.model.change_anchor(n, Some(c.b)).unwrap();
        assert_eq!(c.model.node(n).unwrap().anchor(), Some(c.b));
        assert_eq!(c.model.position(n).unwrap(), Pt3::new(12.0, 3.0, 0.0));

        c.model.change_position(c.b, 20.0, 0.0, 0.0).unwrap();
        assert_eq!(c.model.position(n).unwrap(), Pt3::new(22.0, 3.0, 0.0));

        assert!(matches!(
            c.model.change_anchor(c.b, Some(n)),
            Err(ModelError::AnchorCycle { .. })
        ));

        c.model.change_anchor(n, None).unwrap();
        assert_eq!(c.model.node(n).unwrap().anchor(), None);
        assert_eq!(c.model.position(n).unwrap(), Pt3::new(22.0, 3.0, 0.0));
    }

    #[test]
    fn test_delete_interior_node_keeps_bar() {
        let mut c = cantilever();
        let m = c.model.add_interior_node(c.bar, 0.5).unwrap();
        let deps = c.model.delete_node(m, false).unwrap();
        assert!(deps.is_empty());
        assert!(c.model.bars().contains(c.bar));
        assert_eq!(c.model.bar(c.bar).unwrap().discretization(), 1);
    }

    #[test]
    fn test_delete_bar_frees_interior_nodes() {
        let mut c = cantilever();
        let m = c.model.add_interior_node(c.bar, 0.5).unwrap();
        let mut loads = LoadTable::new();
        let on_bar = loads.add_bar_load(c.bar);
        let on_interior = loads.add_node_load(m);

        let deps = c
            .model
            .delete(EntityRef::Bar(c.bar), false, &loads)
            .unwrap();
        assert_eq!(deps.nodes, BTreeSet::from([m]));
        assert_eq!(deps.loads, BTreeSet::from([on_bar, on_interior]));
        assert!(!c.model.nodes().contains(m));
        assert_eq!(c.model.nodes().ids(), vec![c.a, c.b]);
    }

    #[test]
    fn test_delete_bar_blocked_by_bar_on_interior_node() {
        let mut c = cantilever();
        let m = c.model.add_interior_node(c.bar, 0.5).unwrap();
        let top = c.model.add_node(Node::new(5.0, 3.0, 0.0)).unwrap();
        let post = c
            .model
            .add_bar(Bar::new(m, top, c.section, c.material))
            .unwrap();

        let err = c.model.delete_bar(c.bar, false).unwrap_err();
        assert!(err.to_string().contains(&format!("bar {post}")));

        let deps = c.model.delete_bar(c.bar, true).unwrap();
        assert!(deps.bars.contains(&post));
        assert!(c.model.bars().is_empty());
        assert!(c.model.nodes().contains(top));
    }

    #[test]
    fn test_delete_node_detaches_followers() {
        let mut c = cantilever();
        let lone = c.model.add_node(Node::new(1.0, 1.0, 1.0)).unwrap();
        let follower = c
            .model
            .add_node(Node::anchored(lone, 1.0, 0.0, 0.0))
            .unwrap();

        let deps = c.model.delete_node(lone, false).unwrap();
        assert!(deps.is_empty());
        assert_eq!(c.model.node(follower).unwrap().anchor(), None);
        assert_eq!(c.model.position(follower).unwrap(), Pt3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn test_delete_node_keeps_bars_on_followers() {
        let mut c = cantilever();
        let root = c.model.add_node(Node::new(0.0, 5.0, 0.0)).unwrap();
        let follower = c
            .model
            .add_node(Node::anchored(root, 1.0, 0.0, 0.0))
            .unwrap();
        let far = c.model.add_node(Node::new(4.0, 5.0, 0.0)).unwrap();
        let bar = c
            .model
            .add_bar(Bar::new(follower, far, c.section, c.material))
            .unwrap();

        let deps = c.model.delete_node(root, true).unwrap();
        assert!(deps.is_empty());
        assert!(c.model.bars().contains(bar));
        assert_eq!(c.model.node(follower).unwrap().anchor(), None);
        assert_eq!(c.model.position(follower).unwrap(), Pt3::new(1.0, 5.0, 0.0));
    }

    #[test]
    fn test_cascade_does_not_cross_anchors() {
        let mut c = cantilever();
        let other = c.model.add_section("R20x20", Section::square(0.2)).unwrap();
        let hanger = c
            .model
            .add_node(Node::anchored(c.a, 0.0, 3.0, 0.0))
            .unwrap();
        let tip = c.model.add_node(Node::new(0.0, 3.0, 2.0)).unwrap();
        let separate = c
            .model
            .add_bar(Bar::new(hanger, tip, other, c.material))
            .unwrap();

        let deps = c.model.delete_section(c.section, true).unwrap();
        assert_eq!(deps.bars, BTreeSet::from([c.bar]));
        assert!(!c.model.bars().contains(c.bar));
        assert!(c.model.bars().contains(separate));
        assert_eq!(c.model.node(hanger).unwrap().anchor(), Some(c.a));
    }

    #[test]
    fn test_change_anchor_rejects_existing_follower() {
        let mut c = cantilever();
        let mid = c.model.add_node(Node::anchored(c.a, 0.0, 1.0, 0.0)).unwrap();
        let top = c.model.add_node(Node::anchored(mid, 0.0, 1.0, 0.0)).unwrap();
        let before = c.model.clone();

        // top already follows a through mid
        assert!(matches!(
            c.model.change_anchor(top, Some(c.a)),
            Err(ModelError::AnchorCycle { .. })
        ));
        assert!(matches!(
            c.model.change_anchor(c.a, Some(top)),
            Err(ModelError::AnchorCycle { .. })
        ));
        assert_eq!(c.model, before);

        // Re-stating the current anchor changes nothing
        c.model.change_anchor(top, Some(mid)).unwrap();
        assert_eq!(c.model, before);
    }

    #[test]
    fn test_custom_section_uses_model_tolerance() {
        use crate::elements::CustomSection;
        use crate::options::Tolerance;
        use nalgebra::Point2;

        // Inner loop whose bottom edge runs 1e-6 above the outer one
        let thin_gap = || {
            Section::custom(CustomSection {
                loops: vec![
                    vec![
                        Point2::new(0.0, 0.0),
                        Point2::new(4.0, 0.0),
                        Point2::new(4.0, 4.0),
                        Point2::new(0.0, 4.0),
                    ],
                    vec![
                        Point2::new(1.0, 1e-6),
                        Point2::new(3.0, 1e-6),
                        Point2::new(3.0, 2.0),
                        Point2::new(1.0, 2.0),
                    ],
                ],
                a: 1.0,
                iy: 1.0,
                iz: 1.0,
                j: 1.0,
                vy: 0.5,
                vy_neg: 0.5,
                vz: 0.5,
                vz_neg: 0.5,
            })
        };

        let mut fine = Model::new();
        assert!(fine.add_section("Gap", thin_gap()).is_ok());

        let options = ModelOptions::default().with_tolerance(Tolerance::new(1e-9, 1e-4));
        let mut coarse = Model::with_options(options);
        assert!(matches!(
            coarse.add_section("Gap", thin_gap()),
            Err(ModelError::SelfIntersection { .. })
        ));
        let square = coarse.add_section("Gap", Section::square(0.2)).unwrap();
        assert!(matches!(
            coarse.modify_section(square, "Gap", thin_gap()),
            Err(ModelError::SelfIntersection { .. })
        ));

        // A saved model is checked under its own tolerance when loaded
        let mut saved: serde_json::Value = serde_json::from_str(&fine.to_json().unwrap()).unwrap();
        saved["options"]["tolerance"]["absolute"] = serde_json::json!(1e-4);
        assert!(matches!(
            Model::from_json(&saved.to_string()),
            Err(ModelError::SelfIntersection { .. })
        ));
    }

    #[test]
    fn test_node_ids_not_reused() {
        let mut c = cantilever();
        let n = c.model.add_node(Node::new(5.0, 5.0, 5.0)).unwrap();
        c.model.delete_node(n, false).unwrap();
        let again = c.model.add_node(Node::new(5.0, 5.0, 5.0)).unwrap();
        assert!(again > n);
    }

    #[test]
    fn test_json_round_trip_preserves_ids() {
        let mut c = cantilever();
        let m = c.model.add_interior_node(c.bar, 0.3).unwrap();
        let json = c.model.to_json().unwrap();
        let loaded = Model::from_json(&json).unwrap();
        assert_eq!(loaded.nodes().ids(), c.model.nodes().ids());
        assert_eq!(loaded.bar(c.bar).unwrap().interior(), &[m]);
        assert_eq!(loaded.position(m).unwrap(), c.model.position(m).unwrap());
    }

    #[test]
    fn test_from_json_rejects_dangling_reference() {
        let c = cantilever();
        let json = c.model.to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["bars"]["entries"][0]["section"] = serde_json::json!(99);
        assert!(Model::from_json(&value.to_string()).is_err());
    }
}
