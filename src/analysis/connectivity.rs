//! Structural checks run before handing a model to the solver
//!
//! The structure must be one connected block of nodes and bars, restrained
//! in every translation, free of coincident nodes and of zero-length bars.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::dependency::Walk;
use crate::error::ModelResult;
use crate::ids::{BarId, NodeId};
use crate::model::Model;

pub use crate::dependency::Reach as Block;

/// Global translation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "ux",
            Axis::Y => "uy",
            Axis::Z => "uz",
        };
        f.write_str(name)
    }
}

/// Where a restraint was looked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RestraintScope {
    /// Among all support definitions
    Defined,
    /// Among supports actually assigned to nodes
    Used,
}

/// A problem found by [`check_structure`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Issue {
    TooFewNodes(usize),
    NoBars,
    Disconnected { components: usize },
    Unrestrained { axis: Axis, scope: RestraintScope },
    CoincidentNodes(NodeId, NodeId),
    ZeroLengthBar(BarId),
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::TooFewNodes(count) => {
                write!(f, "the structure needs at least 2 nodes, found {count}")
            }
            Issue::NoBars => write!(f, "the structure has no bar"),
            Issue::Disconnected { components } => write!(
                f,
                "the structure is split into {components} unconnected blocks"
            ),
            Issue::Unrestrained {
                axis,
                scope: RestraintScope::Defined,
            } => write!(f, "no support definition restrains {axis}"),
            Issue::Unrestrained {
                axis,
                scope: RestraintScope::Used,
            } => write!(f, "no supported node restrains {axis}"),
            Issue::CoincidentNodes(a, b) => write!(f, "nodes {a} and {b} are coincident"),
            Issue::ZeroLengthBar(bar) => write!(f, "bar {bar} has zero length"),
        }
    }
}

/// Outcome of [`check_structure`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureReport {
    /// Connected blocks, each listed from its lowest node id
    pub components: Vec<Block>,
    pub issues: Vec<Issue>,
}

impl StructureReport {
    /// The structure can be handed to the solver
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// All issues joined into one line
    pub fn describe(&self) -> String {
        self.issues
            .iter()
            .map(Issue::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Every node and bar connected to the seeds
pub fn find_block(
    model: &Model,
    seed_nodes: impl IntoIterator<Item = NodeId>,
    seed_bars: impl IntoIterator<Item = BarId>,
) -> Block {
    Walk::new(&model.nodes, &model.bars).run(seed_nodes, seed_bars)
}

/// Run every structural check and collect the issues found
///
/// Only a failure to resolve node positions is returned as an error.
pub fn check_structure(model: &Model) -> ModelResult<StructureReport> {
    let mut report = StructureReport::default();

    if model.nodes.len() < 2 {
        report.issues.push(Issue::TooFewNodes(model.nodes.len()));
    }
    if model.bars.is_empty() {
        report.issues.push(Issue::NoBars);
    }
    if !report.issues.is_empty() {
        log_issues(&report);
        return Ok(report);
    }

    // Connected blocks
    let walk = Walk::new(&model.nodes, &model.bars);
    let mut visited: BTreeSet<NodeId> = BTreeSet::new();
    for node in &model.nodes {
        if visited.contains(&node.id()) {
            continue;
        }
        let block = walk.run([node.id()], []);
        visited.extend(block.nodes.iter().copied());
        report.components.push(block);
    }
    if report.components.len() > 1 {
        report.issues.push(Issue::Disconnected {
            components: report.components.len(),
        });
    }

    // Support sufficiency, first over definitions then over assignments
    for axis in Axis::ALL {
        let defined = model
            .supports
            .iter()
            .any(|support| support.translations()[axis.index()]);
        if !defined {
            report.issues.push(Issue::Unrestrained {
                axis,
                scope: RestraintScope::Defined,
            });
            continue;
        }
        let used = model
            .nodes
            .iter()
            .filter_map(|node| node.support)
            .filter_map(|id| model.supports.get(id))
            .any(|support| support.translations()[axis.index()]);
        if !used {
            report.issues.push(Issue::Unrestrained {
                axis,
                scope: RestraintScope::Used,
            });
        }
    }

    // Coincident nodes
    let geometry = model.geometry();
    let mut positions = Vec::with_capacity(model.nodes.len());
    for node in &model.nodes {
        positions.push((node.id(), geometry.position(node.id())?));
    }
    let limit = model.options.coincidence_distance;
    for (i, (a, pa)) in positions.iter().enumerate() {
        for (b, pb) in &positions[i + 1..] {
            if (pb - pa).norm() <= limit {
                report.issues.push(Issue::CoincidentNodes(*a, *b));
            }
        }
    }

    // Zero-length bars
    for bar in &model.bars {
        if geometry.distance(bar.start, bar.end)? <= model.options.min_bar_length {
            report.issues.push(Issue::ZeroLengthBar(bar.id()));
        }
    }

    log_issues(&report);
    Ok(report)
}

fn log_issues(report: &StructureReport) {
    for issue in &report.issues {
        log::warn!("structure check: {issue}");
    }
}
