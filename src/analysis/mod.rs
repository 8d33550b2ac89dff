//! Analysis state and pre-analysis structural checks

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod connectivity;

pub use connectivity::{check_structure, find_block, Axis, Block, Issue, RestraintScope, StructureReport};

/// Type of structural analysis a cached solution came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AnalysisType {
    /// First-order linear static analysis
    #[default]
    Linear,
}

type Listener = Box<dyn FnMut(u64) + Send>;

/// Freshness of the solver's cached results
///
/// Any structural edit invalidates the whole solution; there is no partial
/// caching. Every invalidation bumps the revision and notifies listeners
/// with the new revision.
#[derive(Default)]
pub struct SolutionState {
    solution: Option<AnalysisType>,
    revision: u64,
    listeners: Vec<Listener>,
}

impl SolutionState {
    /// Drop the cached solution and notify listeners
    pub(crate) fn invalidate(&mut self) {
        self.solution = None;
        self.revision += 1;
        let revision = self.revision;
        for listener in self.listeners.iter_mut() {
            listener(revision);
        }
        log::debug!("solution invalidated, revision {revision}");
    }

    pub(crate) fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub(crate) fn mark_solved(&mut self, analysis: AnalysisType) {
        self.solution = Some(analysis);
    }

    /// Type of the current solution, `None` when stale
    pub fn solution(&self) -> Option<AnalysisType> {
        self.solution
    }

    /// Number of invalidations so far
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Listeners stay with the original; a clone starts without any
impl Clone for SolutionState {
    fn clone(&self) -> Self {
        Self {
            solution: self.solution,
            revision: self.revision,
            listeners: Vec::new(),
        }
    }
}

impl PartialEq for SolutionState {
    fn eq(&self, other: &Self) -> bool {
        self.solution == other.solution && self.revision == other.revision
    }
}

impl fmt::Debug for SolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionState")
            .field("solution", &self.solution)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
