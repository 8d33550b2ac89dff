//! Error types for the frame model

use thiserror::Error;

use crate::ids::EntityKind;

/// Main error type for model operations
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{kind} '{id}' not found in model")]
    NotFound { kind: EntityKind, id: String },

    #[error("Duplicate {kind} name '{name}' already exists")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("Duplicate {kind} id {id}")]
    DuplicateId { kind: EntityKind, id: u32 },

    #[error("'None' is a reserved name and cannot be used for a {kind}")]
    ReservedName { kind: EntityKind },

    #[error("A {kind} name cannot be empty")]
    EmptyName { kind: EntityKind },

    #[error("Invalid release: {0}")]
    InvalidRelease(String),

    #[error("Invalid section: {0}")]
    InvalidSection(String),

    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    #[error("Relative position {0} of node is outside [0, 1]")]
    InvalidPosition(f64),

    #[error("Anchoring node {node} to node {anchor} would create a cycle")]
    AnchorCycle { node: u32, anchor: u32 },

    #[error("Position of node {0} depends on itself")]
    GeometryCycle(u32),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error(
        "Shape edges intersect: loop {first_loop} edge {first_edge} and loop {second_loop} edge {second_edge}"
    )]
    SelfIntersection {
        first_loop: usize,
        first_edge: usize,
        second_loop: usize,
        second_edge: usize,
    },

    #[error("{kind} '{name}' is in use: {dependents}")]
    InUse {
        kind: EntityKind,
        name: String,
        dependents: String,
    },

    #[error("Structure is unstable: {0}")]
    Unstable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
