//! Error types for the model core.
//!
//! Each subsystem defines its own error enum; the crate-level [`Error`]
//! aggregates them for callers that propagate through initialization.
//!
//! The taxonomy follows the model's failure policy: configuration and
//! mesh/topology errors are unrecoverable setup failures the driver must
//! abort on, registry and halo errors flag programming/contract violations
//! (continuing would risk silently wrong physics), and no error here models
//! a transient condition — the core has no retry path anywhere.

use thiserror::Error;

use crate::types::ElemKind;

/// Configuration document errors. Physical coefficients cannot be safely
/// defaulted, so a missing required key is fatal at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required key '{key}' in config group '{group}'")]
    MissingKey { group: String, key: String },

    #[error("key '{key}' in config group '{group}' is not a {expected}")]
    WrongType {
        group: String,
        key: String,
        expected: &'static str,
    },

    #[error("missing config group '{0}'")]
    MissingGroup(String),

    #[error("unknown choice '{value}' for key '{key}' in config group '{group}' (expected one of {expected:?})")]
    UnknownChoice {
        group: String,
        key: String,
        value: String,
        expected: &'static [&'static str],
    },

    #[error("failed to parse configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Malformed global mesh input. These are unrecoverable: the mesh file is
/// wrong, not the run state.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("mesh field '{name}' has length {got}, expected {expected}")]
    BadExtent {
        name: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("edge {edge} has no valid adjoining cell")]
    ZeroAdjacencyEdge { edge: usize },

    #[error("vertex {vertex} has no valid adjoining cell")]
    ZeroAdjacencyVertex { vertex: usize },

    #[error("cell {cell} lists out-of-range neighbor {neighbor}")]
    BadConnectivity { cell: usize, neighbor: usize },
}

/// Domain-decomposition errors.
#[derive(Debug, Error)]
pub enum DecompError {
    #[error("partition count {parts} exceeds global cell count {cells}")]
    TooManyParts { parts: usize, cells: usize },

    #[error("partitioner returned {got} assignments for {expected} cells")]
    BadAssignment { got: usize, expected: usize },

    #[error("partitioner assigned cell {cell} to out-of-range part {part} (of {parts})")]
    BadPart {
        cell: usize,
        part: usize,
        parts: usize,
    },

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Halo-exchange and transport errors. An extent mismatch is a local
/// programming error and must fail loudly rather than silently truncate.
#[derive(Debug, Error)]
pub enum HaloError {
    #[error("{kind} array has {got} entries, expected {expected_all} (all) or {expected_size} (size) times the inner extent")]
    ExtentMismatch {
        kind: ElemKind,
        got: usize,
        expected_all: usize,
        expected_size: usize,
    },

    #[error("rank {from} requested non-owned {kind} with global id {global}")]
    NotOwned {
        kind: ElemKind,
        from: usize,
        global: usize,
    },

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Named-instance registry errors: using a not-yet-created aggregate or
/// re-creating an existing one is a contract violation.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no {kind} named '{name}' has been created")]
    NotFound { kind: &'static str, name: String },

    #[error("a {kind} named '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },
}

/// Crate-level error for initialization call chains.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Decomp(#[from] DecompError),
    #[error(transparent)]
    Halo(#[from] HaloError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
