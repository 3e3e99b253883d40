use crate::NodeId;
use thiserror::Error;

/// A structural rule broken by a candidate topology.
///
/// Raised before a graph is handed out; the search loop treats every variant
/// as recoverable and moves on to the next candidate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintViolation {
    #[error("edge budget exceeded: {edges} edges, budget is {budget}")]
    EdgeBudgetExceeded { edges: usize, budget: usize },

    #[error("node {node} has no outgoing edges")]
    DeadEnd { node: NodeId },

    #[error("node {node} has {degree} outgoing edges, limit is {limit}")]
    OutDegreeExceeded {
        node: NodeId,
        degree: usize,
        limit: usize,
    },

    #[error("edge {from} -> {to} has invalid weight {weight}")]
    InvalidWeight {
        from: NodeId,
        to: NodeId,
        weight: f64,
    },

    #[error("duplicate edge {from} -> {to}")]
    DuplicateEdge { from: NodeId, to: NodeId },

    #[error("node {node} is outside 0..{node_count}")]
    NodeOutOfRange { node: NodeId, node_count: usize },

    #[error("graph has {actual} nodes, expected {expected}")]
    NodeCountMismatch { actual: usize, expected: usize },

    #[error("node {node} is missing from the adjacency")]
    MissingNode { node: NodeId },

    #[error("invalid tier layout: {0}")]
    TierLayout(String),
}

#[derive(Error, Debug)]
pub enum WalkGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(#[from] ConstraintViolation),

    #[error("Empty profile: the query log contains no entries")]
    EmptyProfile,

    #[error("Structural invariant violation: node {node} is a dead end (walk toward {target})")]
    StructuralInvariantViolation { node: NodeId, target: NodeId },

    #[error("Node {node} is outside 0..{node_count}")]
    NodeOutOfRange { node: NodeId, node_count: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl WalkGraphError {
    /// Whether a search loop may skip the failing candidate and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }
}

impl From<config::ConfigError> for WalkGraphError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::de::Error> for WalkGraphError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WalkGraphError>;
