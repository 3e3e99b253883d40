use serde::{Deserialize, Serialize};
use std::fmt;

/// Node identifier in `0..node_count`.
pub type NodeId = u32;

/// Edge weights used by the three-tier topology.
///
/// Only the ordering `primary > secondary > backup` matters for the walk; the
/// concrete values are tunable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTriple {
    pub primary: f64,
    pub secondary: f64,
    pub backup: f64,
}

impl WeightTriple {
    pub const fn new(primary: f64, secondary: f64, backup: f64) -> Self {
        Self {
            primary,
            secondary,
            backup,
        }
    }

    /// Positive weights with a strict `primary > secondary > backup` order.
    pub fn is_strictly_ordered(&self) -> bool {
        self.backup > 0.0
            && self.secondary > self.backup
            && self.primary > self.secondary
            && self.primary.is_finite()
    }

    pub fn max(&self) -> f64 {
        self.primary.max(self.secondary).max(self.backup)
    }
}

impl Default for WeightTriple {
    fn default() -> Self {
        Self::new(10.0, 8.0, 1.0)
    }
}

impl fmt::Display for WeightTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.primary, self.secondary, self.backup)
    }
}

/// Hard structural limits every graph must respect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphLimits {
    /// Number of nodes; identifiers are `0..node_count`.
    #[serde(default = "GraphLimits::default_node_count")]
    pub node_count: usize,
    /// Edge budget across the whole graph.
    #[serde(default = "GraphLimits::default_max_total_edges")]
    pub max_total_edges: usize,
    /// Per-node out-degree limit.
    #[serde(default = "GraphLimits::default_max_out_degree")]
    pub max_out_degree: usize,
    /// Inclusive upper bound on edge weights.
    #[serde(default = "GraphLimits::default_max_weight")]
    pub max_weight: f64,
}

impl GraphLimits {
    fn default_node_count() -> usize {
        500
    }

    fn default_max_total_edges() -> usize {
        1000
    }

    fn default_max_out_degree() -> usize {
        3
    }

    fn default_max_weight() -> f64 {
        10.0
    }

    pub fn new(node_count: usize, max_total_edges: usize) -> Self {
        Self {
            node_count,
            max_total_edges,
            ..Self::default()
        }
    }

    pub fn with_max_out_degree(mut self, max_out_degree: usize) -> Self {
        self.max_out_degree = max_out_degree;
        self
    }

    pub fn with_max_weight(mut self, max_weight: f64) -> Self {
        self.max_weight = max_weight;
        self
    }

    pub fn accepts_weight(&self, weight: f64) -> bool {
        weight.is_finite() && weight > 0.0 && weight <= self.max_weight
    }
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            node_count: Self::default_node_count(),
            max_total_edges: Self::default_max_total_edges(),
            max_out_degree: Self::default_max_out_degree(),
            max_weight: Self::default_max_weight(),
        }
    }
}

/// Where simulated walks begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartDistribution {
    /// Uniform over every node, the target included.
    #[default]
    Uniform,
    /// Uniform over every node except the target.
    UniformExcludingTarget,
    /// Always the given node.
    Fixed(NodeId),
}

impl fmt::Display for StartDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::UniformExcludingTarget => write!(f, "uniform_excluding_target"),
            Self::Fixed(node) => write!(f, "fixed({})", node),
        }
    }
}
