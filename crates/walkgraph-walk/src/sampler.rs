use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::RngCore;
use tracing::warn;
use walkgraph_core::{NodeId, Result, WalkGraphError};
use walkgraph_graph::WalkGraph;

/// Outgoing choices of a single node, prepared for repeated sampling.
#[derive(Debug, Clone)]
pub struct TransitionRow {
    destinations: Vec<NodeId>,
    weights: Vec<f64>,
    index: WeightedIndex<f64>,
}

impl TransitionRow {
    pub fn destinations(&self) -> &[NodeId] {
        &self.destinations
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Probability of stepping to `dest` under the weighted law.
    pub fn probability(&self, dest: NodeId) -> f64 {
        self.destinations
            .iter()
            .position(|&d| d == dest)
            .map(|i| self.weights[i] / self.total_weight())
            .unwrap_or(0.0)
    }
}

/// Per-node transition rows for one graph. Built once, shared by all trials.
///
/// Nodes without outgoing edges have no row; walks that reach them are
/// reported as dead ends.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    rows: Vec<Option<TransitionRow>>,
}

impl TransitionTable {
    pub fn from_graph(graph: &WalkGraph) -> Result<Self> {
        let mut dead_ends = 0usize;
        let rows = graph
            .nodes()
            .map(|node| {
                let edges = graph.out_edges(node);
                if edges.is_empty() {
                    dead_ends += 1;
                    return Ok(None);
                }
                let weights: Vec<f64> = edges.iter().map(|e| e.weight).collect();
                let index = WeightedIndex::new(weights.iter().copied()).map_err(|e| {
                    WalkGraphError::InvalidParameter(format!(
                        "node {} has unusable weights: {}",
                        node, e
                    ))
                })?;
                Ok(Some(TransitionRow {
                    destinations: edges.iter().map(|e| e.to).collect(),
                    weights,
                    index,
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        if dead_ends > 0 {
            warn!(dead_ends, "transition table built over a graph with dead ends");
        }
        Ok(Self { rows })
    }

    pub fn node_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, node: NodeId) -> Option<&TransitionRow> {
        self.rows.get(node as usize).and_then(Option::as_ref)
    }
}

/// Rule for choosing the next node of a walk.
pub trait StepSampler: Send + Sync {
    fn name(&self) -> &'static str;
    fn next(&self, row: &TransitionRow, rng: &mut dyn RngCore) -> NodeId;
}

/// Standard weighted choice: each edge is taken with probability
/// `weight / total_weight` of its source row.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedSampler;

impl StepSampler for WeightedSampler {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn next(&self, row: &TransitionRow, rng: &mut dyn RngCore) -> NodeId {
        row.destinations[row.index.sample(rng)]
    }
}

/// Always follows the heaviest edge; ties go to the lowest destination id.
/// Consumes no randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedySampler;

impl StepSampler for GreedySampler {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn next(&self, row: &TransitionRow, _rng: &mut dyn RngCore) -> NodeId {
        let mut best = 0usize;
        for (i, &w) in row.weights.iter().enumerate().skip(1) {
            if w > row.weights[best] {
                best = i;
            }
        }
        row.destinations[best]
    }
}
