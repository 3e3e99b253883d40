use crate::Edge;
use std::collections::BTreeMap;
use tracing::debug;
use walkgraph_core::{ConstraintViolation, GraphLimits, NodeId};

/// Directed weighted graph over nodes `0..node_count`.
///
/// Outgoing edges of every node are kept sorted by destination, so two graphs
/// with the same edge set compare equal and serialize identically.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkGraph {
    node_count: usize,
    adjacency: Vec<Vec<Edge>>,
    edge_count: usize,
}

impl WalkGraph {
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Outgoing edges of `node`, sorted by destination. Empty for unknown nodes.
    pub fn out_edges(&self, node: NodeId) -> &[Edge] {
        self.adjacency
            .get(node as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.out_edges(node).len()
    }

    pub fn weight(&self, from: NodeId, to: NodeId) -> Option<f64> {
        let row = self.out_edges(from);
        row.binary_search_by_key(&to, |e| e.to)
            .ok()
            .map(|idx| row[idx].weight)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacency.iter().flatten()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        0..self.node_count as NodeId
    }

    pub fn max_out_degree(&self) -> usize {
        self.adjacency.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check every structural invariant against `limits`.
    ///
    /// The node count must match, every node needs at least one outgoing
    /// edge, weights must lie in `(0, max_weight]`, and the totals must fit
    /// the per-node and global edge budgets.
    pub fn validate(&self, limits: &GraphLimits) -> Result<(), ConstraintViolation> {
        if self.node_count != limits.node_count {
            return Err(ConstraintViolation::NodeCountMismatch {
                actual: self.node_count,
                expected: limits.node_count,
            });
        }
        if self.edge_count > limits.max_total_edges {
            return Err(ConstraintViolation::EdgeBudgetExceeded {
                edges: self.edge_count,
                budget: limits.max_total_edges,
            });
        }
        for (node, row) in self.adjacency.iter().enumerate() {
            let node = node as NodeId;
            if row.is_empty() {
                return Err(ConstraintViolation::DeadEnd { node });
            }
            if row.len() > limits.max_out_degree {
                return Err(ConstraintViolation::OutDegreeExceeded {
                    node,
                    degree: row.len(),
                    limit: limits.max_out_degree,
                });
            }
            if let Some(edge) = row.iter().find(|e| !limits.accepts_weight(e.weight)) {
                return Err(ConstraintViolation::InvalidWeight {
                    from: edge.from,
                    to: edge.to,
                    weight: edge.weight,
                });
            }
        }
        Ok(())
    }

    /// Share of the edge budget in use, in `[0, 1]` for valid graphs.
    pub fn budget_utilisation(&self, limits: &GraphLimits) -> f64 {
        if limits.max_total_edges == 0 {
            return 0.0;
        }
        self.edge_count as f64 / limits.max_total_edges as f64
    }
}

/// Incremental constructor for [`WalkGraph`].
///
/// Edge-local rules (node range, positive finite weight, no parallel edges)
/// are enforced on insertion; graph-wide rules are enforced by [`build`].
///
/// [`build`]: GraphBuilder::build
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    node_count: usize,
    rows: Vec<BTreeMap<NodeId, f64>>,
    edge_count: usize,
}

impl GraphBuilder {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            rows: vec![BTreeMap::new(); node_count],
            edge_count: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.rows.get(node as usize).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn contains_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.rows
            .get(from as usize)
            .is_some_and(|row| row.contains_key(&to))
    }

    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
    ) -> Result<&mut Self, ConstraintViolation> {
        for node in [from, to] {
            if node as usize >= self.node_count {
                return Err(ConstraintViolation::NodeOutOfRange {
                    node,
                    node_count: self.node_count,
                });
            }
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(ConstraintViolation::InvalidWeight { from, to, weight });
        }
        let row = &mut self.rows[from as usize];
        if row.contains_key(&to) {
            return Err(ConstraintViolation::DuplicateEdge { from, to });
        }
        row.insert(to, weight);
        self.edge_count += 1;
        Ok(self)
    }

    /// Validate against `limits` and freeze.
    pub fn build(self, limits: &GraphLimits) -> Result<WalkGraph, ConstraintViolation> {
        let graph = self.build_unchecked();
        graph.validate(limits)?;
        debug!(
            nodes = graph.node_count,
            edges = graph.edge_count,
            "graph validated"
        );
        Ok(graph)
    }

    /// Freeze without graph-wide checks. Dead ends and budget overruns are
    /// kept as-is so callers can inspect or evaluate broken topologies.
    pub fn build_unchecked(self) -> WalkGraph {
        let adjacency: Vec<Vec<Edge>> = self
            .rows
            .into_iter()
            .enumerate()
            .map(|(from, row)| {
                row.into_iter()
                    .map(|(to, weight)| Edge::new(from as NodeId, to, weight))
                    .collect()
            })
            .collect();
        WalkGraph {
            node_count: self.node_count,
            adjacency,
            edge_count: self.edge_count,
        }
    }
}
