use crate::{TierAssignment, TierBoundaries};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use walkgraph_core::{
    ConstraintViolation, GraphLimits, NodeId, Result, SynthesisConfig, WalkGraphError, WeightTriple,
};
use walkgraph_graph::{GraphBuilder, WalkGraph};

/// Knobs of the three-tier topology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructuralParams {
    pub boundaries: TierBoundaries,
    /// Distance of the medium tier's skip edge, wrapping within the tier.
    pub skip_distance: usize,
    pub weights: WeightTriple,
}

impl StructuralParams {
    pub fn new(boundaries: TierBoundaries, skip_distance: usize, weights: WeightTriple) -> Self {
        Self {
            boundaries,
            skip_distance,
            weights,
        }
    }

    pub fn from_config(config: &SynthesisConfig) -> Result<Self> {
        let boundaries = TierBoundaries::by_rank(config.tier_a, config.tier_b_end)?;
        let params = Self::new(boundaries, config.skip_distance, config.weights);
        params.check()?;
        Ok(params)
    }

    fn check(&self) -> Result<()> {
        if self.skip_distance == 0 {
            return Err(WalkGraphError::InvalidParameter(
                "skip distance must be at least 1".to_string(),
            ));
        }
        if !self.weights.is_strictly_ordered() {
            return Err(WalkGraphError::InvalidParameter(format!(
                "weights {} must be positive with primary > secondary > backup",
                self.weights
            )));
        }
        Ok(())
    }
}

impl Default for StructuralParams {
    fn default() -> Self {
        Self::new(TierBoundaries::default(), 3, WeightTriple::default())
    }
}

impl fmt::Display for StructuralParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} skip={} weights={}",
            self.boundaries, self.skip_distance, self.weights
        )
    }
}

/// Edge totals of a synthesized graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisReport {
    pub nodes: usize,
    pub edges: usize,
    pub budget: usize,
    pub utilisation: f64,
    pub max_out_degree: usize,
    /// Node counts of the high, medium and low tiers.
    pub tier_sizes: [usize; 3],
}

impl SynthesisReport {
    pub fn new(graph: &WalkGraph, tiers: &TierAssignment, limits: &GraphLimits) -> Self {
        Self {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            budget: limits.max_total_edges,
            utilisation: graph.budget_utilisation(limits),
            max_out_degree: graph.max_out_degree(),
            tier_sizes: [
                tiers.tier_a().len(),
                tiers.tier_b().len(),
                tiers.tier_c().len(),
            ],
        }
    }
}

/// Deterministic three-tier topology construction.
///
/// * High tier: forward chain at primary weight. The last node continues to
///   the first node after the tier in rank order, or back to the hub.
/// * Medium tier, in priority order until the out-degree limit: forward to
///   the next member at primary weight (the tail loops to the hub), a skip
///   edge `skip_distance` members ahead at secondary weight, and a backup
///   edge to the hub at backup weight. Skip and backup edges that would be
///   self loops or repeat an existing destination are omitted.
/// * Low tier: a single edge to the hub at primary weight.
#[derive(Debug, Clone)]
pub struct TopologySynthesizer {
    limits: GraphLimits,
}

impl TopologySynthesizer {
    pub fn new(limits: GraphLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &GraphLimits {
        &self.limits
    }

    /// Number of edges [`synthesize`](Self::synthesize) would emit, without
    /// checking any limits.
    pub fn estimate_edge_count(
        &self,
        tiers: &TierAssignment,
        params: &StructuralParams,
    ) -> Result<usize> {
        Ok(self.plan(tiers, params)?.edge_count())
    }

    /// Build and validate the graph for `params`.
    ///
    /// Fails with a recoverable [`ConstraintViolation`] when the layout breaks
    /// a limit; the budget is checked before anything else.
    pub fn synthesize(
        &self,
        tiers: &TierAssignment,
        params: &StructuralParams,
    ) -> Result<WalkGraph> {
        if tiers.node_count() != self.limits.node_count {
            return Err(ConstraintViolation::NodeCountMismatch {
                actual: tiers.node_count(),
                expected: self.limits.node_count,
            }
            .into());
        }
        let builder = self.plan(tiers, params)?;
        if builder.edge_count() > self.limits.max_total_edges {
            return Err(ConstraintViolation::EdgeBudgetExceeded {
                edges: builder.edge_count(),
                budget: self.limits.max_total_edges,
            }
            .into());
        }
        let graph = builder.build(&self.limits)?;
        info!(
            params = %params,
            edges = graph.edge_count(),
            utilisation = graph.budget_utilisation(&self.limits),
            "topology synthesized"
        );
        Ok(graph)
    }

    fn plan(&self, tiers: &TierAssignment, params: &StructuralParams) -> Result<GraphBuilder> {
        params.check()?;
        let Some(hub) = tiers.hub() else {
            return Err(WalkGraphError::InvalidParameter(
                "cannot synthesize a graph without nodes".to_string(),
            ));
        };
        let weights = params.weights;
        let limit = self.limits.max_out_degree;
        let mut builder = GraphBuilder::new(tiers.node_count());

        let high = tiers.tier_a();
        for pair in high.windows(2) {
            builder.add_edge(pair[0], pair[1], weights.primary)?;
        }
        if let Some(&last) = high.last() {
            let next = tiers.order().get(high.len()).copied().unwrap_or(hub);
            builder.add_edge(last, next, weights.primary)?;
        }

        let medium = tiers.tier_b();
        let m = medium.len();
        for (j, &node) in medium.iter().enumerate() {
            let forward = medium.get(j + 1).copied().unwrap_or(hub);
            let skip = medium[(j + params.skip_distance) % m];
            let candidates = [
                (forward, weights.primary),
                (skip, weights.secondary),
                (hub, weights.backup),
            ];
            for (to, weight) in candidates {
                if builder.out_degree(node) >= limit {
                    break;
                }
                if to == node || builder.contains_edge(node, to) {
                    continue;
                }
                builder.add_edge(node, to, weight)?;
            }
        }

        for &node in tiers.tier_c() {
            builder.add_edge(node, hub, weights.primary)?;
        }

        debug!(
            high = high.len(),
            medium = m,
            low = tiers.tier_c().len(),
            edges = builder.edge_count(),
            "topology planned"
        );
        Ok(builder)
    }
}

/// Node a high-tier member is expected to reach next under greedy traversal.
pub fn designated_successor(graph: &WalkGraph, node: NodeId) -> Option<NodeId> {
    graph
        .out_edges(node)
        .iter()
        .fold(None::<(NodeId, f64)>, |best, e| match best {
            Some((_, w)) if w >= e.weight => best,
            _ => Some((e.to, e.weight)),
        })
        .map(|(to, _)| to)
}
