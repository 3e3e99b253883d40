use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use walkgraph_core::{NodeId, Result, WalkGraphError};

/// Read-only summary of a query log: how often each node was requested.
///
/// The ranking lists queried nodes by descending count, ties broken by
/// ascending node id. Profiles are never mutated; a changed log means a new
/// profile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryProfile {
    counts: BTreeMap<NodeId, u64>,
    ranking: Vec<NodeId>,
    total: u64,
}

/// Human-facing digest of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub total_queries: u64,
    pub unique_targets: usize,
    pub top_targets: Vec<(NodeId, u64)>,
    /// Targets queried at least twice.
    pub high_value_targets: usize,
    pub max_queried_node: Option<NodeId>,
    /// `(k, share of queries covered by the top k nodes)`
    pub coverage: Vec<(usize, f64)>,
}

impl QueryProfile {
    /// Profile an ordered query log. An empty log is an explicit
    /// [`WalkGraphError::EmptyProfile`]; callers that want to proceed use
    /// [`QueryProfile::empty`] with a fallback tiering.
    pub fn from_log(log: &[NodeId]) -> Result<Self> {
        if log.is_empty() {
            return Err(WalkGraphError::EmptyProfile);
        }
        let mut counts = BTreeMap::new();
        for &target in log {
            *counts.entry(target).or_insert(0u64) += 1;
        }
        let profile = Self::from_counts(counts);
        debug!(
            queries = profile.total,
            unique = profile.counts.len(),
            "profiled query log"
        );
        Ok(profile)
    }

    /// Build from explicit counts. Zero counts are dropped.
    pub fn from_counts(counts: impl IntoIterator<Item = (NodeId, u64)>) -> Self {
        let counts: BTreeMap<NodeId, u64> = counts.into_iter().filter(|&(_, c)| c > 0).collect();
        let mut ranking: Vec<NodeId> = counts.keys().copied().collect();
        // Stable sort over ascending ids keeps id order among ties.
        ranking.sort_by(|a, b| counts[b].cmp(&counts[a]));
        let total = counts.values().sum();
        Self {
            counts,
            ranking,
            total,
        }
    }

    /// Profile with zero entries and an empty ranking.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn total_queries(&self) -> u64 {
        self.total
    }

    pub fn unique_targets(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, node: NodeId) -> u64 {
        self.counts.get(&node).copied().unwrap_or(0)
    }

    /// Fraction of all queries that asked for `node`.
    pub fn share(&self, node: NodeId) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(node) as f64 / self.total as f64
    }

    pub fn ranking(&self) -> &[NodeId] {
        &self.ranking
    }

    /// `(node, count)` pairs in ranking order; this is the evaluation workload.
    pub fn workload(&self) -> Vec<(NodeId, u64)> {
        self.ranking.iter().map(|&n| (n, self.counts[&n])).collect()
    }

    /// Share of queries that target one of the `k` highest-ranked nodes.
    pub fn top_k_coverage(&self, k: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let covered: u64 = self.ranking.iter().take(k).map(|n| self.counts[n]).sum();
        covered as f64 / self.total as f64
    }

    /// Nodes in `0..node_count` that never appear in the log, ascending.
    pub fn never_queried(&self, node_count: usize) -> Vec<NodeId> {
        (0..node_count as NodeId)
            .filter(|n| !self.counts.contains_key(n))
            .collect()
    }

    /// Nodes queried at least `min_count` times, in ranking order.
    pub fn high_value_targets(&self, min_count: u64) -> Vec<NodeId> {
        self.ranking
            .iter()
            .copied()
            .take_while(|n| self.counts[n] >= min_count)
            .collect()
    }

    pub fn max_queried_node(&self) -> Option<NodeId> {
        self.counts.keys().next_back().copied()
    }

    /// Profile with `node`'s count replaced, leaving this one untouched.
    pub fn with_count(&self, node: NodeId, count: u64) -> Self {
        let mut counts = self.counts.clone();
        counts.insert(node, count);
        Self::from_counts(counts)
    }

    pub fn report(&self, top: usize, coverage_ks: &[usize]) -> ProfileReport {
        ProfileReport {
            total_queries: self.total,
            unique_targets: self.counts.len(),
            top_targets: self.workload().into_iter().take(top).collect(),
            high_value_targets: self.high_value_targets(2).len(),
            max_queried_node: self.max_queried_node(),
            coverage: coverage_ks
                .iter()
                .map(|&k| (k, self.top_k_coverage(k)))
                .collect(),
        }
    }
}
