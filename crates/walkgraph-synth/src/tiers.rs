use crate::QueryProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use walkgraph_core::{ConstraintViolation, NodeId, Result, WalkGraphError};

/// Structural treatment bucket for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Highest-value targets, laid out as a forward chain.
    High,
    /// Medium-value targets, laid out as a ring with skip and backup edges.
    Medium,
    /// Everything else; each node points straight at the hub.
    Low,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::High => write!(f, "A"),
            Tier::Medium => write!(f, "B"),
            Tier::Low => write!(f, "C"),
        }
    }
}

/// Rank positions splitting the node order into three tiers: ranks
/// `0..tier_a` are high, `tier_a..tier_b_end` medium, the rest low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBoundaries {
    pub tier_a: usize,
    pub tier_b_end: usize,
}

impl TierBoundaries {
    /// Fixed boundaries by rank. The high tier needs at least one node since
    /// its head is the hub every low-tier node points at.
    pub fn by_rank(
        tier_a: usize,
        tier_b_end: usize,
    ) -> std::result::Result<Self, ConstraintViolation> {
        if tier_a == 0 {
            return Err(ConstraintViolation::TierLayout(
                "tier A must hold at least one node".to_string(),
            ));
        }
        if tier_b_end < tier_a {
            return Err(ConstraintViolation::TierLayout(format!(
                "tier B end {} precedes tier A end {}",
                tier_b_end, tier_a
            )));
        }
        Ok(Self { tier_a, tier_b_end })
    }

    /// Smallest boundaries whose top ranks cover `high_share` and
    /// `high_share + medium_share` of all queries respectively.
    pub fn by_coverage(profile: &QueryProfile, high_share: f64, medium_share: f64) -> Result<Self> {
        if profile.is_empty() {
            return Err(WalkGraphError::EmptyProfile);
        }
        let valid = |share: f64| share.is_finite() && (0.0..=1.0).contains(&share);
        if !valid(high_share) || !valid(medium_share) || high_share + medium_share > 1.0 + 1e-9 {
            return Err(WalkGraphError::InvalidParameter(format!(
                "coverage shares {} and {} must lie in [0, 1] and sum to at most 1",
                high_share, medium_share
            )));
        }
        let ranked = profile.ranking().len();
        let smallest_covering = |share: f64| {
            (1..=ranked)
                .find(|&k| profile.top_k_coverage(k) + 1e-12 >= share)
                .unwrap_or(ranked)
        };
        let tier_a = smallest_covering(high_share).max(1);
        let tier_b_end = smallest_covering(high_share + medium_share).max(tier_a);
        Ok(Self { tier_a, tier_b_end })
    }

    /// Same boundaries fitted to a graph of `node_count` nodes.
    pub fn clamp(self, node_count: usize) -> Self {
        let tier_a = self.tier_a.min(node_count);
        Self {
            tier_a,
            tier_b_end: self.tier_b_end.clamp(tier_a, node_count),
        }
    }
}

impl Default for TierBoundaries {
    fn default() -> Self {
        Self {
            tier_a: 10,
            tier_b_end: 50,
        }
    }
}

impl fmt::Display for TierBoundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A=[0,{}) B=[{},{})", self.tier_a, self.tier_a, self.tier_b_end)
    }
}

/// Partition of `0..node_count` into the three tiers.
///
/// Node order is the profile ranking followed by never-queried nodes in
/// ascending id; every node appears exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct TierAssignment {
    order: Vec<NodeId>,
    boundaries: TierBoundaries,
    tiers: Vec<Tier>,
}

impl TierAssignment {
    pub fn from_profile(
        profile: &QueryProfile,
        node_count: usize,
        boundaries: TierBoundaries,
    ) -> Result<Self> {
        if profile.is_empty() {
            return Err(WalkGraphError::EmptyProfile);
        }
        if let Some(node) = profile.max_queried_node() {
            if node as usize >= node_count {
                return Err(WalkGraphError::NodeOutOfRange { node, node_count });
            }
        }
        let mut order = profile.ranking().to_vec();
        order.extend(profile.never_queried(node_count));
        Ok(Self::from_order(order, boundaries))
    }

    /// Tiering that ignores query history and ranks nodes by id. Only used
    /// when a caller explicitly opts into it, e.g. for an empty log.
    pub fn fallback(node_count: usize, boundaries: TierBoundaries) -> Self {
        Self::from_order((0..node_count as NodeId).collect(), boundaries)
    }

    fn from_order(order: Vec<NodeId>, boundaries: TierBoundaries) -> Self {
        let boundaries = boundaries.clamp(order.len());
        let mut tiers = vec![Tier::Low; order.len()];
        for (rank, &node) in order.iter().enumerate() {
            tiers[node as usize] = if rank < boundaries.tier_a {
                Tier::High
            } else if rank < boundaries.tier_b_end {
                Tier::Medium
            } else {
                Tier::Low
            };
        }
        Self {
            order,
            boundaries,
            tiers,
        }
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Boundaries after clamping to the node count.
    pub fn boundaries(&self) -> TierBoundaries {
        self.boundaries
    }

    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn tier_a(&self) -> &[NodeId] {
        &self.order[..self.boundaries.tier_a]
    }

    pub fn tier_b(&self) -> &[NodeId] {
        &self.order[self.boundaries.tier_a..self.boundaries.tier_b_end]
    }

    pub fn tier_c(&self) -> &[NodeId] {
        &self.order[self.boundaries.tier_b_end..]
    }

    pub fn tier_of(&self, node: NodeId) -> Option<Tier> {
        self.tiers.get(node as usize).copied()
    }

    /// Head of the high tier: the most-queried node.
    pub fn hub(&self) -> Option<NodeId> {
        self.order.first().copied()
    }
}
