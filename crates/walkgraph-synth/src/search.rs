use crate::{QueryProfile, StructuralParams, TierAssignment, TierBoundaries, TopologySynthesizer};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};
use walkgraph_core::{
    ConstraintViolation, GraphLimits, Result, SearchConfig, WalkGraphConfig, WalkGraphError,
};
use walkgraph_graph::WalkGraph;
use walkgraph_walk::{EvaluationSummary, Evaluator, WeightedScore};

/// Finite set of structural parameter tuples to try, in evaluation order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandidateGrid {
    candidates: Vec<StructuralParams>,
}

impl CandidateGrid {
    /// Cartesian product of the configured lists. Combinations whose medium
    /// tier would end before the high tier are left out.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        if let Some(w) = config.weight_triples.iter().find(|w| !w.is_strictly_ordered()) {
            return Err(WalkGraphError::InvalidParameter(format!(
                "weight triple {} must be positive with primary > secondary > backup",
                w
            )));
        }
        if config.skip_distances.contains(&0) {
            return Err(WalkGraphError::InvalidParameter(
                "skip distances must be at least 1".to_string(),
            ));
        }

        let mut candidates = Vec::new();
        for &tier_a in &config.tier_a_sizes {
            for &tier_b_end in &config.tier_b_ends {
                let Ok(boundaries) = TierBoundaries::by_rank(tier_a, tier_b_end) else {
                    debug!(tier_a, tier_b_end, "dropping inverted tier boundaries");
                    continue;
                };
                for &skip in &config.skip_distances {
                    for &weights in &config.weight_triples {
                        candidates.push(StructuralParams::new(boundaries, skip, weights));
                    }
                }
            }
        }
        Ok(Self { candidates })
    }

    pub fn from_params(candidates: Vec<StructuralParams>) -> Self {
        Self { candidates }
    }

    pub fn single(params: StructuralParams) -> Self {
        Self::from_params(vec![params])
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructuralParams> + '_ {
        self.candidates.iter()
    }
}

/// What happened to one grid entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateStatus {
    Evaluated {
        edges: usize,
        success_rate: f64,
        median_path_length: Option<f64>,
        score: f64,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Parameters requested by the grid.
    pub requested: StructuralParams,
    /// Parameters actually synthesized, after clamping and budget retries.
    pub effective: StructuralParams,
    pub retries: usize,
    pub status: CandidateStatus,
}

/// Winner of a search run plus the full candidate history.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub graph: WalkGraph,
    pub params: StructuralParams,
    pub tiers: TierAssignment,
    pub summary: EvaluationSummary,
    pub evaluated: usize,
    pub skipped: usize,
    pub history: Vec<CandidateRecord>,
}

struct Best {
    graph: WalkGraph,
    params: StructuralParams,
    tiers: TierAssignment,
    summary: EvaluationSummary,
}

/// Synthesize-and-evaluate driver over a [`CandidateGrid`].
///
/// Candidates that break a structural limit are skipped; a candidate over the
/// edge budget is first retried with a narrower medium tier. Every other
/// error, including a dead end found during evaluation, ends the run.
#[derive(Debug, Clone)]
pub struct SearchLoop {
    synthesizer: TopologySynthesizer,
    evaluator: Evaluator,
    boundary_retries: usize,
}

impl SearchLoop {
    pub fn new(limits: GraphLimits, evaluator: Evaluator) -> Self {
        Self {
            synthesizer: TopologySynthesizer::new(limits),
            evaluator,
            boundary_retries: 4,
        }
    }

    /// Loop wired from a full configuration, scoring with its
    /// `success_weight` and `length_weight`.
    pub fn from_config(config: &WalkGraphConfig) -> Self {
        let policy = WeightedScore::new(config.search.success_weight, config.search.length_weight);
        let evaluator = Evaluator::new(config.evaluation.clone()).with_score_policy(policy);
        Self::new(config.limits, evaluator)
            .with_boundary_retries(config.search.boundary_retries)
    }

    pub fn with_boundary_retries(mut self, retries: usize) -> Self {
        self.boundary_retries = retries;
        self
    }

    pub fn run(&self, profile: &QueryProfile, grid: &CandidateGrid) -> Result<SearchOutcome> {
        if profile.is_empty() {
            return Err(WalkGraphError::EmptyProfile);
        }
        if grid.is_empty() {
            return Err(WalkGraphError::InvalidParameter(
                "candidate grid is empty".to_string(),
            ));
        }
        let node_count = self.synthesizer.limits().node_count;
        let workload = profile.workload();
        info!(
            candidates = grid.len(),
            nodes = node_count,
            budget = self.synthesizer.limits().max_total_edges,
            "starting topology search"
        );

        let mut best: Option<Best> = None;
        let mut history = Vec::with_capacity(grid.len());
        let mut last_violation: Option<ConstraintViolation> = None;
        let (mut evaluated, mut skipped) = (0usize, 0usize);

        for requested in grid.iter() {
            let mut params = *requested;
            let mut retries = 0usize;
            let built = loop {
                let tiers = TierAssignment::from_profile(profile, node_count, params.boundaries)?;
                params.boundaries = tiers.boundaries();
                match self.synthesizer.synthesize(&tiers, &params) {
                    Ok(graph) => break Ok((graph, tiers)),
                    Err(WalkGraphError::ConstraintViolation(violation)) => {
                        match self.narrowed(&params, &violation, retries) {
                            Some(next) => {
                                debug!(
                                    from = %params.boundaries,
                                    to = %next,
                                    "retrying with narrower medium tier"
                                );
                                params.boundaries = next;
                                retries += 1;
                            }
                            None => break Err(violation),
                        }
                    }
                    Err(other) => return Err(other),
                }
            };

            let (graph, tiers) = match built {
                Ok(built) => built,
                Err(violation) => {
                    warn!(params = %requested, %violation, "skipping candidate");
                    skipped += 1;
                    history.push(CandidateRecord {
                        requested: *requested,
                        effective: params,
                        retries,
                        status: CandidateStatus::Skipped {
                            reason: violation.to_string(),
                        },
                    });
                    last_violation = Some(violation);
                    continue;
                }
            };

            let summary = self.evaluator.evaluate(&graph, &workload)?;
            evaluated += 1;
            debug!(params = %params, %summary, "candidate evaluated");
            history.push(CandidateRecord {
                requested: *requested,
                effective: params,
                retries,
                status: CandidateStatus::Evaluated {
                    edges: graph.edge_count(),
                    success_rate: summary.success_rate,
                    median_path_length: summary.median_path_length(),
                    score: summary.score,
                },
            });

            let improves = best.as_ref().is_none_or(|b| {
                rank(&summary, &graph, &b.summary, &b.graph) == Ordering::Greater
            });
            if improves {
                best = Some(Best {
                    graph,
                    params,
                    tiers,
                    summary,
                });
            }
        }

        let Some(best) = best else {
            return Err(match last_violation {
                Some(violation) => violation.into(),
                None => WalkGraphError::InvalidParameter("no candidate was evaluated".to_string()),
            });
        };
        info!(
            params = %best.params,
            evaluated,
            skipped,
            summary = %best.summary,
            "topology search complete"
        );
        Ok(SearchOutcome {
            graph: best.graph,
            params: best.params,
            tiers: best.tiers,
            summary: best.summary,
            evaluated,
            skipped,
            history,
        })
    }

    /// Boundaries for the next budget retry: the medium tier loses about two
    /// edges per demoted node, so it shrinks by half the excess.
    fn narrowed(
        &self,
        params: &StructuralParams,
        violation: &ConstraintViolation,
        retries: usize,
    ) -> Option<TierBoundaries> {
        let ConstraintViolation::EdgeBudgetExceeded { edges, budget } = *violation else {
            return None;
        };
        let current = params.boundaries;
        if retries >= self.boundary_retries || current.tier_b_end <= current.tier_a {
            return None;
        }
        let shrink = (edges - budget).div_ceil(2).max(1);
        Some(TierBoundaries {
            tier_a: current.tier_a,
            tier_b_end: current.tier_b_end.saturating_sub(shrink).max(current.tier_a),
        })
    }
}

/// Higher score wins; ties go to the shorter median, then the smaller graph.
fn rank(a: &EvaluationSummary, ga: &WalkGraph, b: &EvaluationSummary, gb: &WalkGraph) -> Ordering {
    let median = |s: &EvaluationSummary| s.median_path_length().unwrap_or(f64::INFINITY);
    a.score
        .total_cmp(&b.score)
        .then_with(|| median(b).total_cmp(&median(a)))
        .then_with(|| gb.edge_count().cmp(&ga.edge_count()))
}
