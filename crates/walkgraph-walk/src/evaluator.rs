use crate::{
    PathLengthStats, RandomSource, ScorePolicy, SeededSource, StepSampler, TransitionTable,
    WeightedSampler, WeightedScore,
};
use rand::{Rng, RngCore};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use walkgraph_core::{EvaluationConfig, NodeId, Result, StartDistribution, WalkGraphError};
use walkgraph_graph::WalkGraph;

/// Outcome of one simulated walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkResult {
    pub target: NodeId,
    pub start: NodeId,
    pub success: bool,
    /// Edges traversed; equals the step cap for exhausted walks.
    pub steps: usize,
    /// Visited nodes including the start. Empty unless paths are recorded.
    pub path: Vec<NodeId>,
    /// Node without outgoing edges that ended the walk, if any.
    pub dead_end: Option<NodeId>,
}

/// Per-target aggregate inside an [`EvaluationSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub target: NodeId,
    /// Share of the workload this target represents.
    pub weight: f64,
    pub trials: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub path_lengths: Option<PathLengthStats>,
}

/// Aggregate over a batch of walks, weighted by the workload mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub trials: usize,
    pub successes: usize,
    /// Query-frequency weighted success rate.
    pub success_rate: f64,
    /// Query-frequency weighted lengths of successful walks.
    pub path_lengths: Option<PathLengthStats>,
    pub step_cap: usize,
    pub score: f64,
    pub per_target: Vec<TargetSummary>,
}

impl EvaluationSummary {
    pub fn median_path_length(&self) -> Option<f64> {
        self.path_lengths.as_ref().map(|p| p.median)
    }

    pub fn target(&self, target: NodeId) -> Option<&TargetSummary> {
        self.per_target.iter().find(|t| t.target == target)
    }
}

impl fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "success {:.2}% over {} trials, median path {}, score {:.4}",
            self.success_rate * 100.0,
            self.trials,
            self.median_path_length()
                .map(|m| format!("{}", m))
                .unwrap_or_else(|| "n/a".to_string()),
            self.score
        )
    }
}

/// Monte Carlo evaluator for weighted random walks.
///
/// Sampling rule, random source and score policy are injectable; the defaults
/// are [`WeightedSampler`], [`SeededSource`] with the configured seed, and
/// [`WeightedScore`].
#[derive(Clone)]
pub struct Evaluator {
    settings: EvaluationConfig,
    sampler: Arc<dyn StepSampler>,
    source: Arc<dyn RandomSource>,
    policy: Arc<dyn ScorePolicy>,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("settings", &self.settings)
            .field("sampler", &self.sampler.name())
            .field("source", &self.source.name())
            .finish()
    }
}

impl Evaluator {
    pub fn new(settings: EvaluationConfig) -> Self {
        let source = SeededSource::new(settings.seed);
        Self {
            settings,
            sampler: Arc::new(WeightedSampler),
            source: Arc::new(source),
            policy: Arc::new(WeightedScore::default()),
        }
    }

    pub fn with_sampler(mut self, sampler: impl StepSampler + 'static) -> Self {
        self.sampler = Arc::new(sampler);
        self
    }

    pub fn with_random_source(mut self, source: impl RandomSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn with_score_policy(mut self, policy: impl ScorePolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn score(&self, summary: &EvaluationSummary) -> f64 {
        self.policy.score(summary)
    }

    /// Simulate a single walk from `start`, always recording the path.
    ///
    /// A dead end is reported on the result rather than as an error.
    pub fn walk_once(
        &self,
        graph: &WalkGraph,
        start: NodeId,
        target: NodeId,
        rng: &mut dyn RngCore,
    ) -> Result<WalkResult> {
        check_node(graph, start)?;
        check_node(graph, target)?;
        let table = TransitionTable::from_graph(graph)?;
        Ok(self.walk(&table, start, target, rng, true))
    }

    /// Evaluate `workload` with the configured number of trials per target.
    pub fn evaluate(
        &self,
        graph: &WalkGraph,
        workload: &[(NodeId, u64)],
    ) -> Result<EvaluationSummary> {
        self.evaluate_workload(graph, workload, self.settings.trials_per_target)
    }

    /// Run `trials` walks toward one target.
    pub fn evaluate_target(
        &self,
        graph: &WalkGraph,
        target: NodeId,
        trials: usize,
    ) -> Result<EvaluationSummary> {
        self.evaluate_workload(graph, &[(target, 1)], trials)
    }

    /// Run `trials_per_target` walks toward every target in `workload`
    /// (`(target, query_count)` pairs) and weight the per-target results by
    /// query count.
    ///
    /// Fails with [`WalkGraphError::StructuralInvariantViolation`] when any
    /// walk reaches a node without outgoing edges.
    pub fn evaluate_workload(
        &self,
        graph: &WalkGraph,
        workload: &[(NodeId, u64)],
        trials_per_target: usize,
    ) -> Result<EvaluationSummary> {
        if graph.node_count() == 0 {
            return Err(WalkGraphError::InvalidParameter(
                "cannot evaluate an empty graph".to_string(),
            ));
        }
        if let StartDistribution::Fixed(start) = self.settings.start {
            check_node(graph, start)?;
        }
        let total_queries: u64 = workload.iter().map(|&(_, count)| count).sum();
        if total_queries == 0 || trials_per_target == 0 {
            return Err(WalkGraphError::InvalidParameter(
                "workload needs at least one query and one trial".to_string(),
            ));
        }

        let table = TransitionTable::from_graph(graph)?;
        let mut per_target = Vec::with_capacity(workload.len());
        let mut weighted_lengths = Vec::new();
        let mut trials = 0usize;
        let mut successes = 0usize;
        let mut success_rate = 0.0;

        for &(target, count) in workload.iter().filter(|&&(_, count)| count > 0) {
            check_node(graph, target)?;
            let weight = count as f64 / total_queries as f64;
            let results = self.run_trials(&table, target, trials_per_target)?;

            let lengths: Vec<usize> = results
                .iter()
                .filter(|r| r.success)
                .map(|r| r.steps)
                .collect();
            let hits = lengths.len();
            let rate = hits as f64 / trials_per_target as f64;
            let per_walk = weight / trials_per_target as f64;
            weighted_lengths.extend(lengths.iter().map(|&len| (len, per_walk)));

            debug!(target, weight, rate, "target evaluated");
            trials += trials_per_target;
            successes += hits;
            success_rate += weight * rate;
            per_target.push(TargetSummary {
                target,
                weight,
                trials: trials_per_target,
                successes: hits,
                success_rate: rate,
                path_lengths: PathLengthStats::from_lengths(&lengths),
            });
        }

        let mut summary = EvaluationSummary {
            trials,
            successes,
            success_rate,
            path_lengths: PathLengthStats::from_weighted(weighted_lengths),
            step_cap: self.settings.step_cap,
            score: 0.0,
            per_target,
        };
        summary.score = self.policy.score(&summary);
        info!(
            targets = summary.per_target.len(),
            trials = summary.trials,
            success_rate = summary.success_rate,
            median = ?summary.median_path_length(),
            score = summary.score,
            "evaluation complete"
        );
        Ok(summary)
    }

    fn run_trials(
        &self,
        table: &TransitionTable,
        target: NodeId,
        trials: usize,
    ) -> Result<Vec<WalkResult>> {
        let record = self.settings.record_paths;
        let trial = |i: usize| {
            let mut rng = self.source.trial_rng(target, i as u64);
            let start = self.sample_start(table.node_count(), target, rng.as_mut());
            let result = self.walk(table, start, target, rng.as_mut(), record);
            match result.dead_end {
                Some(node) => Err(WalkGraphError::StructuralInvariantViolation { node, target }),
                None => Ok(result),
            }
        };

        if self.settings.parallel {
            (0..trials).into_par_iter().map(trial).collect()
        } else {
            (0..trials).map(trial).collect()
        }
    }

    fn sample_start(&self, node_count: usize, target: NodeId, rng: &mut dyn RngCore) -> NodeId {
        match self.settings.start {
            StartDistribution::Fixed(node) => node,
            StartDistribution::Uniform => rng.random_range(0..node_count) as NodeId,
            StartDistribution::UniformExcludingTarget if node_count > 1 => {
                let pick = rng.random_range(0..node_count - 1) as NodeId;
                if pick >= target {
                    pick + 1
                } else {
                    pick
                }
            }
            StartDistribution::UniformExcludingTarget => 0,
        }
    }

    /// Arrival on the target ends the walk on the step that reaches it; a
    /// walk starting on its target succeeds with zero steps.
    fn walk(
        &self,
        table: &TransitionTable,
        start: NodeId,
        target: NodeId,
        rng: &mut dyn RngCore,
        record: bool,
    ) -> WalkResult {
        let mut path = Vec::new();
        if record {
            path.push(start);
        }
        let mut current = start;
        let mut steps = 0usize;
        let mut dead_end = None;

        while current != target && steps < self.settings.step_cap {
            let Some(row) = table.row(current) else {
                dead_end = Some(current);
                break;
            };
            current = self.sampler.next(row, rng);
            steps += 1;
            if record {
                path.push(current);
            }
        }

        WalkResult {
            target,
            start,
            success: current == target,
            steps,
            path,
            dead_end,
        }
    }
}

fn check_node(graph: &WalkGraph, node: NodeId) -> Result<()> {
    if (node as usize) < graph.node_count() {
        Ok(())
    } else {
        Err(WalkGraphError::NodeOutOfRange {
            node,
            node_count: graph.node_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GreedySampler;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use walkgraph_graph::GraphBuilder;

    fn line(n: usize) -> WalkGraph {
        let mut builder = GraphBuilder::new(n);
        for i in 0..n as NodeId {
            builder.add_edge(i, (i + 1) % n as NodeId, 10.0).unwrap();
        }
        builder.build_unchecked()
    }

    fn settings(step_cap: usize) -> EvaluationConfig {
        EvaluationConfig {
            step_cap,
            ..EvaluationConfig::default()
        }
    }

    #[test]
    fn arrival_step_counts_once() {
        let evaluator = Evaluator::new(settings(10));
        let mut rng = StdRng::seed_from_u64(3);
        let result = evaluator.walk_once(&line(5), 1, 4, &mut rng).unwrap();
        assert!(result.success);
        assert_eq!(result.steps, 3);
        assert_eq!(result.path, vec![1, 2, 3, 4]);
    }

    #[test]
    fn starting_on_target_takes_zero_steps() {
        let evaluator = Evaluator::new(settings(10));
        let mut rng = StdRng::seed_from_u64(3);
        let result = evaluator.walk_once(&line(5), 2, 2, &mut rng).unwrap();
        assert!(result.success);
        assert_eq!(result.steps, 0);
    }

    #[test]
    fn step_cap_bounds_the_walk() {
        let evaluator = Evaluator::new(settings(3));
        let mut rng = StdRng::seed_from_u64(3);
        let result = evaluator.walk_once(&line(10), 0, 5, &mut rng).unwrap();
        assert!(!result.success);
        assert_eq!(result.steps, 3);
        assert_eq!(result.path.len(), 4);
    }

    #[test]
    fn dead_end_is_reported_on_single_walks() {
        let mut builder = GraphBuilder::new(3);
        builder.add_edge(0, 1, 1.0).unwrap();
        builder.add_edge(2, 0, 1.0).unwrap();
        let graph = builder.build_unchecked();

        let evaluator = Evaluator::new(settings(10)).with_sampler(GreedySampler);
        let mut rng = StdRng::seed_from_u64(0);
        let result = evaluator.walk_once(&graph, 0, 2, &mut rng).unwrap();
        assert!(!result.success);
        assert_eq!(result.dead_end, Some(1));
        assert_eq!(result.steps, 1);
    }

    #[test]
    fn out_of_range_nodes_are_rejected() {
        let evaluator = Evaluator::new(settings(10));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            evaluator.walk_once(&line(3), 0, 7, &mut rng),
            Err(WalkGraphError::NodeOutOfRange { node: 7, node_count: 3 })
        ));
        assert!(evaluator.evaluate_workload(&line(3), &[(1, 0)], 10).is_err());
    }

    #[test]
    fn excluding_target_never_starts_on_it() {
        let evaluator = Evaluator::new(EvaluationConfig {
            start: StartDistribution::UniformExcludingTarget,
            record_paths: true,
            ..settings(10)
        });
        let graph = line(4);
        let table = TransitionTable::from_graph(&graph).unwrap();
        let results = evaluator.run_trials(&table, 2, 200).unwrap();
        assert!(results.iter().all(|r| r.start != 2 && r.steps > 0));
        assert!(results.iter().any(|r| r.start == 3));
    }
}
