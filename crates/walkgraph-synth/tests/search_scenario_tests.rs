use approx::assert_relative_eq;
use walkgraph_core::{EvaluationConfig, GraphLimits, NodeId, SearchConfig, WeightTriple};
use walkgraph_graph::GraphBuilder;
use walkgraph_synth::*;
use walkgraph_walk::Evaluator;

/// 1000 queries: nodes 0-9 take 63%, nodes 10-49 take 36%, nodes 50-59 the rest.
fn concentrated_log() -> Vec<NodeId> {
    let mut log = Vec::with_capacity(1000);
    for round in 0..63 {
        log.extend(0..10);
        if round < 9 {
            log.extend(10..50);
        }
    }
    log.extend(50..60);
    log
}

#[test]
fn concentrated_workload_on_500_nodes() {
    let profile = QueryProfile::from_log(&concentrated_log()).unwrap();
    assert_eq!(profile.total_queries(), 1000);
    assert_relative_eq!(profile.top_k_coverage(10), 0.63, epsilon = 1e-12);
    assert_relative_eq!(profile.top_k_coverage(50), 0.99, epsilon = 1e-12);

    let grid = CandidateGrid::from_config(&SearchConfig {
        tier_a_sizes: vec![10],
        tier_b_ends: vec![50],
        skip_distances: vec![2, 3],
        weight_triples: vec![WeightTriple::new(10.0, 8.0, 1.0), WeightTriple::new(10.0, 0.1, 0.01)],
        ..SearchConfig::default()
    })
    .unwrap();
    assert_eq!(grid.len(), 4);

    let evaluator = Evaluator::new(EvaluationConfig {
        trials_per_target: 300,
        step_cap: 50,
        ..EvaluationConfig::default()
    });
    let limits = GraphLimits::new(500, 1000);
    let outcome = SearchLoop::new(limits, evaluator).run(&profile, &grid).unwrap();

    assert_eq!(outcome.evaluated, 4);
    assert_eq!(outcome.skipped, 0);
    assert!(outcome.graph.edge_count() <= 1000);
    assert_eq!(outcome.graph.edge_count(), 579);
    assert!(outcome.graph.validate(&limits).is_ok());
    assert!(
        outcome.summary.success_rate >= 0.95,
        "success rate {}",
        outcome.summary.success_rate
    );
    let median = outcome.summary.median_path_length().unwrap();
    assert!(median <= 10.0, "median path length {}", median);

    // The winner has the best score in the history.
    let best_score = outcome
        .history
        .iter()
        .filter_map(|r| match r.status {
            CandidateStatus::Evaluated { score, .. } => Some(score),
            CandidateStatus::Skipped { .. } => None,
        })
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(outcome.summary.score, best_score);
    assert_eq!(outcome.tiers.tier_a(), &(0..10).collect::<Vec<_>>()[..]);
}

#[test]
fn unreachable_target_lowers_success_proportionally() {
    // Nodes 0..6 cycle among themselves; 6..8 only reach each other.
    let mut builder = GraphBuilder::new(8);
    for i in 0..6 {
        builder.add_edge(i, (i + 1) % 6, 10.0).unwrap();
    }
    builder.add_edge(6, 7, 10.0).unwrap();
    builder.add_edge(7, 6, 10.0).unwrap();
    let graph = builder.build_unchecked();

    let profile = QueryProfile::from_log(&[4; 25]).unwrap();
    let summary = Evaluator::new(EvaluationConfig {
        trials_per_target: 4000,
        ..EvaluationConfig::default()
    })
    .evaluate(&graph, &profile.workload())
    .unwrap();

    assert!(summary.success_rate < 1.0);
    assert_relative_eq!(summary.success_rate, 0.75, epsilon = 0.03);
}

#[test]
fn budget_pressure_narrows_the_medium_tier() {
    let profile = QueryProfile::from_log(&concentrated_log()).unwrap();
    let params = StructuralParams::new(
        TierBoundaries::by_rank(10, 400).unwrap(),
        3,
        WeightTriple::new(10.0, 0.1, 0.01),
    );
    let evaluator = Evaluator::new(EvaluationConfig {
        trials_per_target: 20,
        ..EvaluationConfig::default()
    });
    let outcome = SearchLoop::new(GraphLimits::new(500, 1000), evaluator)
        .run(&profile, &CandidateGrid::single(params))
        .unwrap();

    let record = &outcome.history[0];
    assert!(record.retries >= 1);
    assert!(record.effective.boundaries.tier_b_end < 400);
    assert!(outcome.graph.edge_count() <= 1000);
}
