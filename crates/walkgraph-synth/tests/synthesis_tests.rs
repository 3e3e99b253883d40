use rand::rngs::StdRng;
use rand::SeedableRng;
use walkgraph_core::{EvaluationConfig, GraphLimits, NodeId, WalkGraphError, WeightTriple};
use walkgraph_graph::WalkGraph;
use walkgraph_synth::*;
use walkgraph_walk::{Evaluator, GreedySampler};

fn skewed_log() -> Vec<NodeId> {
    let mut log = Vec::new();
    for round in 0..9 {
        log.extend(0..10);
        if round % 2 == 0 {
            log.extend(10..40);
        }
    }
    log.extend([77, 78, 79]);
    log
}

fn reference_params(skip: usize, weights: WeightTriple) -> StructuralParams {
    StructuralParams::new(TierBoundaries::by_rank(10, 50).unwrap(), skip, weights)
}

fn synthesize(params: &StructuralParams) -> (WalkGraph, TierAssignment) {
    let profile = QueryProfile::from_log(&skewed_log()).unwrap();
    let tiers = TierAssignment::from_profile(&profile, 200, params.boundaries).unwrap();
    let graph = TopologySynthesizer::new(GraphLimits::new(200, 400))
        .synthesize(&tiers, params)
        .unwrap();
    (graph, tiers)
}

#[test]
fn synthesized_graphs_satisfy_structural_invariants() {
    let limits = GraphLimits::new(200, 400);
    for skip in [1, 2, 3, 7, 40] {
        for weights in [WeightTriple::default(), WeightTriple::new(10.0, 0.1, 0.01)] {
            let (graph, _) = synthesize(&reference_params(skip, weights));
            assert!(graph.edge_count() <= limits.max_total_edges);
            assert!(graph.max_out_degree() <= limits.max_out_degree);
            for node in graph.nodes() {
                assert!(graph.out_degree(node) >= 1, "node {} is a dead end", node);
            }
            assert!(graph.edges().all(|e| e.weight > 0.0 && e.weight <= limits.max_weight));
            assert!(graph.validate(&limits).is_ok());
        }
    }
}

#[test]
fn synthesis_is_deterministic() {
    let params = reference_params(3, WeightTriple::default());
    let (first, _) = synthesize(&params);
    let (second, _) = synthesize(&params);
    assert_eq!(first, second);
    assert_eq!(first.to_json_string().unwrap(), second.to_json_string().unwrap());
}

#[test]
fn synthesized_graph_survives_a_round_trip() {
    let (graph, _) = synthesize(&reference_params(2, WeightTriple::new(10.0, 0.1, 0.01)));
    let parsed = WalkGraph::from_json_str(&graph.to_json_string().unwrap()).unwrap();
    assert_eq!(parsed, graph);
}

#[test]
fn greedy_walks_reach_each_designated_successor_in_one_step() {
    let (graph, tiers) = synthesize(&reference_params(3, WeightTriple::default()));
    let evaluator = Evaluator::new(EvaluationConfig::default()).with_sampler(GreedySampler);
    let mut rng = StdRng::seed_from_u64(11);

    let ranked: Vec<NodeId> = tiers.tier_a().iter().chain(tiers.tier_b()).copied().collect();
    let hub = tiers.hub().unwrap();
    for (i, &node) in ranked.iter().enumerate() {
        let successor = ranked.get(i + 1).copied().unwrap_or(hub);
        assert_eq!(designated_successor(&graph, node), Some(successor));
        let walk = evaluator.walk_once(&graph, node, successor, &mut rng).unwrap();
        assert!(walk.success);
        assert_eq!(walk.steps, 1);
    }
}

#[test]
fn low_tier_nodes_reach_any_high_tier_node_quickly() {
    let (graph, tiers) = synthesize(&reference_params(3, WeightTriple::default()));
    let evaluator = Evaluator::new(EvaluationConfig::default()).with_sampler(GreedySampler);
    let mut rng = StdRng::seed_from_u64(3);
    let start = tiers.tier_c()[0];
    for (rank, &target) in tiers.tier_a().iter().enumerate() {
        let walk = evaluator.walk_once(&graph, start, target, &mut rng).unwrap();
        assert!(walk.success);
        assert_eq!(walk.steps, rank + 1);
    }
}

#[test]
fn boosting_a_target_never_lowers_its_success_rate() {
    let (graph, _) = synthesize(&reference_params(3, WeightTriple::default()));
    let profile = QueryProfile::from_log(&skewed_log()).unwrap();
    let boosted = profile.with_count(35, 400);
    let evaluator = Evaluator::new(EvaluationConfig {
        trials_per_target: 100,
        ..EvaluationConfig::default()
    });

    let before = evaluator.evaluate(&graph, &profile.workload()).unwrap();
    let after = evaluator.evaluate(&graph, &boosted.workload()).unwrap();
    assert!(after.target(35).unwrap().success_rate >= before.target(35).unwrap().success_rate);
    assert!(after.target(35).unwrap().weight > before.target(35).unwrap().weight);
}

#[test]
fn empty_log_raises_empty_profile() {
    assert!(matches!(QueryProfile::from_log(&[]), Err(WalkGraphError::EmptyProfile)));
    let search = SearchLoop::new(
        GraphLimits::new(100, 200),
        Evaluator::new(EvaluationConfig::default()),
    );
    let err = search
        .run(&QueryProfile::empty(), &CandidateGrid::single(StructuralParams::default()))
        .unwrap_err();
    assert!(matches!(err, WalkGraphError::EmptyProfile));
    assert!(!err.is_recoverable());
}
