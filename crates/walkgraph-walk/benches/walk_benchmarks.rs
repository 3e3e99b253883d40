use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::time::Duration;
use walkgraph_core::{EvaluationConfig, NodeId};
use walkgraph_graph::{GraphBuilder, WalkGraph};
use walkgraph_walk::{Evaluator, TransitionTable};

/// Random graph where every node has between one and three outgoing edges.
fn create_random_graph(node_count: usize) -> WalkGraph {
    fastrand::seed(7);
    let mut builder = GraphBuilder::new(node_count);
    for from in 0..node_count as NodeId {
        let degree = fastrand::usize(1..=3);
        while builder.out_degree(from) < degree {
            let to = fastrand::u32(..node_count as NodeId);
            if to != from && !builder.contains_edge(from, to) {
                builder
                    .add_edge(from, to, fastrand::f64() * 9.0 + 1.0)
                    .expect("edge within range");
            }
        }
    }
    builder.build_unchecked()
}

fn bench_transition_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition_table");
    for size in [100usize, 500] {
        let graph = create_random_graph(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| TransitionTable::from_graph(black_box(graph)).unwrap())
        });
    }
    group.finish();
}

fn bench_evaluate_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_workload");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let graph = create_random_graph(500);
    let workload: Vec<(NodeId, u64)> = (0..50).map(|t| (t, 50 - t as u64)).collect();

    for parallel in [false, true] {
        let evaluator = Evaluator::new(EvaluationConfig {
            trials_per_target: 200,
            parallel,
            ..EvaluationConfig::default()
        });
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_function(label, |b| {
            b.iter(|| evaluator.evaluate(black_box(&graph), &workload).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_transition_table, bench_evaluate_workload);
criterion_main!(benches);
