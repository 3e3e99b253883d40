use walkgraph_core::{GraphLimits, NodeId};
use walkgraph_graph::{load_query_log, GraphBuilder, WalkGraph};

/// Three-tier style graph: chain 0..3, a small medium ring, the rest to 0.
fn sample_graph() -> WalkGraph {
    let mut builder = GraphBuilder::new(10);
    for i in 0..3 {
        builder.add_edge(i, i + 1, 10.0).unwrap();
    }
    for i in 3..6 {
        let next = if i == 5 { 0 } else { i + 1 };
        builder.add_edge(i, next, 10.0).unwrap();
        builder.add_edge(i, 3 + (i - 3 + 2) % 3, 8.0).unwrap();
        if !builder.contains_edge(i, 0) {
            builder.add_edge(i, 0, 1.0).unwrap();
        }
    }
    for i in 6..10 {
        builder.add_edge(i, 0, 0.1 + i as f64 / 7.0).unwrap();
    }
    builder.build(&GraphLimits::new(10, 30)).unwrap()
}

#[test]
fn json_round_trip_preserves_edges_and_weights() {
    let graph = sample_graph();
    let json = graph.to_json_string().unwrap();
    let parsed = WalkGraph::from_json_str(&json).unwrap();

    assert_eq!(parsed, graph);
    for edge in graph.edges() {
        assert_eq!(parsed.weight(edge.from, edge.to), Some(edge.weight));
    }
    assert_eq!(parsed.to_json_string().unwrap(), json);
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let graph = sample_graph();

    graph.save(&path).unwrap();
    let loaded = WalkGraph::load(&path).unwrap();
    assert_eq!(loaded, graph);
    assert!(loaded.validate(&GraphLimits::new(10, 30)).is_ok());
}

#[test]
fn string_keys_sort_lexicographically_but_parse_numerically() {
    let graph = sample_graph();
    let adjacency = graph.to_adjacency();
    let keys: Vec<&str> = adjacency.keys().map(String::as_str).take(3).collect();
    assert_eq!(keys, vec!["0", "1", "2"]);
    assert!(adjacency.contains_key("9"));

    let parsed = WalkGraph::from_adjacency(&adjacency).unwrap();
    let dests: Vec<NodeId> = parsed.out_edges(9).iter().map(|e| e.to).collect();
    assert_eq!(dests, vec![0]);
}

#[test]
fn loads_results_document_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    std::fs::write(
        &path,
        r#"{"detailed_results": [{"target": 7}, {"target": 1}, {"target": 7}]}"#,
    )
    .unwrap();
    assert_eq!(load_query_log(&path).unwrap(), vec![7, 1, 7]);
}

#[test]
fn arbitrary_weights_round_trip_bit_for_bit() {
    let mut rng = fastrand::Rng::with_seed(0x5EED);
    for _ in 0..20 {
        let mut builder = GraphBuilder::new(500);
        for from in 0..500 {
            while builder.out_degree(from) < 3 {
                let to = rng.u32(..500);
                if !builder.contains_edge(from, to) {
                    let weight = 0.001 + rng.f64() * 9.999;
                    builder.add_edge(from, to, weight).unwrap();
                }
            }
        }
        let graph = builder.build_unchecked();

        let parsed = WalkGraph::from_json_str(&graph.to_json_string().unwrap()).unwrap();
        for edge in graph.edges() {
            let weight = parsed.weight(edge.from, edge.to).unwrap();
            assert_eq!(
                weight.to_bits(),
                edge.weight.to_bits(),
                "{} -> {}: {} parsed as {}",
                edge.from,
                edge.to,
                edge.weight,
                weight
            );
        }
        assert_eq!(parsed.edge_count(), graph.edge_count());
    }
}
