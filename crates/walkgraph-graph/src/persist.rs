// ABOUTME: Adjacency-map persistence for WalkGraph and query-log loading
// ABOUTME: Nodes are written as string keys: {"0": {"1": 10.0}, ...}
use crate::{GraphBuilder, WalkGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkgraph_core::{ConstraintViolation, NodeId, Result, WalkGraphError};

/// Persisted form: for every node, its destinations and weights.
pub type Adjacency = BTreeMap<String, BTreeMap<String, f64>>;

impl WalkGraph {
    pub fn to_adjacency(&self) -> Adjacency {
        self.nodes()
            .map(|node| {
                let row = self
                    .out_edges(node)
                    .iter()
                    .map(|e| (e.to.to_string(), e.weight))
                    .collect();
                (node.to_string(), row)
            })
            .collect()
    }

    /// Rebuild a graph from its persisted form.
    ///
    /// Every node `0..n` must appear as a key, where `n` is the number of
    /// keys. Edge-local rules are enforced; graph-wide limits are left to
    /// [`WalkGraph::validate`].
    pub fn from_adjacency(adjacency: &Adjacency) -> Result<Self> {
        let node_count = adjacency.len();
        let mut rows: Vec<Option<&BTreeMap<String, f64>>> = vec![None; node_count];
        for (key, row) in adjacency {
            let node = parse_node(key)?;
            if node as usize >= node_count {
                return Err(ConstraintViolation::NodeOutOfRange { node, node_count }.into());
            }
            rows[node as usize] = Some(row);
        }

        let mut builder = GraphBuilder::new(node_count);
        for (node, row) in rows.into_iter().enumerate() {
            let row = row.ok_or(ConstraintViolation::MissingNode {
                node: node as NodeId,
            })?;
            for (dest, weight) in row {
                builder.add_edge(node as NodeId, parse_node(dest)?, *weight)?;
            }
        }
        Ok(builder.build_unchecked())
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_adjacency())?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let adjacency: Adjacency = serde_json::from_str(content)?;
        Self::from_adjacency(&adjacency)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        info!(
            edges = self.edge_count(),
            "saved graph to {}",
            path.display()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let graph = Self::from_json_str(&content)?;
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "loaded graph from {}",
            path.display()
        );
        Ok(graph)
    }
}

fn parse_node(key: &str) -> Result<NodeId> {
    key.trim()
        .parse::<NodeId>()
        .map_err(|_| WalkGraphError::InvalidParameter(format!("invalid node id {:?}", key)))
}

/// A single record of the grader's results document. Only the target is
/// used; the remaining fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    pub target: NodeId,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryLogDocument {
    Results { detailed_results: Vec<QueryRecord> },
    Targets(Vec<NodeId>),
}

/// Parse a query log: either a results document with `detailed_results`
/// or a bare array of target ids. Order is preserved.
pub fn parse_query_log(content: &str) -> Result<Vec<NodeId>> {
    let document: QueryLogDocument = serde_json::from_str(content)?;
    Ok(match document {
        QueryLogDocument::Results { detailed_results } => {
            detailed_results.into_iter().map(|r| r.target).collect()
        }
        QueryLogDocument::Targets(targets) => targets,
    })
}

pub fn load_query_log(path: &Path) -> Result<Vec<NodeId>> {
    let content = fs::read_to_string(path)?;
    let log = parse_query_log(&content)?;
    debug!(queries = log.len(), "loaded query log from {}", path.display());
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_node_is_rejected() {
        let err = WalkGraph::from_json_str(r#"{"0": {"2": 1.0}, "2": {"0": 1.0}}"#).unwrap_err();
        assert!(matches!(
            err,
            WalkGraphError::ConstraintViolation(ConstraintViolation::NodeOutOfRange { node: 2, .. })
        ));

        let err = WalkGraph::from_json_str(r#"{"0": {"1": 1.0}, "x": {}}"#).unwrap_err();
        assert!(matches!(err, WalkGraphError::InvalidParameter(_)));
    }

    #[test]
    fn non_positive_weights_fail_at_parse_time() {
        let err = WalkGraph::from_json_str(r#"{"0": {"1": -2.0}, "1": {"0": 1.0}}"#).unwrap_err();
        assert!(matches!(
            err,
            WalkGraphError::ConstraintViolation(ConstraintViolation::InvalidWeight { .. })
        ));
    }

    #[test]
    fn query_log_accepts_results_document_and_array() {
        let doc = r#"{
            "detailed_results": [
                {"target": 3, "success": true, "path_length": 4},
                {"target": 0, "success": false},
                {"target": 3}
            ]
        }"#;
        assert_eq!(parse_query_log(doc).unwrap(), vec![3, 0, 3]);
        assert_eq!(parse_query_log("[1, 2, 2]").unwrap(), vec![1, 2, 2]);
        assert!(parse_query_log(r#"{"queries": []}"#).is_err());
    }
}
