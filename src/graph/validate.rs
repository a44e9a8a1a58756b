//! Graph validation and cycle detection over plain node/edge lists.

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;

use super::edge::Edge;
use super::node::Node;
use crate::error::GraphDiagnostic;

/// Check id uniqueness and edge endpoint references.
///
/// Never fails: every problem is returned as a diagnostic, in input order.
pub fn validate_graph(nodes: &[Node], edges: &[Edge]) -> Vec<GraphDiagnostic> {
    let mut diagnostics = Vec::new();
    let mut ids: HashSet<&str> = HashSet::with_capacity(nodes.len());

    for node in nodes {
        if !ids.insert(node.id.as_str()) {
            diagnostics.push(GraphDiagnostic::DuplicateNode {
                node_id: node.id.clone(),
            });
        }
    }

    for edge in edges {
        if !ids.contains(edge.source_id.as_str()) {
            diagnostics.push(GraphDiagnostic::MissingSource {
                edge_id: edge.id.clone(),
                node_id: edge.source_id.clone(),
            });
        }
        if !ids.contains(edge.target_id.as_str()) {
            diagnostics.push(GraphDiagnostic::MissingTarget {
                edge_id: edge.id.clone(),
                node_id: edge.target_id.clone(),
            });
        }
    }

    diagnostics
}

/// Find the directed cycles of a graph, one group of node ids per cycle.
///
/// Groups are strongly connected components with more than one member, plus
/// single nodes with a self-loop. Ids within a group follow input order.
/// Edges with a missing endpoint are ignored.
pub fn detect_cycles(nodes: &[Node], edges: &[Edge]) -> Vec<Vec<String>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), edges.len());
    let mut index_of = HashMap::with_capacity(nodes.len());
    for (order, node) in nodes.iter().enumerate() {
        index_of
            .entry(node.id.as_str())
            .or_insert_with(|| graph.add_node(order));
    }

    for edge in edges {
        if let (Some(&s), Some(&t)) = (
            index_of.get(edge.source_id.as_str()),
            index_of.get(edge.target_id.as_str()),
        ) {
            graph.add_edge(s, t, ());
        }
    }

    let mut cycles: Vec<Vec<usize>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || graph.contains_edge(component[0], component[0])
        })
        .map(|component| {
            let mut order: Vec<usize> = component.iter().map(|&ix| graph[ix]).collect();
            order.sort_unstable();
            order
        })
        .collect();
    cycles.sort_by_key(|order| order[0]);

    cycles
        .into_iter()
        .map(|order| order.into_iter().map(|i| nodes[i].id.clone()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| Node::new(*id, 0.0, 100.0)).collect()
    }

    #[test]
    fn test_valid_graph_has_no_diagnostics() {
        let n = nodes(&["a", "b"]);
        let e = vec![Edge::new("e1", "a", "b")];
        assert!(validate_graph(&n, &e).is_empty());
    }

    #[test]
    fn test_duplicates_and_missing_endpoints_reported() {
        let n = nodes(&["a", "b", "a"]);
        let e = vec![Edge::new("e1", "a", "ghost"), Edge::new("e2", "void", "b")];
        let diagnostics = validate_graph(&n, &e);

        assert_eq!(
            diagnostics,
            vec![
                GraphDiagnostic::DuplicateNode { node_id: "a".into() },
                GraphDiagnostic::MissingTarget {
                    edge_id: "e1".into(),
                    node_id: "ghost".into()
                },
                GraphDiagnostic::MissingSource {
                    edge_id: "e2".into(),
                    node_id: "void".into()
                },
            ]
        );
    }

    #[test]
    fn test_detect_cycles() {
        let n = nodes(&["a", "b", "c", "d", "e"]);
        let e = vec![
            Edge::new("1", "a", "b"),
            Edge::new("2", "b", "c"),
            Edge::new("3", "c", "a"),
            Edge::new("4", "c", "d"),
            Edge::new("5", "e", "e"),
        ];
        let cycles = detect_cycles(&n, &e);
        assert_eq!(cycles, vec![vec!["a", "b", "c"], vec!["e"]]);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let n = nodes(&["a", "b", "c"]);
        let e = vec![Edge::new("1", "a", "b"), Edge::new("2", "a", "c")];
        assert!(detect_cycles(&n, &e).is_empty());
    }
}
