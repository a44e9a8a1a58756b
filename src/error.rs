//! Error and diagnostic types.
//!
//! None of these ever escape a core operation as a failure: layout errors are
//! caught inside the layout engine and turned into the grid fallback, and graph
//! diagnostics are collected into a list for the caller to inspect.

use thiserror::Error;

/// Why a hierarchical layout could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("root node '{0}' does not exist")]
    UnknownRoot(String),

    #[error("parent chain of node '{0}' loops back on itself")]
    CyclicParentage(String),

    #[error("node '{0}' is not reachable from root '{1}'")]
    Unreachable(String, String),
}

/// A reference problem found while validating or adapting a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GraphDiagnostic {
    #[error("Duplicate node ID: {node_id}")]
    DuplicateNode {
        #[serde(rename = "nodeId")]
        node_id: String,
    },

    #[error("Edge {edge_id} references non-existent source: {node_id}")]
    MissingSource {
        #[serde(rename = "edgeId")]
        edge_id: String,
        #[serde(rename = "nodeId")]
        node_id: String,
    },

    #[error("Edge {edge_id} references non-existent target: {node_id}")]
    MissingTarget {
        #[serde(rename = "edgeId")]
        edge_id: String,
        #[serde(rename = "nodeId")]
        node_id: String,
    },
}
