//! Edge types.
//!
//! An [`Edge`] names its endpoints by node id. A [`SimulationEdge`] resolves
//! those ids to arena slots, keeping the raw id when resolution fails.

use serde::{Deserialize, Serialize};

use super::node::NodeSlot;

/// A directed connection carrying flow between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    #[serde(rename = "source", alias = "sourceId")]
    pub source_id: String,
    #[serde(rename = "target", alias = "targetId")]
    pub target_id: String,
    #[serde(default)]
    pub flow: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
    /// Travel speed hint in pixels per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_id: source.into(),
            target_id: target.into(),
            flow: 0.0,
            capacity: None,
            speed: None,
        }
    }
}

/// One end of a [`SimulationEdge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeEnd {
    /// Resolved to a live node in the arena.
    Resolved(NodeSlot),
    /// The referenced node does not exist; not positionable.
    Unresolved(String),
}

impl EdgeEnd {
    #[inline]
    pub fn slot(&self) -> Option<NodeSlot> {
        match self {
            Self::Resolved(slot) => Some(*slot),
            Self::Unresolved(_) => None,
        }
    }
}

/// An edge whose endpoints have been resolved against the node arena.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationEdge {
    pub edge: Edge,
    pub source: EdgeEnd,
    pub target: EdgeEnd,
}

impl SimulationEdge {
    #[inline]
    pub fn id(&self) -> &str {
        &self.edge.id
    }

    /// Both endpoint slots, if both resolved.
    #[inline]
    pub fn endpoints(&self) -> Option<(NodeSlot, NodeSlot)> {
        Some((self.source.slot()?, self.target.slot()?))
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.endpoints().is_some()
    }
}
