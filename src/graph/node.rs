//! Node types.
//!
//! A [`Node`] is the plain record supplied by the host. A [`SimulationNode`]
//! wraps it with the mutable position, velocity and pin fields owned by the
//! layout engine. Nodes live in an arena and are addressed by [`NodeSlot`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Arena index of a node inside a [`super::SimulationGraph`].
///
/// Slots are only meaningful for the graph that produced them; rebuilding the
/// graph may reassign them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeSlot(pub u32);

impl NodeSlot {
    #[inline]
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}

impl From<usize> for NodeSlot {
    #[inline]
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

/// Fixed initial position supplied with a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A graph vertex carrying a quantity.
///
/// `data_amount` may momentarily exceed `max_capacity`; only derived visuals
/// are clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub data_amount: f64,
    pub max_capacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Node {
    /// Minimal node with the given quantity and capacity.
    pub fn new(id: impl Into<String>, data_amount: f64, max_capacity: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            data_amount,
            max_capacity,
            position: None,
            node_type: None,
            metadata: None,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position { x, y });
        self
    }
}

/// A node as seen by the layout engine.
///
/// `x`/`y` are NaN until the node has been placed. When `fx`/`fy` are set the
/// node is pinned on that axis and physics leaves it alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationNode {
    #[serde(flatten)]
    pub node: Node,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

impl SimulationNode {
    pub fn new(node: Node) -> Self {
        let (x, y) = node
            .position
            .map(|p| (p.x, p.y))
            .unwrap_or((f64::NAN, f64::NAN));
        Self {
            node,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.node.id
    }

    /// Whether the node has a usable position.
    #[inline]
    pub fn is_placed(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Current position, or `None` while unplaced.
    #[inline]
    pub fn point(&self) -> Option<Point> {
        self.is_placed().then(|| Point::new(self.x, self.y))
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }

    /// Pin the node at `(x, y)` and move it there.
    pub fn pin(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.fx = Some(x);
        self.fy = Some(y);
        self.vx = 0.0;
        self.vy = 0.0;
    }

    pub fn unpin(&mut self) {
        self.fx = None;
        self.fy = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_slot() {
        let slot = NodeSlot::new(42);
        assert_eq!(slot.index(), 42);
        assert_eq!(format!("{}", slot), "Slot(42)");
        let from: NodeSlot = 7usize.into();
        assert_eq!(from, NodeSlot(7));
    }

    #[test]
    fn test_node_deserialize() {
        let node: Node = serde_json::from_str(
            r#"{"id":"w1","name":"Warehouse","dataAmount":40,"maxCapacity":100,
                "type":"warehouse","metadata":{"city":"Oslo"}}"#,
        )
        .unwrap();
        assert_eq!(node.id, "w1");
        assert_eq!(node.node_type.as_deref(), Some("warehouse"));
        assert_eq!(node.data_amount, 40.0);
        assert!(node.position.is_none());
        assert_eq!(node.metadata.unwrap()["city"], "Oslo");
    }

    #[test]
    fn test_simulation_node_unplaced_by_default() {
        let sim = SimulationNode::new(Node::new("a", 1.0, 10.0));
        assert!(!sim.is_placed());
        assert_eq!(sim.point(), None);
        assert!(!sim.is_pinned());
    }

    #[test]
    fn test_simulation_node_carries_position() {
        let sim = SimulationNode::new(Node::new("a", 1.0, 10.0).with_position(3.0, 4.0));
        assert_eq!(sim.point(), Some(Point::new(3.0, 4.0)));
    }

    #[test]
    fn test_pin_unpin() {
        let mut sim = SimulationNode::new(Node::new("a", 1.0, 10.0));
        sim.vx = 5.0;
        sim.pin(10.0, 20.0);
        assert!(sim.is_pinned());
        assert_eq!((sim.x, sim.y), (10.0, 20.0));
        assert_eq!(sim.vx, 0.0);

        sim.unpin();
        assert!(!sim.is_pinned());
        assert_eq!((sim.x, sim.y), (10.0, 20.0));
    }
}
