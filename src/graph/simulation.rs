//! SimulationGraph - the simulation-ready form of a node/edge list.
//!
//! Nodes are stored in an arena indexed by [`NodeSlot`]; edges hold slots
//! rather than references, so the layout step can mutate the arena freely.
//! A petgraph `DiGraph` mirrors the resolved topology with node indices that
//! match arena slots one to one.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::edge::{Edge, EdgeEnd, SimulationEdge};
use super::node::{Node, NodeSlot, SimulationNode};
use super::validate::validate_graph;
use crate::error::GraphDiagnostic;
use crate::geometry::Point;

/// Read-only position view of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// The graph consumed by the layout engine.
///
/// Rebuilt from scratch whenever the source graph changes shape; use
/// [`SimulationGraph::carry_positions_from`] to keep surviving nodes in place.
#[derive(Debug, Clone, Default)]
pub struct SimulationGraph {
    /// Node arena. Slot `i` is `nodes[i]` and `topology` node `i`.
    nodes: Vec<SimulationNode>,

    /// Every input edge, resolved or not, in input order.
    edges: Vec<SimulationEdge>,

    /// Resolved edges only. Edge weight is the index into `edges`.
    topology: DiGraph<NodeSlot, usize>,

    /// Node id to arena slot.
    slots: HashMap<String, NodeSlot>,

    /// Reference problems found while building.
    diagnostics: Vec<GraphDiagnostic>,
}

impl SimulationGraph {
    /// Build a simulation-ready graph.
    ///
    /// Duplicate node ids keep their first occurrence. Edges naming a missing
    /// node are kept with an [`EdgeEnd::Unresolved`] end and reported.
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Self {
        let diagnostics = validate_graph(nodes, edges);

        let mut arena = Vec::with_capacity(nodes.len());
        let mut slots = HashMap::with_capacity(nodes.len());
        let mut topology = DiGraph::with_capacity(nodes.len(), edges.len());

        for node in nodes {
            if slots.contains_key(&node.id) {
                continue;
            }
            let slot = NodeSlot::new(arena.len());
            let index = topology.add_node(slot);
            debug_assert_eq!(index.index(), slot.index());
            slots.insert(node.id.clone(), slot);
            arena.push(SimulationNode::new(node.clone()));
        }

        let resolve = |id: &str| match slots.get(id) {
            Some(&slot) => EdgeEnd::Resolved(slot),
            None => EdgeEnd::Unresolved(id.to_string()),
        };

        let mut sim_edges = Vec::with_capacity(edges.len());
        for edge in edges {
            let sim_edge = SimulationEdge {
                source: resolve(&edge.source_id),
                target: resolve(&edge.target_id),
                edge: edge.clone(),
            };
            match sim_edge.endpoints() {
                Some((s, t)) => {
                    topology.add_edge(
                        NodeIndex::new(s.index()),
                        NodeIndex::new(t.index()),
                        sim_edges.len(),
                    );
                }
                None => log::warn!("Edge {} references non-existent nodes", edge.id),
            }
            sim_edges.push(sim_edge);
        }

        Self {
            nodes: arena,
            edges: sim_edges,
            topology,
            slots,
            diagnostics,
        }
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    pub fn nodes(&self) -> &[SimulationNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [SimulationNode] {
        &mut self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn slot_of(&self, id: &str) -> Option<NodeSlot> {
        self.slots.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&SimulationNode> {
        self.slot_of(id).map(|slot| &self.nodes[slot.index()])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut SimulationNode> {
        let slot = self.slot_of(id)?;
        self.nodes.get_mut(slot.index())
    }

    pub fn node_at_slot(&self, slot: NodeSlot) -> Option<&SimulationNode> {
        self.nodes.get(slot.index())
    }

    /// Projection of every placed node's position.
    pub fn positions(&self) -> Vec<NodePosition> {
        self.nodes
            .iter()
            .filter(|n| n.is_placed())
            .map(|n| NodePosition {
                id: n.node.id.clone(),
                x: n.x,
                y: n.y,
            })
            .collect()
    }

    /// Copy position, velocity and pins of nodes that also exist in `previous`.
    pub fn carry_positions_from(&mut self, previous: &SimulationGraph) {
        for node in &mut self.nodes {
            if let Some(old) = previous.node(&node.node.id) {
                if old.is_placed() {
                    node.x = old.x;
                    node.y = old.y;
                    node.vx = old.vx;
                    node.vy = old.vy;
                    node.fx = old.fx;
                    node.fy = old.fy;
                }
            }
        }
    }

    // =========================================================================
    // Edges
    // =========================================================================

    pub fn edges(&self) -> &[SimulationEdge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, id: &str) -> Option<&SimulationEdge> {
        self.edges.iter().find(|e| e.edge.id == id)
    }

    /// Endpoint positions of an edge, or `None` if it is not positionable.
    pub fn edge_points(&self, edge: &SimulationEdge) -> Option<(Point, Point)> {
        let (s, t) = edge.endpoints()?;
        Some((
            self.nodes.get(s.index())?.point()?,
            self.nodes.get(t.index())?.point()?,
        ))
    }

    /// Resolved `(source, target)` slot pairs in input order.
    pub fn links(&self) -> impl Iterator<Item = (NodeSlot, NodeSlot)> + '_ {
        self.edges.iter().filter_map(SimulationEdge::endpoints)
    }

    /// Number of resolved edges touching a node, in either direction.
    pub fn degree(&self, slot: NodeSlot) -> usize {
        let index = NodeIndex::new(slot.index());
        self.topology.edges_directed(index, Direction::Outgoing).count()
            + self.topology.edges_directed(index, Direction::Incoming).count()
    }

    /// Source of the first edge (in input order) whose target is `slot`.
    pub fn first_parent(&self, slot: NodeSlot) -> Option<NodeSlot> {
        self.topology
            .edges_directed(NodeIndex::new(slot.index()), Direction::Incoming)
            .map(|e| *e.weight())
            .min()
            .and_then(|edge_index| self.edges[edge_index].source.slot())
    }

    pub fn topology(&self) -> &DiGraph<NodeSlot, usize> {
        &self.topology
    }

    pub fn diagnostics(&self) -> &[GraphDiagnostic] {
        &self.diagnostics
    }
}
