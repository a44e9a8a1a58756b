//! FlowGraph - the facade composing the graph adapter, layout engine and
//! flow animation engine into one update cycle.
//!
//! The facade is the only place that reads from both engines. Positions come
//! from the layout side, quantities from the animation side, and neither
//! engine ever writes into the other.

use serde::{Deserialize, Serialize};

use crate::animation::{
    DEFAULT_TWEEN_DURATION, FlowAnimationEngine, FlowEvent, FlowEventInput, FlowParticle, Listener,
};
use crate::config::FlowGraphConfig;
use crate::error::GraphDiagnostic;
use crate::geometry::{Point, edge_color, node_color, node_radius, point_on_segment};
use crate::graph::{Edge, Node, NodePosition, SimulationGraph, SimulationNode, detect_cycles};
use crate::layout::{HierarchicalOutcome, LayoutEngine, LayoutKind, TickHandler};
use crate::spatial::{NodeCircle, SpatialIndex};

/// A complete graph as handed over by the host.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub flow_events: Vec<FlowEventInput>,
}

/// Paint-ready view of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: &'static str,
    pub data_amount: f64,
    pub max_capacity: f64,
}

/// Paint-ready view of a positionable edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    pub id: String,
    pub source: Point,
    pub target: Point,
    pub color: &'static str,
}

/// Paint-ready view of a particle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleView {
    pub id: String,
    pub edge_id: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: String,
}

/// Everything a rendering surface needs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderFrame {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub particles: Vec<ParticleView>,
}

pub struct FlowGraph {
    config: FlowGraphConfig,
    graph: SimulationGraph,
    layout: LayoutEngine,
    layout_kind: LayoutKind,
    animation: FlowAnimationEngine,
}

impl FlowGraph {
    pub fn new(config: FlowGraphConfig) -> Self {
        let config = config.sanitized();
        let layout_kind = if config.enable_force_simulation {
            LayoutKind::Force
        } else {
            LayoutKind::Grid
        };
        let animation = FlowAnimationEngine::new(config.particles_per_flow)
            .with_particle_spawn(config.particle_spawn)
            .with_pause_mode(config.pause_mode);

        Self {
            layout: LayoutEngine::from_config(&config),
            graph: SimulationGraph::default(),
            layout_kind,
            animation,
            config,
        }
    }

    pub fn config(&self) -> &FlowGraphConfig {
        &self.config
    }

    pub fn graph(&self) -> &SimulationGraph {
        &self.graph
    }

    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn animation(&self) -> &FlowAnimationEngine {
        &self.animation
    }

    pub fn layout_kind(&self) -> &LayoutKind {
        &self.layout_kind
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replace the graph. Nodes that survive keep their positions and pins.
    ///
    /// Returns the reference problems found in the new data.
    pub fn set_data(&mut self, nodes: &[Node], edges: &[Edge]) -> &[GraphDiagnostic] {
        let mut graph = SimulationGraph::build(nodes, edges);
        graph.carry_positions_from(&self.graph);
        self.graph = graph;

        self.animation.set_nodes(nodes);
        self.animation.set_edges(edges);
        self.apply_layout();

        for diagnostic in self.graph.diagnostics() {
            log::warn!("{diagnostic}");
        }
        self.graph.diagnostics()
    }

    /// Replace the graph and queue its flow events.
    pub fn load(&mut self, data: GraphData) -> Vec<GraphDiagnostic> {
        let diagnostics = self.set_data(&data.nodes, &data.edges).to_vec();
        for event in data.flow_events {
            self.add_flow_event(event);
        }
        diagnostics
    }

    pub fn diagnostics(&self) -> &[GraphDiagnostic] {
        self.graph.diagnostics()
    }

    /// Groups of node ids forming directed cycles.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let nodes: Vec<Node> = self.graph.nodes().iter().map(|n| n.node.clone()).collect();
        let edges: Vec<Edge> = self.graph.edges().iter().map(|e| e.edge.clone()).collect();
        detect_cycles(&nodes, &edges)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Switch layouts and apply the new one immediately.
    ///
    /// Leaving the circular layout releases the pins it placed.
    pub fn set_layout(&mut self, kind: LayoutKind) -> Option<HierarchicalOutcome> {
        if self.layout_kind == LayoutKind::Circular && kind != LayoutKind::Circular {
            self.graph.nodes_mut().iter_mut().for_each(SimulationNode::unpin);
        }
        self.layout_kind = kind;
        self.apply_layout()
    }

    fn apply_layout(&mut self) -> Option<HierarchicalOutcome> {
        match &self.layout_kind {
            LayoutKind::Force => {
                self.layout.create_force_layout(&mut self.graph, None);
                None
            }
            LayoutKind::Hierarchical { root_id } => {
                self.layout.clear();
                Some(self.layout.create_hierarchical_layout(&mut self.graph, root_id))
            }
            LayoutKind::Circular => {
                self.layout.clear();
                self.layout.create_circular_layout(self.graph.nodes_mut());
                None
            }
            LayoutKind::Grid => {
                self.layout.clear();
                self.layout.create_grid_layout(self.graph.nodes_mut());
                None
            }
        }
    }

    pub fn on_layout_tick(&mut self, handler: TickHandler) {
        self.layout.on_tick(handler);
    }

    pub fn stop_layout(&mut self) {
        self.layout.stop();
    }

    pub fn restart_layout(&mut self) {
        self.layout.restart();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.layout.update_size(width, height);
        self.config.width = self.layout.width();
        self.config.height = self.layout.height();
    }

    /// Pin a node at `(x, y)`, e.g. while it is dragged.
    ///
    /// Under the force layout the simulation is re-heated so neighbours
    /// follow; one-shot layouts leave every other node where it is.
    pub fn pin_node(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.pin(x, y);
        if self.layout_kind == LayoutKind::Force {
            self.layout.restart();
        }
        true
    }

    pub fn release_node(&mut self, id: &str) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.unpin();
        true
    }

    pub fn positions(&self) -> Vec<NodePosition> {
        self.graph.positions()
    }

    /// The node whose rendered circle contains `(x, y)`.
    pub fn node_at(&self, x: f64, y: f64) -> Option<&str> {
        let circles = self
            .graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| NodeCircle::new(i.into(), n.x, n.y, self.radius_of(&n.node)))
            .collect();
        let slot = SpatialIndex::build(circles).hit(x, y)?;
        self.graph.node_at_slot(slot).map(SimulationNode::id)
    }

    // =========================================================================
    // Animation
    // =========================================================================

    /// Queue a flow event and make sure the animation is running.
    pub fn add_flow_event(&mut self, event: FlowEventInput) -> bool {
        let added = self.animation.add_flow_event(event);
        self.animation.start();
        added
    }

    pub fn remove_flow_event(&mut self, id: &str) {
        self.animation.remove_flow_event(id);
    }

    /// Ease a node's quantity to `amount` (default 500 ms) and make sure the
    /// animation is running.
    pub fn update_node_data(&mut self, id: &str, amount: f64, duration: Option<f64>) {
        self.animation
            .update_node_data(id, amount, duration.unwrap_or(DEFAULT_TWEEN_DURATION));
        self.animation.start();
    }

    pub fn on(&mut self, listener: Listener) {
        self.animation.on(listener);
    }

    pub fn start(&mut self) {
        self.animation.start();
    }

    pub fn pause(&mut self) {
        self.animation.pause();
    }

    pub fn flow_events(&self) -> Vec<FlowEvent> {
        self.animation.get_flow_events()
    }

    pub fn particles(&self) -> Vec<FlowParticle> {
        self.animation.get_particles()
    }

    /// Advance both engines to host time `timestamp`.
    ///
    /// Collision radii follow the animated quantities.
    pub fn tick(&mut self, timestamp: f64) {
        if self.layout.is_running() {
            let radii: Vec<f64> = self
                .graph
                .nodes()
                .iter()
                .map(|n| self.radius_of(&n.node))
                .collect();
            self.layout.set_radii(&radii);
        }
        self.layout.tick(&mut self.graph);
        self.animation.tick(timestamp);
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Current node quantity: the animated value when tracked, else the input.
    fn current_node(&self, node: &Node) -> Node {
        match self.animation.node(&node.id) {
            Some(animated) => animated.clone(),
            None => node.clone(),
        }
    }

    fn radius_of(&self, node: &Node) -> f64 {
        let style = self.config.node_style;
        let amount = self
            .animation
            .node(&node.id)
            .map_or(node.data_amount, |n| n.data_amount);
        node_radius(amount, node.max_capacity, style.min_radius, style.max_radius)
    }

    /// Snapshot of everything positionable.
    pub fn frame(&self) -> RenderFrame {
        let style = self.config.node_style;
        let nodes = self
            .graph
            .nodes()
            .iter()
            .filter(|n| n.is_placed())
            .map(|n| {
                let node = self.current_node(&n.node);
                NodeView {
                    radius: node_radius(
                        node.data_amount,
                        node.max_capacity,
                        style.min_radius,
                        style.max_radius,
                    ),
                    color: node_color(node.data_amount, node.max_capacity),
                    id: node.id,
                    name: node.name,
                    x: n.x,
                    y: n.y,
                    data_amount: node.data_amount,
                    max_capacity: node.max_capacity,
                }
            })
            .collect();

        let edges = self
            .graph
            .edges()
            .iter()
            .filter_map(|e| {
                let (source, target) = self.graph.edge_points(e)?;
                Some(EdgeView {
                    id: e.edge.id.clone(),
                    source,
                    target,
                    color: edge_color(e.edge.flow, e.edge.capacity),
                })
            })
            .collect();

        let particles = self
            .animation
            .get_particles()
            .into_iter()
            .filter_map(|p| {
                let edge = self.graph.edge(&p.edge_id)?;
                let (source, target) = self.graph.edge_points(edge)?;
                let at = point_on_segment(source, target, p.progress);
                Some(ParticleView {
                    id: p.id,
                    edge_id: p.edge_id,
                    x: at.x,
                    y: at.y,
                    size: p.size,
                    color: p.color,
                })
            })
            .collect();

        RenderFrame {
            nodes,
            edges,
            particles,
        }
    }

    /// Stop everything and drop all animation state.
    pub fn destroy(&mut self) {
        self.animation.destroy();
        self.layout.stop();
        self.layout.clear();
    }
}

impl Default for FlowGraph {
    fn default() -> Self {
        Self::new(FlowGraphConfig::default())
    }
}
