//! Layout Engine.
//!
//! Computes node positions for a [`SimulationGraph`] in one of four ways:
//!
//! - **force**: an iterative [`ForceSimulation`] advanced once per [`LayoutEngine::tick`]
//! - **hierarchical**: a left-to-right tidy tree, falling back to grid on bad topology
//! - **circular**: nodes pinned on a ring
//! - **grid**: row-major placement
//!
//! The engine never touches node quantities; it only writes positions,
//! velocities and pins.

pub mod force;
pub mod hierarchy;
pub mod placement;
pub mod tidy_tree;

use serde::Deserialize;

use crate::config::{FlowGraphConfig, ForceOptions, NodeStyle, clamp_dimension};
use crate::error::LayoutError;
use crate::geometry::Point;
use crate::graph::{SimulationGraph, SimulationNode};

pub use force::ForceSimulation;
pub use tidy_tree::{TidyTree, TreeCoord};

/// Handler notified with the live node array after every simulation step.
pub type TickHandler = Box<dyn FnMut(&[SimulationNode])>;

/// Which layout to apply.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LayoutKind {
    #[default]
    Force,
    Hierarchical {
        #[serde(rename = "rootId")]
        root_id: String,
    },
    Circular,
    Grid,
}

/// Result of a hierarchical layout request.
#[derive(Debug, Clone, PartialEq)]
pub enum HierarchicalOutcome {
    /// The tree was laid out.
    Tree,
    /// The topology was unusable; nodes were placed on a grid instead.
    GridFallback(LayoutError),
}

impl HierarchicalOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::GridFallback(_))
    }
}

/// Owns the active force simulation (if any) and the canvas size.
pub struct LayoutEngine {
    width: f64,
    height: f64,
    style: NodeStyle,
    force_defaults: ForceOptions,
    simulation: Option<ForceSimulation>,
    on_tick: Option<TickHandler>,
}

impl LayoutEngine {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: clamp_dimension(width, 800.0),
            height: clamp_dimension(height, 600.0),
            style: NodeStyle::default(),
            force_defaults: ForceOptions::default(),
            simulation: None,
            on_tick: None,
        }
    }

    /// Engine sized and styled from a facade configuration.
    pub fn from_config(config: &FlowGraphConfig) -> Self {
        Self {
            style: config.node_style,
            force_defaults: config.force.clone(),
            ..Self::new(config.width, config.height)
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn simulation(&self) -> Option<&ForceSimulation> {
        self.simulation.as_ref()
    }

    /// Whether a force simulation exists and is still stepping.
    pub fn is_running(&self) -> bool {
        self.simulation.as_ref().is_some_and(ForceSimulation::is_running)
    }

    /// Register the tick handler, replacing any previous one.
    pub fn on_tick(&mut self, handler: TickHandler) {
        self.on_tick = Some(handler);
    }

    /// Seed unplaced nodes on a ring and start a fresh force simulation.
    ///
    /// Any previous simulation is discarded.
    pub fn create_force_layout(
        &mut self,
        graph: &mut SimulationGraph,
        options: Option<ForceOptions>,
    ) -> &mut ForceSimulation {
        let seeded = placement::seed_ring(graph.nodes_mut(), self.width, self.height);
        let options = options
            .map(ForceOptions::sanitized)
            .unwrap_or_else(|| self.force_defaults.clone());
        log::debug!(
            "force layout over {} nodes ({} seeded on ring)",
            graph.node_count(),
            seeded
        );
        self.simulation
            .insert(ForceSimulation::new(graph, options, self.style, self.center()))
    }

    /// Lay the graph out as a tree rooted at `root_id`, or on a grid if the
    /// parentage is not a single tree.
    pub fn create_hierarchical_layout(
        &self,
        graph: &mut SimulationGraph,
        root_id: &str,
    ) -> HierarchicalOutcome {
        match hierarchy::layout(graph, root_id, self.width, self.height) {
            Ok(()) => HierarchicalOutcome::Tree,
            Err(err) => {
                log::debug!("hierarchical layout fell back to grid: {err}");
                self.create_grid_layout(graph.nodes_mut());
                HierarchicalOutcome::GridFallback(err)
            }
        }
    }

    pub fn create_circular_layout(&self, nodes: &mut [SimulationNode]) {
        placement::circular(nodes, self.width, self.height);
    }

    pub fn create_grid_layout(&self, nodes: &mut [SimulationNode]) {
        placement::grid(nodes, self.width, self.height);
    }

    pub fn stop(&mut self) {
        if let Some(sim) = self.simulation.as_mut() {
            sim.stop();
        }
    }

    /// Re-heat the active simulation. No-op without one.
    pub fn restart(&mut self) {
        if let Some(sim) = self.simulation.as_mut() {
            sim.restart();
        }
    }

    /// Drop the simulation entirely.
    pub fn clear(&mut self) {
        self.simulation = None;
    }

    /// Hand the simulation fresh rendered radii. No-op without one.
    pub fn set_radii(&mut self, rendered: &[f64]) {
        if let Some(sim) = self.simulation.as_mut() {
            sim.set_radii(rendered);
        }
    }

    /// Update the canvas size and retarget the center force.
    pub fn update_size(&mut self, width: f64, height: f64) {
        self.width = clamp_dimension(width, self.width);
        self.height = clamp_dimension(height, self.height);
        let center = self.center();
        if let Some(sim) = self.simulation.as_mut() {
            sim.set_center(center);
        }
    }

    /// Advance the force simulation one step.
    ///
    /// Returns true if a step was taken, in which case the tick handler has
    /// been called with the updated nodes.
    pub fn tick(&mut self, graph: &mut SimulationGraph) -> bool {
        let Some(sim) = self.simulation.as_mut() else {
            return false;
        };
        if !sim.step(graph.nodes_mut()) {
            return false;
        }
        if let Some(handler) = self.on_tick.as_mut() {
            handler(graph.nodes());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::graph::{Edge, Node};

    fn chain() -> SimulationGraph {
        let nodes = vec![
            Node::new("a", 10.0, 100.0),
            Node::new("b", 50.0, 100.0),
            Node::new("c", 90.0, 100.0),
        ];
        let edges = vec![Edge::new("e1", "a", "b"), Edge::new("e2", "b", "c")];
        SimulationGraph::build(&nodes, &edges)
    }

    fn positions(graph: &SimulationGraph) -> Vec<(f64, f64)> {
        graph.nodes().iter().map(|n| (n.x, n.y)).collect()
    }

    #[test]
    fn test_force_layout_seeds_and_ticks() {
        let mut graph = chain();
        let mut engine = LayoutEngine::new(800.0, 600.0);

        let ticks = Rc::new(Cell::new(0));
        let seen = ticks.clone();
        engine.on_tick(Box::new(move |nodes: &[SimulationNode]| {
            assert_eq!(nodes.len(), 3);
            seen.set(seen.get() + 1);
        }));

        engine.create_force_layout(&mut graph, None);
        assert!(graph.nodes().iter().all(SimulationNode::is_placed));
        assert!(engine.is_running());

        assert!(engine.tick(&mut graph));
        assert!(engine.tick(&mut graph));
        assert_eq!(ticks.get(), 2);
    }

    #[test]
    fn test_stop_and_restart() {
        let mut graph = chain();
        let mut engine = LayoutEngine::new(800.0, 600.0);
        engine.create_force_layout(&mut graph, None);

        engine.stop();
        let before = positions(&graph);
        assert!(!engine.tick(&mut graph));
        assert_eq!(positions(&graph), before);

        engine.restart();
        assert!(engine.is_running());
        assert_eq!(engine.simulation().map(ForceSimulation::alpha), Some(1.0));
        assert!(engine.tick(&mut graph));
    }

    #[test]
    fn test_tick_without_simulation() {
        let mut graph = chain();
        let mut engine = LayoutEngine::new(800.0, 600.0);
        assert!(!engine.tick(&mut graph));
        engine.restart();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_custom_options_are_sanitized() {
        let mut graph = chain();
        let mut engine = LayoutEngine::new(800.0, 600.0);
        let options = ForceOptions {
            center_strength: 5.0,
            ..Default::default()
        };
        let sim = engine.create_force_layout(&mut graph, Some(options));
        assert_eq!(sim.options().center_strength, 1.0);
    }

    #[test]
    fn test_update_size_retargets_center_only() {
        let mut graph = chain();
        let mut engine = LayoutEngine::new(800.0, 600.0);
        engine.create_force_layout(&mut graph, None);
        let before = positions(&graph);

        engine.update_size(1000.0, 400.0);
        assert_eq!(positions(&graph), before);
        assert_eq!(
            engine.simulation().map(ForceSimulation::center),
            Some(Point::new(500.0, 200.0))
        );

        engine.update_size(f64::NAN, -5.0);
        assert_eq!(engine.width(), 1000.0);
        assert_eq!(engine.height(), 1.0);
    }

    #[test]
    fn test_hierarchical_fallback_matches_grid() {
        // two disjoint loops: every candidate root sits on one of them
        let nodes: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| Node::new(*id, 0.0, 100.0))
            .collect();
        let edges = vec![
            Edge::new("e1", "a", "b"),
            Edge::new("e2", "b", "a"),
            Edge::new("e3", "c", "d"),
            Edge::new("e4", "d", "c"),
        ];
        let engine = LayoutEngine::new(800.0, 600.0);

        for root in ["a", "b", "c", "d"] {
            let mut tree = SimulationGraph::build(&nodes, &edges);
            let outcome = engine.create_hierarchical_layout(&mut tree, root);
            assert!(outcome.is_fallback(), "root {root}");

            let mut grid = SimulationGraph::build(&nodes, &edges);
            engine.create_grid_layout(grid.nodes_mut());
            assert_eq!(positions(&tree), positions(&grid));
        }
    }

    #[test]
    fn test_hierarchical_two_cycle_falls_back() {
        let nodes = vec![Node::new("a", 0.0, 100.0), Node::new("b", 0.0, 100.0)];
        let edges = vec![Edge::new("e1", "a", "b"), Edge::new("e2", "b", "a")];
        let engine = LayoutEngine::new(800.0, 600.0);

        for root in ["a", "b"] {
            let mut tree = SimulationGraph::build(&nodes, &edges);
            let outcome = engine.create_hierarchical_layout(&mut tree, root);
            assert_eq!(
                outcome,
                HierarchicalOutcome::GridFallback(LayoutError::CyclicParentage(root.into()))
            );

            let mut grid = SimulationGraph::build(&nodes, &edges);
            engine.create_grid_layout(grid.nodes_mut());
            assert_eq!(positions(&tree), positions(&grid));
        }
    }

    #[test]
    fn test_hierarchical_success() {
        let mut graph = chain();
        let engine = LayoutEngine::new(800.0, 600.0);
        assert_eq!(
            engine.create_hierarchical_layout(&mut graph, "a"),
            HierarchicalOutcome::Tree
        );
        let xs: Vec<f64> = graph.nodes().iter().map(|n| n.x).collect();
        assert_eq!(xs, vec![50.0, 400.0, 750.0]);
    }

    #[test]
    fn test_circular_pins_against_running_force() {
        let mut graph = chain();
        let mut engine = LayoutEngine::new(800.0, 600.0);
        engine.create_force_layout(&mut graph, None);
        engine.create_circular_layout(graph.nodes_mut());
        let pinned = positions(&graph);

        for _ in 0..10 {
            engine.tick(&mut graph);
        }
        assert_eq!(positions(&graph), pinned);
    }

    #[test]
    fn test_layout_kind_deserialize() {
        let kind: LayoutKind =
            serde_json::from_str(r#"{"type": "hierarchical", "rootId": "n1"}"#).unwrap();
        assert_eq!(
            kind,
            LayoutKind::Hierarchical {
                root_id: "n1".into()
            }
        );
        let kind: LayoutKind = serde_json::from_str(r#"{"type": "grid"}"#).unwrap();
        assert_eq!(kind, LayoutKind::Grid);
    }
}
