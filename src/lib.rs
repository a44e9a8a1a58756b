//! Flow Graph - WASM Module
//!
//! Flow animation and graph layout engines for the Flow Graph visualisation
//! library. Compiled to WebAssembly and exposed to JavaScript via
//! wasm-bindgen; the core is plain Rust and fully testable natively.
//!
//! # Architecture
//!
//! - `geometry`: radius, colour and segment helpers
//! - `graph`: node/edge model and the simulation-ready arena adapter
//! - `spatial`: R-tree over node circles for collision and hit testing
//! - `layout`: force simulation plus hierarchical, circular and grid layouts
//! - `animation`: flow events, particles and node quantity tweens
//! - `facade`: `FlowGraph`, composing everything into one update cycle

use js_sys::Function;
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

pub mod animation;
pub mod config;
pub mod error;
pub mod facade;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod spatial;

use animation::{FlowEvent, FlowEventInput, FlowParticle, Listener};
use config::FlowGraphConfig;
use facade::{FlowGraph, GraphData};
use graph::{Edge, Node, SimulationNode};
use layout::{HierarchicalOutcome, LayoutKind};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Serialize into plain JS objects (not `Map`s).
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&swb::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("serialize error: {e}")))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsError> {
    swb::from_value(value).map_err(|e| JsError::new(&format!("{what} parse error: {e}")))
}

/// Call a JS handler with one serialized argument, reporting failures to the console.
fn call_handler<T: Serialize + ?Sized>(f: &Function, value: &T) {
    let arg = match value.serialize(&swb::Serializer::json_compatible()) {
        Ok(arg) => arg,
        Err(e) => {
            web_sys::console::error_1(&JsValue::from_str(&format!("serialize error: {e}")));
            return;
        }
    };
    if let Err(err) = f.call1(&JsValue::UNDEFINED, &arg) {
        web_sys::console::error_1(&err);
    }
}

/// Main entry point for the flow graph.
///
/// Wraps [`FlowGraph`] and exposes it to JavaScript. The host drives time by
/// calling `tick(timestamp)` from its frame loop.
#[wasm_bindgen]
pub struct FlowGraphWasm {
    inner: FlowGraph,
}

#[wasm_bindgen]
impl FlowGraphWasm {
    /// Create a flow graph. Pass a config object, or undefined/null for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<FlowGraphWasm, JsError> {
        let config: FlowGraphConfig = if jsvalue_is_undefined_or_null(&config) {
            FlowGraphConfig::default()
        } else {
            from_js(config, "config")?
        };
        Ok(Self {
            inner: FlowGraph::new(config),
        })
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replace the graph. Returns the list of reference problems found.
    #[wasm_bindgen(js_name = setData)]
    pub fn set_data(&mut self, nodes: JsValue, edges: JsValue) -> Result<JsValue, JsError> {
        let nodes: Vec<Node> = from_js(nodes, "nodes")?;
        let edges: Vec<Edge> = from_js(edges, "edges")?;
        let diagnostics = self.inner.set_data(&nodes, &edges).to_vec();
        report(&diagnostics);
        to_js(&diagnostics)
    }

    /// Replace the graph from `{nodes, edges, flowEvents?}`.
    pub fn load(&mut self, data: JsValue) -> Result<JsValue, JsError> {
        let data: GraphData = from_js(data, "graph data")?;
        let diagnostics = self.inner.load(data);
        report(&diagnostics);
        to_js(&diagnostics)
    }

    #[wasm_bindgen(js_name = getDiagnostics)]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsError> {
        to_js(self.inner.diagnostics())
    }

    #[wasm_bindgen(js_name = detectCycles)]
    pub fn detect_cycles(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.detect_cycles())
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Apply a layout: `{type: "force" | "circular" | "grid"}` or
    /// `{type: "hierarchical", rootId}`.
    ///
    /// Returns true if a hierarchical layout fell back to the grid.
    #[wasm_bindgen(js_name = setLayout)]
    pub fn set_layout(&mut self, kind: JsValue) -> Result<bool, JsError> {
        let kind: LayoutKind = from_js(kind, "layout")?;
        let outcome = self.inner.set_layout(kind);
        if let Some(HierarchicalOutcome::GridFallback(err)) = &outcome {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "hierarchical layout failed, using grid: {err}"
            )));
        }
        Ok(outcome.is_some_and(|o| o.is_fallback()))
    }

    #[wasm_bindgen(js_name = stopLayout)]
    pub fn stop_layout(&mut self) {
        self.inner.stop_layout();
    }

    #[wasm_bindgen(js_name = restartLayout)]
    pub fn restart_layout(&mut self) {
        self.inner.restart_layout();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.inner.resize(width, height);
    }

    #[wasm_bindgen(js_name = pinNode)]
    pub fn pin_node(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.inner.pin_node(id, x, y)
    }

    #[wasm_bindgen(js_name = releaseNode)]
    pub fn release_node(&mut self, id: &str) -> bool {
        self.inner.release_node(id)
    }

    /// Id of the node whose circle contains the point, if any.
    #[wasm_bindgen(js_name = nodeAt)]
    pub fn node_at(&self, x: f64, y: f64) -> Option<String> {
        self.inner.node_at(x, y).map(str::to_string)
    }

    #[wasm_bindgen(js_name = getPositions)]
    pub fn get_positions(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.positions())
    }

    // =========================================================================
    // Animation
    // =========================================================================

    /// Animate a transfer `{id, edgeId, amount, duration}`. Starts the clock.
    ///
    /// Returns false if the edge is unknown.
    #[wasm_bindgen(js_name = addFlowEvent)]
    pub fn add_flow_event(&mut self, event: JsValue) -> Result<bool, JsError> {
        let event: FlowEventInput = from_js(event, "flow event")?;
        Ok(self.inner.add_flow_event(event))
    }

    #[wasm_bindgen(js_name = removeFlowEvent)]
    pub fn remove_flow_event(&mut self, id: &str) {
        self.inner.remove_flow_event(id);
    }

    /// Ease a node's quantity to `amount` over `duration` ms (default 500).
    #[wasm_bindgen(js_name = updateNodeData)]
    pub fn update_node_data(&mut self, id: &str, amount: f64, duration: Option<f64>) {
        self.inner.update_node_data(id, amount, duration);
    }

    pub fn start(&mut self) {
        self.inner.start();
    }

    pub fn pause(&mut self) {
        self.inner.pause();
    }

    /// Advance layout and animation to host time `timestamp` (ms).
    pub fn tick(&mut self, timestamp: f64) {
        self.inner.tick(timestamp);
    }

    #[wasm_bindgen(js_name = getParticles)]
    pub fn get_particles(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.particles())
    }

    #[wasm_bindgen(js_name = getFlowEvents)]
    pub fn get_flow_events(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.flow_events())
    }

    /// `{nodes, edges, particles}` ready to paint.
    pub fn frame(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.frame())
    }

    // =========================================================================
    // Handlers (one per kind; registering again replaces)
    // =========================================================================

    #[wasm_bindgen(js_name = onFlowComplete)]
    pub fn on_flow_complete(&mut self, f: Function) {
        self.inner
            .on(Listener::FlowComplete(Box::new(move |event: &FlowEvent| call_handler(&f, event))));
    }

    #[wasm_bindgen(js_name = onNodeUpdate)]
    pub fn on_node_update(&mut self, f: Function) {
        self.inner
            .on(Listener::NodeUpdate(Box::new(move |node: &Node| call_handler(&f, node))));
    }

    #[wasm_bindgen(js_name = onParticlesUpdate)]
    pub fn on_particles_update(&mut self, f: Function) {
        self.inner.on(Listener::ParticlesUpdate(Box::new(
            move |particles: &[FlowParticle]| call_handler(&f, particles),
        )));
    }

    /// Called with the node array after every force simulation step.
    #[wasm_bindgen(js_name = onLayoutTick)]
    pub fn on_layout_tick(&mut self, f: Function) {
        self.inner
            .on_layout_tick(Box::new(move |nodes: &[SimulationNode]| {
                call_handler(&f, nodes)
            }));
    }

    /// Stop everything and drop all state. The instance cannot be restarted.
    pub fn destroy(&mut self) {
        self.inner.destroy();
    }
}

fn report(diagnostics: &[error::GraphDiagnostic]) {
    for diagnostic in diagnostics {
        web_sys::console::warn_1(&JsValue::from_str(&diagnostic.to_string()));
    }
}

#[cfg(test)]
mod integration_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::animation::FlowStatus;
    use crate::geometry::FLOW_WARM;

    fn line(n: usize) -> (Vec<Node>, Vec<Edge>) {
        let nodes = (0..n)
            .map(|i| Node::new(format!("n{i}"), 0.0, 100.0))
            .collect();
        let edges = (1..n)
            .map(|i| Edge::new(format!("e{i}"), format!("n{}", i - 1), format!("n{i}")))
            .collect();
        (nodes, edges)
    }

    /// Flow event on one edge, checked against the half-duration expectations.
    #[test]
    fn test_flow_event_half_way() {
        let (nodes, edges) = line(2);
        let mut graph = FlowGraph::default();
        graph.set_data(&nodes, &edges);

        graph.add_flow_event(FlowEventInput::new("f1", "e1", 60.0, 1000.0));
        graph.tick(500.0);

        let events = graph.flow_events();
        assert!((events[0].progress - 0.5).abs() < 1e-9);
        assert_eq!(events[0].status, FlowStatus::Active);

        let progress: Vec<f64> = graph.particles().iter().map(|p| p.progress).collect();
        let expected = [0.5, 5.0 / 6.0, 1.0 / 6.0];
        for (got, want) in progress.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
        assert!(graph.particles().iter().all(|p| p.color == FLOW_WARM));
    }

    /// Quantity transition sampled half way through.
    #[test]
    fn test_node_quantity_half_way() {
        let (nodes, edges) = line(2);
        let mut graph = FlowGraph::default();
        graph.set_data(&nodes, &edges);

        graph.update_node_data("n1", 100.0, Some(500.0));
        graph.tick(250.0);
        assert_eq!(graph.animation().node("n1").map(|n| n.data_amount), Some(50.0));

        graph.tick(500.0);
        assert_eq!(graph.animation().node("n1").map(|n| n.data_amount), Some(100.0));
    }

    /// Hierarchical layout on a graph where every root choice hits a cycle
    /// lands exactly where a grid layout puts the same nodes.
    #[test]
    fn test_cyclic_hierarchy_equals_grid() {
        let nodes: Vec<Node> = ["a", "b", "c"]
            .iter()
            .map(|id| Node::new(*id, 0.0, 100.0))
            .collect();
        let edges = vec![
            Edge::new("e1", "a", "b"),
            Edge::new("e2", "b", "a"),
            Edge::new("e3", "c", "c"),
        ];
        let config = FlowGraphConfig {
            enable_force_simulation: false,
            ..Default::default()
        };

        let mut grid = FlowGraph::new(config.clone());
        grid.set_data(&nodes, &edges);
        let expected = grid.positions();

        for root in ["a", "b", "c"] {
            let mut tree = FlowGraph::new(config.clone());
            tree.set_data(&nodes, &edges);
            let outcome = tree.set_layout(LayoutKind::Hierarchical {
                root_id: root.into(),
            });
            assert!(outcome.is_some_and(|o| o.is_fallback()), "root {root}");
            assert_eq!(tree.positions(), expected);
        }
    }

    /// Full cycle: force layout settles while a flow runs to completion.
    #[test]
    fn test_force_layout_with_flows_to_completion() {
        let (nodes, edges) = line(5);
        let mut graph = FlowGraph::default();
        graph.set_data(&nodes, &edges);

        let completed = Rc::new(RefCell::new(Vec::new()));
        let sink = completed.clone();
        graph.on(Listener::FlowComplete(Box::new(move |e: &FlowEvent| {
            sink.borrow_mut().push(e.id.clone());
        })));

        graph.add_flow_event(FlowEventInput::new("f1", "e1", 120.0, 400.0));
        graph.add_flow_event(FlowEventInput::new("f2", "e4", 10.0, 800.0));

        let mut ts = 0.0;
        while ts < 1000.0 {
            ts += 16.0;
            graph.tick(ts);
            let frame = graph.frame();
            assert_eq!(frame.nodes.len(), 5);
            assert!(frame.nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
            for p in &frame.particles {
                assert!(p.x.is_finite() && p.y.is_finite());
            }
        }

        assert_eq!(*completed.borrow(), vec!["f1".to_string(), "f2".to_string()]);
        assert!(graph.particles().is_empty());

        // Connected neighbours end up separated, not stacked.
        let a = graph.graph().node("n0").and_then(SimulationNode::point);
        let b = graph.graph().node("n1").and_then(SimulationNode::point);
        let gap = geometry::distance(a.unwrap(), b.unwrap());
        assert!(gap > 20.0, "neighbours too close: {gap}");
    }

    /// Pausing twice is harmless and freezes particles until restarted.
    #[test]
    fn test_pause_is_idempotent() {
        let (nodes, edges) = line(2);
        let mut graph = FlowGraph::default();
        graph.set_data(&nodes, &edges);
        graph.add_flow_event(FlowEventInput::new("f1", "e1", 1.0, 1000.0));
        graph.tick(100.0);

        graph.pause();
        let frozen = graph.particles();
        graph.pause();
        graph.tick(400.0);
        assert_eq!(graph.particles(), frozen);

        graph.start();
        graph.tick(500.0);
        assert_ne!(graph.particles(), frozen);
    }

    #[test]
    fn test_graph_data_from_json() {
        let data: GraphData = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "w1", "name": "Warehouse", "dataAmount": 80, "maxCapacity": 100,
                     "position": {"x": 10, "y": 20}, "type": "warehouse"},
                    {"id": "s1", "dataAmount": 5, "maxCapacity": 50}
                ],
                "edges": [{"id": "e1", "source": "w1", "target": "s1", "flow": 30, "capacity": 50}],
                "flowEvents": [{"id": "f1", "edgeId": "e1", "amount": 30, "duration": 2000}]
            }"#,
        )
        .unwrap();

        let mut graph = FlowGraph::default();
        assert!(graph.load(data).is_empty());
        assert_eq!(graph.flow_events().len(), 1);
        assert_eq!(graph.graph().node("w1").unwrap().node.node_type.as_deref(), Some("warehouse"));
    }
}
