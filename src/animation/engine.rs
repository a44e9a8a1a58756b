//! FlowAnimationEngine - flow event lifecycle and node quantity tweening.
//!
//! The engine runs on a logical clock: the latest timestamp handed to
//! [`FlowAnimationEngine::tick`]. It never schedules itself; the host calls
//! `tick` once per frame and the engine advances by the elapsed delta, so
//! motion speed does not depend on the frame rate.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::flow::{FlowEvent, FlowEventInput, FlowParticle, FlowStatus};
use super::tween::Tween;
use crate::config::{ParticleSpawn, PauseMode};
use crate::graph::{Edge, Node};

/// A handler for one kind of engine notification.
pub enum Listener {
    FlowComplete(Box<dyn FnMut(&FlowEvent)>),
    NodeUpdate(Box<dyn FnMut(&Node)>),
    ParticlesUpdate(Box<dyn FnMut(&[FlowParticle])>),
}

/// At most one handler per kind.
#[derive(Default)]
struct Listeners {
    flow_complete: Option<Box<dyn FnMut(&FlowEvent)>>,
    node_update: Option<Box<dyn FnMut(&Node)>>,
    particles_update: Option<Box<dyn FnMut(&[FlowParticle])>>,
}

/// One live flow event with its particles.
#[derive(Debug, Clone)]
struct FlowEntry {
    /// Insertion order, used to keep snapshots stable.
    seq: u64,
    event: FlowEvent,
    particles: Vec<FlowParticle>,
}

/// Owns flow events, particles and node quantity transitions.
pub struct FlowAnimationEngine {
    particles_per_flow: usize,
    particle_spawn: ParticleSpawn,
    pause_mode: PauseMode,

    flows: HashMap<String, FlowEntry>,
    next_seq: u64,
    nodes: HashMap<String, Node>,
    tweens: BTreeMap<String, Tween>,
    /// Edge ids flow events may reference. `None` accepts any edge.
    known_edges: Option<HashSet<String>>,
    listeners: Listeners,

    running: bool,
    destroyed: bool,
    /// Logical time: the latest host timestamp seen.
    now: f64,
    last_tick: f64,
    paused_at: Option<f64>,
}

impl FlowAnimationEngine {
    pub fn new(particles_per_flow: usize) -> Self {
        Self {
            particles_per_flow: particles_per_flow.max(1),
            particle_spawn: ParticleSpawn::default(),
            pause_mode: PauseMode::default(),
            flows: HashMap::new(),
            next_seq: 0,
            nodes: HashMap::new(),
            tweens: BTreeMap::new(),
            known_edges: None,
            listeners: Listeners::default(),
            running: false,
            destroyed: false,
            now: 0.0,
            last_tick: 0.0,
            paused_at: Some(0.0),
        }
    }

    pub fn with_particle_spawn(mut self, spawn: ParticleSpawn) -> Self {
        self.particle_spawn = spawn;
        self
    }

    pub fn with_pause_mode(mut self, mode: PauseMode) -> Self {
        self.pause_mode = mode;
        self
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Current logical time.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Tracked snapshot of a node.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    /// Whether a quantity transition is in flight for the node.
    pub fn is_tweening(&self, node_id: &str) -> bool {
        self.tweens.contains_key(node_id)
    }

    /// Replace every tracked node snapshot.
    ///
    /// In-flight quantity transitions are dropped along with the old
    /// snapshots.
    pub fn set_nodes(&mut self, nodes: &[Node]) {
        self.nodes = nodes.iter().map(|n| (n.id.clone(), n.clone())).collect();
        self.tweens.clear();
    }

    /// Restrict flow events to these edges.
    pub fn set_edges(&mut self, edges: &[Edge]) {
        self.known_edges = Some(edges.iter().map(|e| e.id.clone()).collect());
    }

    // =========================================================================
    // Flow events
    // =========================================================================

    /// Start animating a flow event at the current logical time.
    ///
    /// Returns false, changing nothing, if the edge is not known. An event
    /// reusing a live id replaces it.
    pub fn add_flow_event(&mut self, input: FlowEventInput) -> bool {
        if self.destroyed {
            log::warn!("flow event {} added to a destroyed engine", input.id);
            return false;
        }
        if let Some(known) = &self.known_edges {
            if !known.contains(&input.edge_id) {
                log::warn!(
                    "flow event {} references unknown edge {}",
                    input.id,
                    input.edge_id
                );
                return false;
            }
        }

        let event = FlowEvent::from_input(input, self.now);
        let staggered = self.particle_spawn == ParticleSpawn::Staggered;
        let particles = FlowParticle::batch(&event, self.particles_per_flow, staggered);

        let seq = match self.flows.get(&event.id) {
            Some(existing) => existing.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.flows.insert(
            event.id.clone(),
            FlowEntry {
                seq,
                event,
                particles,
            },
        );
        true
    }

    /// Drop an event and its particles. Unknown ids are ignored.
    pub fn remove_flow_event(&mut self, id: &str) {
        self.flows.remove(id);
    }

    /// Ease a node's quantity from its current value to `amount`.
    ///
    /// A transition already running for the node is replaced, starting from
    /// wherever it had got to.
    pub fn update_node_data(&mut self, node_id: &str, amount: f64, duration: f64) {
        let Some(node) = self.nodes.get(node_id) else {
            log::debug!("quantity update for unknown node {node_id} ignored");
            return;
        };
        let tween = Tween::new(node.data_amount, amount, self.now, duration);
        self.tweens.insert(node_id.to_string(), tween);
    }

    /// Snapshot of every live particle, in event insertion order.
    pub fn get_particles(&self) -> Vec<FlowParticle> {
        live_particles(&self.flows)
    }

    /// Snapshot of every live flow event, in insertion order.
    pub fn get_flow_events(&self) -> Vec<FlowEvent> {
        ordered(&self.flows)
            .into_iter()
            .map(|entry| entry.event.clone())
            .collect()
    }

    /// Register a handler, replacing the previous one of the same kind.
    pub fn on(&mut self, listener: Listener) {
        match listener {
            Listener::FlowComplete(handler) => self.listeners.flow_complete = Some(handler),
            Listener::NodeUpdate(handler) => self.listeners.node_update = Some(handler),
            Listener::ParticlesUpdate(handler) => self.listeners.particles_update = Some(handler),
        }
    }

    // =========================================================================
    // Clock
    // =========================================================================

    pub fn start(&mut self) {
        if self.destroyed {
            log::warn!("start() called on a destroyed flow animation engine");
            return;
        }
        if self.running {
            return;
        }
        if let Some(paused_at) = self.paused_at.take() {
            if self.pause_mode == PauseMode::Frozen {
                self.shift_start_times(paused_at);
            }
        }
        self.running = true;
        self.last_tick = self.now;
    }

    /// Stop advancing. Safe to call repeatedly.
    pub fn pause(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.paused_at = Some(self.now);
    }

    /// Move every start time forward past the paused span.
    ///
    /// Anything stamped during the pause is moved to resume time.
    fn shift_start_times(&mut self, paused_at: f64) {
        let now = self.now;
        let shift = |start: &mut f64| *start += now - paused_at.max(*start);
        for entry in self.flows.values_mut() {
            shift(&mut entry.event.start_time);
        }
        for tween in self.tweens.values_mut() {
            shift(&mut tween.start_time);
        }
    }

    /// Advance to host time `timestamp`.
    ///
    /// The timestamp is recorded even while paused; nothing else happens
    /// until the engine is started.
    pub fn tick(&mut self, timestamp: f64) {
        if !timestamp.is_finite() {
            return;
        }
        self.now = timestamp;
        if !self.running {
            return;
        }
        let dt = (timestamp - self.last_tick).max(0.0);
        self.last_tick = self.last_tick.max(timestamp);

        let mut completed: Vec<(u64, String)> = Vec::new();
        for entry in self.flows.values_mut() {
            if entry.event.advance(timestamp) {
                completed.push((entry.seq, entry.event.id.clone()));
            }
        }
        completed.sort();

        for entry in self.flows.values_mut() {
            if entry.event.status == FlowStatus::Completed {
                continue;
            }
            let duration = entry.event.duration;
            for particle in &mut entry.particles {
                particle.advance(dt, duration);
            }
        }

        if let Some(handler) = self.listeners.particles_update.as_mut() {
            let snapshot = live_particles(&self.flows);
            handler(&snapshot);
        }

        for (_, id) in completed {
            if let Some(entry) = self.flows.get(&id) {
                log::debug!("flow event {} on edge {} completed", id, entry.event.edge_id);
                if let Some(handler) = self.listeners.flow_complete.as_mut() {
                    handler(&entry.event);
                }
            }
            self.flows.remove(&id);
        }

        self.advance_tweens();

        log::trace!(
            "animation tick at {timestamp}: dt={dt}, {} flows, {} tweens",
            self.flows.len(),
            self.tweens.len()
        );
    }

    fn advance_tweens(&mut self) {
        let now = self.now;
        let mut finished = Vec::new();
        for (id, tween) in &self.tweens {
            let Some(node) = self.nodes.get_mut(id) else {
                finished.push(id.clone());
                continue;
            };
            let (value, done) = tween.sample(now);
            node.data_amount = value;
            if let Some(handler) = self.listeners.node_update.as_mut() {
                handler(node);
            }
            if done {
                finished.push(id.clone());
            }
        }
        for id in finished {
            self.tweens.remove(&id);
        }
    }

    /// Pause and drop all state and handlers. The engine cannot be restarted.
    pub fn destroy(&mut self) {
        self.pause();
        self.flows.clear();
        self.nodes.clear();
        self.tweens.clear();
        self.known_edges = None;
        self.listeners = Listeners::default();
        self.destroyed = true;
    }
}

impl Default for FlowAnimationEngine {
    fn default() -> Self {
        Self::new(3)
    }
}

fn ordered(flows: &HashMap<String, FlowEntry>) -> Vec<&FlowEntry> {
    let mut entries: Vec<_> = flows.values().collect();
    entries.sort_by_key(|entry| entry.seq);
    entries
}

/// Particles of every event that has not completed.
fn live_particles(flows: &HashMap<String, FlowEntry>) -> Vec<FlowParticle> {
    ordered(flows)
        .into_iter()
        .filter(|entry| !entry.event.is_completed())
        .flat_map(|entry| entry.particles.iter().cloned())
        .collect()
}
