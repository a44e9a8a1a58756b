//! Iterative force simulation.
//!
//! A velocity-Verlet style integrator with a cooling "alpha" temperature,
//! following the d3-force model:
//!
//! - **link**: springs pull connected nodes toward `link_distance`
//! - **charge**: pairwise inverse-distance repulsion between all nodes
//! - **center**: shifts the whole layout so its centroid drifts to the centre
//! - **collision**: pushes apart nodes whose rendered circles (plus padding)
//!   overlap; neighbour candidates come from an R-tree
//!
//! Each [`ForceSimulation::step`] decays alpha, applies the forces to
//! velocities, then integrates positions. Pinned axes (`fx`/`fy`) are snapped
//! back and get zero velocity.

use crate::config::{ForceOptions, NodeStyle};
use crate::geometry::{Point, node_radius};
use crate::graph::{SimulationGraph, SimulationNode};
use crate::spatial::{NodeCircle, SpatialIndex};

/// Squared distance below which charge stops growing.
const CHARGE_DISTANCE_MIN_2: f64 = 1.0;

/// Collision strength; 1 resolves overlaps fully in one step.
const COLLISION_STRENGTH: f64 = 1.0;

/// A resolved spring between two arena slots.
#[derive(Debug, Clone, Copy)]
struct Link {
    source: usize,
    target: usize,
    strength: f64,
    bias: f64,
}

/// Deterministic linear congruential generator used for jiggle.
#[derive(Debug, Clone)]
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0 as f64 / 4_294_967_296.0
    }

    /// Tiny non-zero offset used to separate coincident nodes.
    fn jiggle(&mut self) -> f64 {
        (self.next() - 0.5) * 1e-6
    }
}

/// State of a running force layout.
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    options: ForceOptions,
    center: Point,
    alpha: f64,
    alpha_target: f64,
    running: bool,
    links: Vec<Link>,
    /// Collision radius per slot: rendered radius plus padding.
    radii: Vec<f64>,
    random: Lcg,
    steps: u64,
}

impl ForceSimulation {
    /// Prepare a simulation for `graph`. Links and radii are captured now.
    pub fn new(graph: &SimulationGraph, options: ForceOptions, style: NodeStyle, center: Point) -> Self {
        let degree: Vec<usize> = (0..graph.node_count())
            .map(|i| graph.degree(i.into()))
            .collect();

        let links = graph
            .links()
            .filter(|(s, t)| s != t)
            .map(|(s, t)| {
                let (ds, dt) = (degree[s.index()] as f64, degree[t.index()] as f64);
                Link {
                    source: s.index(),
                    target: t.index(),
                    strength: 1.0 / ds.min(dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect();

        let radii = graph
            .nodes()
            .iter()
            .map(|n| {
                node_radius(n.node.data_amount, n.node.max_capacity, style.min_radius, style.max_radius)
                    + options.collision_padding
            })
            .collect();

        Self {
            options,
            center,
            alpha: 1.0,
            alpha_target: 0.0,
            running: true,
            links,
            radii,
            random: Lcg(1),
            steps: 0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn options(&self) -> &ForceOptions {
        &self.options
    }

    pub fn center(&self) -> Point {
        self.center
    }

    /// Retarget the center force.
    pub fn set_center(&mut self, center: Point) {
        self.center = center;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Reset alpha to 1 and resume stepping.
    pub fn restart(&mut self) {
        self.alpha = 1.0;
        self.running = true;
    }

    /// Replace the collision radii with freshly rendered ones.
    ///
    /// Ignored unless there is exactly one radius per captured node.
    pub fn set_radii(&mut self, rendered: &[f64]) {
        if rendered.len() != self.radii.len() {
            log::warn!(
                "force simulation built for {} nodes was given {} radii",
                self.radii.len(),
                rendered.len()
            );
            return;
        }
        let padding = self.options.collision_padding;
        for (radius, &r) in self.radii.iter_mut().zip(rendered) {
            *radius = r + padding;
        }
    }

    /// Advance one step. Returns false without touching the nodes when the
    /// simulation is stopped or `nodes` does not match the captured graph.
    pub fn step(&mut self, nodes: &mut [SimulationNode]) -> bool {
        if !self.running {
            return false;
        }
        if nodes.len() != self.radii.len() {
            log::warn!(
                "force simulation built for {} nodes was stepped with {}",
                self.radii.len(),
                nodes.len()
            );
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.options.alpha_decay;

        self.apply_link(nodes);
        self.apply_charge(nodes);
        self.apply_center(nodes);
        self.apply_collision(nodes);
        self.integrate(nodes);

        self.steps += 1;
        if self.alpha < self.options.alpha_min {
            self.running = false;
            log::debug!("force simulation cooled after {} steps", self.steps);
        }
        true
    }

    /// Step until cooled or `max_steps` is reached. Returns steps taken.
    pub fn run(&mut self, nodes: &mut [SimulationNode], max_steps: usize) -> usize {
        let mut taken = 0;
        while taken < max_steps && self.step(nodes) {
            taken += 1;
        }
        taken
    }

    fn apply_link(&mut self, nodes: &mut [SimulationNode]) {
        let distance = self.options.link_distance;
        for i in 0..self.links.len() {
            let link = self.links[i];
            let (s, t) = (&nodes[link.source], &nodes[link.target]);

            let mut x = t.x + t.vx - s.x - s.vx;
            let mut y = t.y + t.vy - s.y - s.vy;
            if x == 0.0 {
                x = self.random.jiggle();
            }
            if y == 0.0 {
                y = self.random.jiggle();
            }
            let l = (x * x + y * y).sqrt();
            let k = (l - distance) / l * self.alpha * link.strength;
            x *= k;
            y *= k;

            let t = &mut nodes[link.target];
            t.vx -= x * link.bias;
            t.vy -= y * link.bias;
            let s = &mut nodes[link.source];
            s.vx += x * (1.0 - link.bias);
            s.vy += y * (1.0 - link.bias);
        }
    }

    fn apply_charge(&mut self, nodes: &mut [SimulationNode]) {
        let strength = self.options.charge_strength * self.alpha;
        let n = nodes.len();
        for i in 0..n {
            let (xi, yi) = (nodes[i].x, nodes[i].y);
            let (mut dvx, mut dvy) = (0.0, 0.0);
            for (j, other) in nodes.iter().enumerate() {
                if i == j {
                    continue;
                }
                let mut x = other.x - xi;
                let mut y = other.y - yi;
                let mut l = x * x + y * y;
                if x == 0.0 {
                    x = self.random.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.random.jiggle();
                    l += y * y;
                }
                if l < CHARGE_DISTANCE_MIN_2 {
                    l = (CHARGE_DISTANCE_MIN_2 * l).sqrt();
                }
                dvx += x * strength / l;
                dvy += y * strength / l;
            }
            nodes[i].vx += dvx;
            nodes[i].vy += dvy;
        }
    }

    fn apply_center(&self, nodes: &mut [SimulationNode]) {
        let n = nodes.len();
        if n == 0 {
            return;
        }
        let (sum_x, sum_y) = nodes
            .iter()
            .fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
        let shift_x = (sum_x / n as f64 - self.center.x) * self.options.center_strength;
        let shift_y = (sum_y / n as f64 - self.center.y) * self.options.center_strength;
        for node in nodes.iter_mut() {
            node.x -= shift_x;
            node.y -= shift_y;
        }
    }

    fn apply_collision(&mut self, nodes: &mut [SimulationNode]) {
        let circles = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| NodeCircle::new(i.into(), n.x + n.vx, n.y + n.vy, self.radii[i]))
            .collect();
        let index = SpatialIndex::build(circles);
        let reach = index.max_radius();

        for i in 0..nodes.len() {
            let ri = self.radii[i];
            let ri2 = ri * ri;
            let xi = nodes[i].x + nodes[i].vx;
            let yi = nodes[i].y + nodes[i].vy;

            let candidates: Vec<usize> = index
                .within(xi, yi, ri + reach)
                .map(|c| c.slot.index())
                .filter(|&j| j > i)
                .collect();

            for j in candidates {
                let rj = self.radii[j];
                let r = ri + rj;
                let mut x = xi - nodes[j].x - nodes[j].vx;
                let mut y = yi - nodes[j].y - nodes[j].vy;
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = self.random.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.random.jiggle();
                    l += y * y;
                }
                let l = l.sqrt();
                let k = (r - l) / l * COLLISION_STRENGTH;
                x *= k;
                y *= k;

                let share = rj * rj / (ri2 + rj * rj);
                nodes[i].vx += x * share;
                nodes[i].vy += y * share;
                nodes[j].vx -= x * (1.0 - share);
                nodes[j].vy -= y * (1.0 - share);
            }
        }
    }

    fn integrate(&self, nodes: &mut [SimulationNode]) {
        let friction = 1.0 - self.options.velocity_decay;
        for node in nodes.iter_mut() {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= friction;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= friction;
                    node.y += node.vy;
                }
            }
        }
    }
}
