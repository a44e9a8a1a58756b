//! One-shot deterministic placements: ring seeding, circle and grid.

use std::f64::consts::TAU;

use crate::graph::SimulationNode;

/// Margin between the circular layout and the canvas edge.
pub const CIRCLE_MARGIN: f64 = 100.0;

/// Give every unplaced node a spot on a ring around the canvas centre.
///
/// Nodes are spaced by their index in the full slice, so the ring is stable
/// regardless of which nodes already had positions. Placed nodes are left
/// untouched. Returns how many nodes were seeded.
pub fn seed_ring(nodes: &mut [SimulationNode], width: f64, height: f64) -> usize {
    let n = nodes.len();
    let radius = width.min(height) / 4.0;
    let (cx, cy) = (width / 2.0, height / 2.0);
    let mut seeded = 0;

    for (i, node) in nodes.iter_mut().enumerate() {
        if node.is_placed() {
            continue;
        }
        let angle = i as f64 / n as f64 * TAU;
        node.x = cx + radius * angle.cos();
        node.y = cy + radius * angle.sin();
        seeded += 1;
    }
    seeded
}

/// Place nodes evenly on a circle and pin each one where it lands.
pub fn circular(nodes: &mut [SimulationNode], width: f64, height: f64) {
    if nodes.is_empty() {
        return;
    }
    let radius = (width.min(height) / 2.0 - CIRCLE_MARGIN).max(0.0);
    let step = TAU / nodes.len() as f64;
    let (cx, cy) = (width / 2.0, height / 2.0);

    for (i, node) in nodes.iter_mut().enumerate() {
        let angle = i as f64 * step;
        node.pin(cx + radius * angle.cos(), cy + radius * angle.sin());
    }
}

/// Row-major grid with `ceil(sqrt(n))` columns, cells spread over the canvas.
pub fn grid(nodes: &mut [SimulationNode], width: f64, height: f64) {
    let n = nodes.len();
    if n == 0 {
        return;
    }
    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);
    let cell_width = width / (cols + 1) as f64;
    let cell_height = height / (rows + 1) as f64;

    for (i, node) in nodes.iter_mut().enumerate() {
        let row = i / cols;
        let col = i % cols;
        node.x = (col + 1) as f64 * cell_width;
        node.y = (row + 1) as f64 * cell_height;
    }
}
