//! Hierarchical (left-to-right tree) layout over a simulation graph.
//!
//! Each node's parent is the source of the first edge that targets it. The
//! requested root must have no parent, and the resulting forest must be a
//! single tree rooted at it;
//! anything else is a [`LayoutError`] which the layout engine turns into a
//! grid fallback.

use crate::error::LayoutError;
use crate::graph::{NodeSlot, SimulationGraph};

use super::tidy_tree::TidyTree;

/// Distance kept between the tree and the canvas edge.
pub const TREE_MARGIN: f64 = 50.0;

/// Child lists indexed by slot, derived from first-match parentage.
pub(crate) fn infer_children(
    graph: &SimulationGraph,
    root: NodeSlot,
) -> Result<Vec<Vec<usize>>, LayoutError> {
    let n = graph.node_count();
    let root_id = graph.nodes()[root.index()].id().to_string();
    let mut children = vec![Vec::new(); n];

    // A parented root means every node has a parent, so the parentage loops.
    if graph.first_parent(root).is_some() {
        return Err(LayoutError::CyclicParentage(root_id));
    }

    for (i, node) in graph.nodes().iter().enumerate() {
        if i == root.index() {
            continue;
        }
        match graph.first_parent(NodeSlot::new(i)) {
            Some(parent) if parent.index() == i => {
                return Err(LayoutError::CyclicParentage(node.id().to_string()));
            }
            Some(parent) => children[parent.index()].push(i),
            None => return Err(LayoutError::Unreachable(node.id().to_string(), root_id)),
        }
    }

    // Every node has a parent; any node the root cannot reach sits on a loop.
    let mut seen = vec![false; n];
    seen[root.index()] = true;
    let mut stack = vec![root.index()];
    while let Some(v) = stack.pop() {
        for &w in &children[v] {
            if !seen[w] {
                seen[w] = true;
                stack.push(w);
            }
        }
    }
    if let Some(stranded) = seen.iter().position(|s| !s) {
        let id = graph.nodes()[stranded].id().to_string();
        return Err(LayoutError::CyclicParentage(id));
    }

    Ok(children)
}

/// Lay out the graph as a tree reading left to right inside the canvas.
///
/// Depth runs along x, breadth along y. Positions are written only on
/// success; on error the graph is untouched.
pub fn layout(
    graph: &mut SimulationGraph,
    root_id: &str,
    width: f64,
    height: f64,
) -> Result<(), LayoutError> {
    let root = graph
        .slot_of(root_id)
        .ok_or_else(|| LayoutError::UnknownRoot(root_id.to_string()))?;
    let children = infer_children(graph, root)?;
    let coords = TidyTree::default().layout(&children, root.index());

    let placed: Vec<_> = coords.iter().flatten().collect();
    let max_depth = placed.iter().map(|c| c.depth).max().unwrap_or(0);
    let min_breadth = placed.iter().map(|c| c.breadth).fold(f64::INFINITY, f64::min);
    let max_breadth = placed
        .iter()
        .map(|c| c.breadth)
        .fold(f64::NEG_INFINITY, f64::max);
    let breadth_range = max_breadth - min_breadth;

    let span_x = (width - 2.0 * TREE_MARGIN).max(0.0);
    let span_y = (height - 2.0 * TREE_MARGIN).max(0.0);

    for (node, coord) in graph.nodes_mut().iter_mut().zip(&coords) {
        let Some(coord) = coord else { continue };
        node.x = if max_depth == 0 {
            width / 2.0
        } else {
            TREE_MARGIN + coord.depth as f64 / max_depth as f64 * span_x
        };
        node.y = if breadth_range > 0.0 {
            TREE_MARGIN + (coord.breadth - min_breadth) / breadth_range * span_y
        } else {
            height / 2.0
        };
    }

    log::debug!(
        "hierarchical layout placed {} nodes over {} levels",
        placed.len(),
        max_depth + 1
    );
    Ok(())
}
