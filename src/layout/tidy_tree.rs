//! Buchheim-Junger-Leipert tidy tree layout.
//!
//! Implements the O(n) algorithm from "Improving Walker's Algorithm to Run in
//! Linear Time" (Buchheim, Junger, Leipert, 2002). The output is abstract:
//! a breadth coordinate in separation units and an integer depth per node.
//! Mapping onto a canvas is left to the caller.
//!
//! # Algorithm Overview
//!
//! 1. **First walk (post-order):** Assign preliminary breadth to each node by
//!    pushing sibling subtrees apart along their contours. Threads make each
//!    contour step O(1) amortised.
//! 2. **Second walk (pre-order):** Sum modifiers down the tree to get final
//!    breadth values.

/// Abstract position of one tree node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeCoord {
    /// Position across the tree, in separation units.
    pub breadth: f64,
    /// Distance from the root (root = 0).
    pub depth: u32,
}

/// Separation settings for the tidy tree.
#[derive(Debug, Clone, Copy)]
pub struct TidyTree {
    /// Gap between adjacent siblings.
    pub sibling_separation: f64,
    /// Gap between adjacent nodes that are not siblings.
    pub subtree_separation: f64,
}

impl Default for TidyTree {
    fn default() -> Self {
        Self {
            sibling_separation: 1.0,
            subtree_separation: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Cell {
    parent: Option<usize>,
    children: Vec<usize>,
    depth: u32,
    /// 1-based position among siblings.
    number: usize,
    prelim: f64,
    modifier: f64,
    shift: f64,
    change: f64,
    thread: Option<usize>,
    ancestor: usize,
}

impl TidyTree {
    /// Lay out the tree rooted at `root`.
    ///
    /// `children[i]` lists the children of node `i` in display order. Nodes
    /// not reachable from `root` get `None`. A child already visited through
    /// another parent is ignored, so malformed input cannot loop.
    pub fn layout(&self, children: &[Vec<usize>], root: usize) -> Vec<Option<TreeCoord>> {
        let n = children.len();
        let mut coords = vec![None; n];
        if root >= n {
            return coords;
        }

        let mut cells = Self::build_cells(children, root);
        self.first_walk(root, &mut cells);

        let mut stack = vec![(root, 0.0)];
        while let Some((v, modifier_sum)) = stack.pop() {
            let cell = &cells[v];
            coords[v] = Some(TreeCoord {
                breadth: cell.prelim + modifier_sum,
                depth: cell.depth,
            });
            for &w in &cell.children {
                stack.push((w, modifier_sum + cell.modifier));
            }
        }
        coords
    }

    /// Copy the reachable tree into cells, dropping revisits.
    fn build_cells(children: &[Vec<usize>], root: usize) -> Vec<Cell> {
        let mut cells: Vec<Cell> = (0..children.len())
            .map(|i| Cell {
                parent: None,
                children: Vec::new(),
                depth: 0,
                number: 1,
                prelim: 0.0,
                modifier: 0.0,
                shift: 0.0,
                change: 0.0,
                thread: None,
                ancestor: i,
            })
            .collect();

        let mut seen = vec![false; children.len()];
        seen[root] = true;
        let mut stack = vec![root];
        while let Some(v) = stack.pop() {
            let mut kept = Vec::with_capacity(children[v].len());
            for &w in &children[v] {
                if w >= children.len() || seen[w] {
                    continue;
                }
                seen[w] = true;
                kept.push(w);
                cells[w].parent = Some(v);
                cells[w].depth = cells[v].depth + 1;
                cells[w].number = kept.len();
                stack.push(w);
            }
            cells[v].children = kept;
        }
        cells
    }

    fn separation(&self, a: usize, b: usize, cells: &[Cell]) -> f64 {
        if cells[a].parent.is_some() && cells[a].parent == cells[b].parent {
            self.sibling_separation
        } else {
            self.subtree_separation
        }
    }

    fn left_sibling(v: usize, cells: &[Cell]) -> Option<usize> {
        let parent = cells[v].parent?;
        let number = cells[v].number;
        (number > 1).then(|| cells[parent].children[number - 2])
    }

    fn leftmost_sibling(v: usize, cells: &[Cell]) -> usize {
        cells[v]
            .parent
            .and_then(|p| cells[p].children.first().copied())
            .unwrap_or(v)
    }

    fn next_left(v: usize, cells: &[Cell]) -> Option<usize> {
        cells[v].children.first().copied().or(cells[v].thread)
    }

    fn next_right(v: usize, cells: &[Cell]) -> Option<usize> {
        cells[v].children.last().copied().or(cells[v].thread)
    }

    fn first_walk(&self, v: usize, cells: &mut [Cell]) {
        let left = Self::left_sibling(v, cells);

        if cells[v].children.is_empty() {
            cells[v].prelim = match left {
                Some(w) => cells[w].prelim + self.separation(w, v, cells),
                None => 0.0,
            };
            return;
        }

        let children = cells[v].children.clone();
        let mut default_ancestor = children[0];
        for &w in &children {
            self.first_walk(w, cells);
            default_ancestor = self.apportion(w, default_ancestor, cells);
        }
        Self::execute_shifts(v, cells);

        let first = cells[children[0]].prelim;
        let last = cells[children[children.len() - 1]].prelim;
        let midpoint = (first + last) / 2.0;

        match left {
            Some(w) => {
                cells[v].prelim = cells[w].prelim + self.separation(w, v, cells);
                cells[v].modifier = cells[v].prelim - midpoint;
            }
            None => cells[v].prelim = midpoint,
        }
    }

    fn apportion(&self, v: usize, mut default_ancestor: usize, cells: &mut [Cell]) -> usize {
        let Some(w) = Self::left_sibling(v, cells) else {
            return default_ancestor;
        };

        // inner/outer contours on the right (v's subtree) and left (siblings)
        let mut v_ir = v;
        let mut v_or = v;
        let mut v_il = w;
        let mut v_ol = Self::leftmost_sibling(v, cells);

        let mut s_ir = cells[v_ir].modifier;
        let mut s_or = cells[v_or].modifier;
        let mut s_il = cells[v_il].modifier;
        let mut s_ol = cells[v_ol].modifier;

        while let (Some(il), Some(ir)) = (Self::next_right(v_il, cells), Self::next_left(v_ir, cells)) {
            v_il = il;
            v_ir = ir;
            v_ol = Self::next_left(v_ol, cells).unwrap_or(v_ol);
            v_or = Self::next_right(v_or, cells).unwrap_or(v_or);
            cells[v_or].ancestor = v;

            let shift = (cells[v_il].prelim + s_il) - (cells[v_ir].prelim + s_ir)
                + self.separation(v_il, v_ir, cells);
            if shift > 0.0 {
                let wl = Self::ancestor(v_il, v, default_ancestor, cells);
                Self::move_subtree(wl, v, shift, cells);
                s_ir += shift;
                s_or += shift;
            }

            s_il += cells[v_il].modifier;
            s_ir += cells[v_ir].modifier;
            s_ol += cells[v_ol].modifier;
            s_or += cells[v_or].modifier;
        }

        if let Some(next) = Self::next_right(v_il, cells) {
            if Self::next_right(v_or, cells).is_none() {
                cells[v_or].thread = Some(next);
                cells[v_or].modifier += s_il - s_or;
            }
        }
        if let Some(next) = Self::next_left(v_ir, cells) {
            if Self::next_left(v_ol, cells).is_none() {
                cells[v_ol].thread = Some(next);
                cells[v_ol].modifier += s_ir - s_ol;
                default_ancestor = v;
            }
        }
        default_ancestor
    }

    /// The greatest distinct ancestor of `v_il` among `v`'s siblings.
    fn ancestor(v_il: usize, v: usize, default_ancestor: usize, cells: &[Cell]) -> usize {
        let candidate = cells[v_il].ancestor;
        if cells[candidate].parent.is_some() && cells[candidate].parent == cells[v].parent {
            candidate
        } else {
            default_ancestor
        }
    }

    fn move_subtree(wl: usize, wr: usize, shift: f64, cells: &mut [Cell]) {
        let subtrees = cells[wr].number.saturating_sub(cells[wl].number).max(1) as f64;
        cells[wr].change -= shift / subtrees;
        cells[wr].shift += shift;
        cells[wl].change += shift / subtrees;
        cells[wr].prelim += shift;
        cells[wr].modifier += shift;
    }

    fn execute_shifts(v: usize, cells: &mut [Cell]) {
        let mut shift = 0.0;
        let mut change = 0.0;
        for i in (0..cells[v].children.len()).rev() {
            let w = cells[v].children[i];
            cells[w].prelim += shift;
            cells[w].modifier += shift;
            change += cells[w].change;
            shift += cells[w].shift + change;
        }
    }
}
