//! R-tree based spatial index using the rstar crate.
//!
//! Indexes node circles (centre + radius) for:
//! - Hit testing (which node's circle contains a point)
//! - Neighbour candidates for the collision force

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::graph::NodeSlot;

/// A node circle in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeCircle {
    pub slot: NodeSlot,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl NodeCircle {
    pub fn new(slot: NodeSlot, x: f64, y: f64, radius: f64) -> Self {
        Self { slot, x, y, radius }
    }
}

impl RTreeObject for NodeCircle {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodeCircle {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index over node centres.
pub struct SpatialIndex {
    tree: RTree<NodeCircle>,
    /// Largest radius in the tree, bounds every containment query.
    max_radius: f64,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            max_radius: 0.0,
        }
    }

    /// Bulk-load an index. Circles with non-finite centres are skipped.
    pub fn build(circles: Vec<NodeCircle>) -> Self {
        let circles: Vec<_> = circles
            .into_iter()
            .filter(|c| c.x.is_finite() && c.y.is_finite())
            .collect();
        let max_radius = circles.iter().map(|c| c.radius).fold(0.0, f64::max);
        Self {
            tree: RTree::bulk_load(circles),
            max_radius,
        }
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// The node whose circle contains the point, preferring the closest centre.
    pub fn hit(&self, x: f64, y: f64) -> Option<NodeSlot> {
        let point = [x, y];
        self.tree
            .locate_within_distance(point, self.max_radius * self.max_radius)
            .map(|c| (c, c.distance_2(&point)))
            .filter(|(c, d2)| *d2 <= c.radius * c.radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c.slot)
    }

    /// Every circle whose centre lies within `radius` of the point.
    pub fn within(&self, x: f64, y: f64, radius: f64) -> impl Iterator<Item = &NodeCircle> {
        self.tree.locate_within_distance([x, y], radius * radius)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
