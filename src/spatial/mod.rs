//! Spatial indexing for hit testing and collision neighbour queries.
//!
//! This module provides an R-tree based spatial index over node circles.

mod rtree;

pub use rtree::{NodeCircle, SpatialIndex};
