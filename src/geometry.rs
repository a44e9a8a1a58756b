//! Pure geometry and colour helpers shared by the engines and the facade.
//!
//! Nothing in here holds state. Quantities are never clamped in stored data;
//! the clamping to `[0, 1]` happens only when a visual is derived from them.

/// Hot tier for flows carrying more than 100 units.
pub const FLOW_HOT: &str = "#ff4444";
/// Warm tier for flows carrying more than 50 units.
pub const FLOW_WARM: &str = "#ff9944";
/// Cool tier for everything else.
pub const FLOW_COOL: &str = "#44aaff";

/// Edge colour when no capacity is known or the edge is lightly loaded.
pub const EDGE_IDLE: &str = "#999999";

/// Node colour for a fill ratio at or below 0.4.
pub const NODE_LOW: &str = "#44ff88";

/// Default smallest rendered node radius.
pub const DEFAULT_MIN_RADIUS: f64 = 20.0;
/// Default largest rendered node radius.
pub const DEFAULT_MAX_RADIUS: f64 = 60.0;

/// A 2D point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fill ratio of a node, clamped to `[0, 1]`.
///
/// A non-positive or non-finite capacity yields 0 so the node renders at its
/// minimum size instead of producing NaN.
#[inline]
pub fn fill_ratio(data_amount: f64, max_capacity: f64) -> f64 {
    if !(max_capacity > 0.0) || !data_amount.is_finite() {
        return 0.0;
    }
    (data_amount / max_capacity).clamp(0.0, 1.0)
}

/// Rendered radius of a node, linear in its fill ratio.
pub fn node_radius(data_amount: f64, max_capacity: f64, min_radius: f64, max_radius: f64) -> f64 {
    min_radius + (max_radius - min_radius) * fill_ratio(data_amount, max_capacity)
}

/// Node colour by capacity utilisation.
pub fn node_color(data_amount: f64, max_capacity: f64) -> &'static str {
    let ratio = fill_ratio(data_amount, max_capacity);
    if ratio > 0.9 {
        FLOW_HOT
    } else if ratio > 0.7 {
        FLOW_WARM
    } else if ratio > 0.4 {
        FLOW_COOL
    } else {
        NODE_LOW
    }
}

/// Edge colour by flow relative to capacity. Edges without a capacity stay idle.
pub fn edge_color(flow: f64, capacity: Option<f64>) -> &'static str {
    let Some(capacity) = capacity.filter(|c| *c > 0.0) else {
        return EDGE_IDLE;
    };
    let ratio = flow / capacity;
    if ratio > 0.8 {
        FLOW_HOT
    } else if ratio > 0.5 {
        FLOW_WARM
    } else {
        EDGE_IDLE
    }
}

/// Three-tier particle palette keyed on the transferred amount.
pub fn flow_color(amount: f64) -> &'static str {
    if amount > 100.0 {
        FLOW_HOT
    } else if amount > 50.0 {
        FLOW_WARM
    } else {
        FLOW_COOL
    }
}

/// Point at `progress` along the segment `from -> to`.
///
/// `progress` is not clamped: callers pass values in `[0, 1]`.
#[inline]
pub fn point_on_segment(from: Point, to: Point, progress: f64) -> Point {
    Point {
        x: from.x + (to.x - from.x) * progress,
        y: from.y + (to.y - from.y) * progress,
    }
}

#[inline]
pub fn edge_midpoint(from: Point, to: Point) -> Point {
    point_on_segment(from, to, 0.5)
}

#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Ease-in-out cubic: `4t^3` below one half, `1 - (-2t + 2)^3 / 2` above.
///
/// Input is clamped to `[0, 1]`; the curve hits exactly 0 and 1 at the ends.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_radius_bounds() {
        assert_eq!(node_radius(0.0, 100.0, 20.0, 60.0), 20.0);
        assert_eq!(node_radius(50.0, 100.0, 20.0, 60.0), 40.0);
        assert_eq!(node_radius(100.0, 100.0, 20.0, 60.0), 60.0);
    }

    #[test]
    fn test_node_radius_clamps_overflow_and_bad_capacity() {
        // Exceeding capacity only clamps the visual.
        assert_eq!(node_radius(250.0, 100.0, 20.0, 60.0), 60.0);
        assert_eq!(node_radius(10.0, 0.0, 20.0, 60.0), 20.0);
        assert_eq!(node_radius(10.0, -5.0, 20.0, 60.0), 20.0);
    }

    #[test]
    fn test_node_color_tiers() {
        assert_eq!(node_color(95.0, 100.0), FLOW_HOT);
        assert_eq!(node_color(80.0, 100.0), FLOW_WARM);
        assert_eq!(node_color(50.0, 100.0), FLOW_COOL);
        assert_eq!(node_color(10.0, 100.0), NODE_LOW);
    }

    #[test]
    fn test_edge_color() {
        assert_eq!(edge_color(90.0, None), EDGE_IDLE);
        assert_eq!(edge_color(90.0, Some(100.0)), FLOW_HOT);
        assert_eq!(edge_color(60.0, Some(100.0)), FLOW_WARM);
        assert_eq!(edge_color(10.0, Some(100.0)), EDGE_IDLE);
        assert_eq!(edge_color(10.0, Some(0.0)), EDGE_IDLE);
    }

    #[test]
    fn test_flow_color_tiers() {
        assert_eq!(flow_color(101.0), FLOW_HOT);
        assert_eq!(flow_color(100.0), FLOW_WARM);
        assert_eq!(flow_color(60.0), FLOW_WARM);
        assert_eq!(flow_color(50.0), FLOW_COOL);
    }

    #[test]
    fn test_point_on_segment_and_midpoint() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 20.0);
        assert_eq!(point_on_segment(a, b, 0.0), a);
        assert_eq!(point_on_segment(a, b, 1.0), b);
        assert_eq!(edge_midpoint(a, b), Point::new(5.0, 10.0));
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_ease_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-12);
        assert!((ease_in_out_cubic(0.25) - 0.0625).abs() < 1e-12);
        assert_eq!(ease_in_out_cubic(2.0), 1.0);
    }
}
