//! Per-node quantity interpolation records, sampled on each tick.

use crate::geometry::ease_in_out_cubic;

/// Default duration of a node quantity transition, in milliseconds.
pub const DEFAULT_TWEEN_DURATION: f64 = 500.0;

/// Eased transition of one value from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub start_time: f64,
    pub duration: f64,
}

impl Tween {
    pub fn new(from: f64, to: f64, start_time: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            start_time,
            duration,
        }
    }

    /// Value at logical time `now`, and whether the tween has finished.
    ///
    /// A finished tween yields exactly `to`.
    pub fn sample(&self, now: f64) -> (f64, bool) {
        let t = if self.duration > 0.0 {
            ((now - self.start_time) / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if t >= 1.0 {
            (self.to, true)
        } else {
            (self.from + (self.to - self.from) * ease_in_out_cubic(t), false)
        }
    }
}
