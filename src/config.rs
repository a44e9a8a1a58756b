//! Construction-time configuration.
//!
//! Every struct deserialises from a camelCase JS object with all fields
//! optional. Out-of-range values are clamped by [`FlowGraphConfig::sanitized`]
//! rather than rejected.

use serde::Deserialize;

use crate::geometry::{DEFAULT_MAX_RADIUS, DEFAULT_MIN_RADIUS};

/// How a new flow event's particles are seeded along its edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticleSpawn {
    /// Particles start evenly spread over `[0, 1)`.
    #[default]
    Spread,
    /// Particles all start at 0 and are released one after another.
    Staggered,
}

/// Whether paused time counts against a flow event's duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PauseMode {
    /// Wall-clock time keeps accruing while paused; events jump on resume.
    #[default]
    WallClock,
    /// Paused spans are removed from every event and tween on resume.
    Frozen,
}

/// Parameters of the force simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceOptions {
    /// Many-body strength. Negative repels.
    pub charge_strength: f64,
    /// Rest length of link springs.
    pub link_distance: f64,
    /// Strength of the pull toward the canvas centre, in `[0, 1]`.
    pub center_strength: f64,
    /// Extra spacing added to each node's radius by the collision force.
    pub collision_padding: f64,
    /// The simulation stops once alpha falls below this.
    pub alpha_min: f64,
    /// Per-step fraction by which alpha approaches its target.
    pub alpha_decay: f64,
    /// Per-step fraction of velocity lost to friction.
    pub velocity_decay: f64,
}

impl Default for ForceOptions {
    fn default() -> Self {
        let alpha_min = 0.001_f64;
        Self {
            charge_strength: -300.0,
            link_distance: 100.0,
            center_strength: 0.1,
            collision_padding: 10.0,
            alpha_min,
            // Cools from 1 to alpha_min in ~300 steps.
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
        }
    }
}

impl ForceOptions {
    pub(crate) fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.charge_strength.is_finite() {
            self.charge_strength = defaults.charge_strength;
        }
        if !(self.link_distance.is_finite() && self.link_distance >= 0.0) {
            self.link_distance = defaults.link_distance;
        }
        self.center_strength = if self.center_strength.is_finite() {
            self.center_strength.clamp(0.0, 1.0)
        } else {
            defaults.center_strength
        };
        if !(self.collision_padding.is_finite() && self.collision_padding >= 0.0) {
            self.collision_padding = defaults.collision_padding;
        }
        if !(self.alpha_min > 0.0 && self.alpha_min < 1.0) {
            self.alpha_min = defaults.alpha_min;
        }
        if !(self.alpha_decay > 0.0 && self.alpha_decay <= 1.0) {
            self.alpha_decay = defaults.alpha_decay;
        }
        self.velocity_decay = if self.velocity_decay.is_finite() {
            self.velocity_decay.clamp(0.0, 1.0)
        } else {
            defaults.velocity_decay
        };
        self
    }
}

/// Radius bounds used when deriving a node's rendered size.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStyle {
    pub min_radius: f64,
    pub max_radius: f64,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            min_radius: DEFAULT_MIN_RADIUS,
            max_radius: DEFAULT_MAX_RADIUS,
        }
    }
}

/// Top-level configuration for a [`crate::facade::FlowGraph`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowGraphConfig {
    pub width: f64,
    pub height: f64,
    /// Particles allocated per flow event (at least 1).
    pub particles_per_flow: usize,
    pub particle_spawn: ParticleSpawn,
    pub pause_mode: PauseMode,
    /// When false the facade places nodes on a grid instead of simulating.
    pub enable_force_simulation: bool,
    pub force: ForceOptions,
    pub node_style: NodeStyle,
}

impl Default for FlowGraphConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            particles_per_flow: 3,
            particle_spawn: ParticleSpawn::default(),
            pause_mode: PauseMode::default(),
            enable_force_simulation: true,
            force: ForceOptions::default(),
            node_style: NodeStyle::default(),
        }
    }
}

impl FlowGraphConfig {
    /// Clamp every field into its valid range.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.width = clamp_dimension(self.width, defaults.width);
        self.height = clamp_dimension(self.height, defaults.height);
        self.particles_per_flow = self.particles_per_flow.max(1);
        self.force = self.force.sanitized();

        let style = &mut self.node_style;
        if !(style.min_radius.is_finite() && style.min_radius >= 0.0) {
            style.min_radius = DEFAULT_MIN_RADIUS;
        }
        if !(style.max_radius.is_finite() && style.max_radius >= style.min_radius) {
            style.max_radius = style.min_radius.max(DEFAULT_MAX_RADIUS);
        }
        self
    }
}

pub(crate) fn clamp_dimension(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value.max(1.0) } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FlowGraphConfig::default();
        assert_eq!(config.particles_per_flow, 3);
        assert_eq!(config.force.charge_strength, -300.0);
        assert_eq!(config.force.link_distance, 100.0);
        assert_eq!(config.force.center_strength, 0.1);
        assert_eq!(config.pause_mode, PauseMode::WallClock);
        assert!(config.enable_force_simulation);
    }

    #[test]
    fn test_deserialize_partial_camel_case() {
        let config: FlowGraphConfig = serde_json::from_str(
            r#"{"width": 1024, "particlesPerFlow": 5, "pauseMode": "frozen",
                "force": {"chargeStrength": -120}}"#,
        )
        .unwrap();
        assert_eq!(config.width, 1024.0);
        assert_eq!(config.height, 600.0);
        assert_eq!(config.particles_per_flow, 5);
        assert_eq!(config.pause_mode, PauseMode::Frozen);
        assert_eq!(config.force.charge_strength, -120.0);
        assert_eq!(config.force.link_distance, 100.0);
    }

    #[test]
    fn test_sanitized_clamps() {
        let config = FlowGraphConfig {
            width: -5.0,
            height: f64::NAN,
            particles_per_flow: 0,
            force: ForceOptions {
                center_strength: 3.0,
                ..Default::default()
            },
            node_style: NodeStyle {
                min_radius: 30.0,
                max_radius: 10.0,
            },
            ..Default::default()
        }
        .sanitized();

        assert_eq!(config.width, 1.0);
        assert_eq!(config.height, 600.0);
        assert_eq!(config.particles_per_flow, 1);
        assert_eq!(config.force.center_strength, 1.0);
        assert_eq!(config.node_style.max_radius, 60.0);
    }
}
