//! Flow events and the particles that visualise them.

use serde::{Deserialize, Serialize};

use crate::geometry::flow_color;

/// Lifecycle of a flow event. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowStatus {
    Pending,
    Active,
    Completed,
}

/// What a caller supplies to start a flow animation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEventInput {
    pub id: String,
    pub edge_id: String,
    pub amount: f64,
    /// Milliseconds. Zero or negative completes on the next tick.
    pub duration: f64,
}

impl FlowEventInput {
    pub fn new(id: impl Into<String>, edge_id: impl Into<String>, amount: f64, duration: f64) -> Self {
        Self {
            id: id.into(),
            edge_id: edge_id.into(),
            amount,
            duration,
        }
    }
}

/// A transfer of `amount` along one edge, owned by the animation engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEvent {
    pub id: String,
    pub edge_id: String,
    pub amount: f64,
    /// Logical time the event was added at.
    pub start_time: f64,
    pub duration: f64,
    pub status: FlowStatus,
    /// Fraction of the duration elapsed, in `[0, 1]`.
    pub progress: f64,
}

impl FlowEvent {
    pub(crate) fn from_input(input: FlowEventInput, now: f64) -> Self {
        Self {
            id: input.id,
            edge_id: input.edge_id,
            amount: input.amount,
            start_time: now,
            duration: input.duration,
            status: FlowStatus::Pending,
            progress: 0.0,
        }
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == FlowStatus::Completed
    }

    /// Recompute progress at logical time `now`.
    ///
    /// Progress never decreases. Returns true on the call that completes the
    /// event.
    pub(crate) fn advance(&mut self, now: f64) -> bool {
        if self.is_completed() {
            return false;
        }
        let elapsed = if self.duration > 0.0 {
            ((now - self.start_time) / self.duration).min(1.0)
        } else {
            1.0
        };
        self.progress = self.progress.max(elapsed);

        if self.status == FlowStatus::Pending && self.progress > 0.0 {
            self.status = FlowStatus::Active;
        }
        if self.progress >= 1.0 {
            self.progress = 1.0;
            self.status = FlowStatus::Completed;
            return true;
        }
        false
    }
}

/// A marker travelling along an edge while its flow event is live.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowParticle {
    pub id: String,
    pub edge_id: String,
    /// Position along the edge, in `[0, 1)`.
    pub progress: f64,
    pub size: f64,
    pub color: String,

    /// Milliseconds still to wait before moving (staggered spawn only).
    #[serde(skip)]
    delay: f64,
}

impl FlowParticle {
    /// The `count` particles of a freshly added event.
    ///
    /// With `staggered` every particle starts at 0 and particle `i` waits
    /// `i / count` of the event duration before it starts moving; otherwise
    /// particles are spread evenly over `[0, 1)` and move at once.
    pub(crate) fn batch(event: &FlowEvent, count: usize, staggered: bool) -> Vec<Self> {
        let color = flow_color(event.amount);
        let n = count.max(1) as f64;
        let wait = if event.duration > 0.0 { event.duration } else { 0.0 };

        (0..count)
            .map(|i| {
                let share = i as f64 / n;
                Self {
                    id: format!("{}-particle-{}", event.id, i),
                    edge_id: event.edge_id.clone(),
                    progress: if staggered { 0.0 } else { share },
                    size: 4.0 + 2.0 * share,
                    color: color.to_string(),
                    delay: if staggered { share * wait } else { 0.0 },
                }
            })
            .collect()
    }

    /// Move `dt` milliseconds along an edge crossed in `duration`, wrapping at 1.
    pub(crate) fn advance(&mut self, dt: f64, duration: f64) {
        if !(duration > 0.0) {
            return;
        }
        let mut dt = dt;
        if self.delay > 0.0 {
            let waited = dt.min(self.delay);
            self.delay -= waited;
            dt -= waited;
        }
        self.progress = (self.progress + dt / duration).rem_euclid(1.0);
    }
}
