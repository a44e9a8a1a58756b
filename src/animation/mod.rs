//! Flow Animation Engine.
//!
//! Flow events, their particles and node quantity transitions, all advanced
//! by a host-driven logical clock.

mod engine;
mod flow;
mod tween;

pub use engine::{FlowAnimationEngine, Listener};
pub use flow::{FlowEvent, FlowEventInput, FlowParticle, FlowStatus};
pub use tween::{DEFAULT_TWEEN_DURATION, Tween};
