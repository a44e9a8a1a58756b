//! Graph data model and the simulation-ready adapter.
//!
//! Plain [`Node`]/[`Edge`] records come from the host. [`SimulationGraph`]
//! turns them into an arena of [`SimulationNode`]s with edges resolved to
//! arena slots, backed by a petgraph topology for structural queries.

mod edge;
mod node;
mod simulation;
mod validate;

pub use edge::{Edge, EdgeEnd, SimulationEdge};
pub use node::{Node, NodeSlot, Position, SimulationNode};
pub use simulation::{NodePosition, SimulationGraph};
pub use validate::{detect_cycles, validate_graph};
