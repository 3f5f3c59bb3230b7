//! Simulation events: definitions, boundary validation, and the reducer.

pub mod event;
pub mod reducer;
pub mod validate;

pub use event::{EventKind, EventPayload, PacketInfo, SimulationEvent};
pub use reducer::apply;
pub use validate::validate_event;
