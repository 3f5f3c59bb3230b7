//! Real-time replica synchronization over WebSocket.

pub mod handler;
pub mod hub;
pub mod message;

pub use handler::ws_handler;
pub use hub::{HubStats, ProjectHub};
pub use message::{ClientMessage, ServerMessage};
