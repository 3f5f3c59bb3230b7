//! # NetSim Core
//!
//! Event-sourced state synchronization engine for network simulation
//! projects.
//!
//! ## Architecture
//!
//! - **Projects**: the authoritative in-memory store of project aggregates,
//!   with per-key write serialization and normalized snapshot reads
//! - **Events**: a closed, exhaustively-matched set of simulation events,
//!   boundary validation/hydration, and a pure deterministic reducer
//! - **WebSocket**: a broadcast hub that ships raw events to subscribers,
//!   which converge by replaying the same reducer over the same stream
//! - **API**: REST + WebSocket transport over the store and the hub
//! - **Observability**: structured logging and metrics counters

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod observability;
pub mod projects;
pub mod websocket;

pub use error::{ErrorCode, ErrorContext, ErrorSeverity, NetsimError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{build_router, ApiResponse, AppState};
    pub use crate::config::Config;
    pub use crate::error::{ErrorCode, ErrorContext, ErrorSeverity, NetsimError, Result};
    pub use crate::events::{
        apply, validate_event, EventKind, EventPayload, PacketInfo, SimulationEvent,
    };
    pub use crate::projects::{
        normalize, CreateProjectRequest, Project, ProjectStore, ProjectSummary,
        SimulationMetrics, SimulationState, SimulationStatus, Topology,
        UpdateProjectRequest, EVENT_LOG_CAPACITY,
    };
    pub use crate::websocket::{ClientMessage, HubStats, ProjectHub, ServerMessage};
}
