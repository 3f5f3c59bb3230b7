//! Streaming channel message types and serialization.
//!
//! The server ships raw events, not state: subscribers hold a replica of the
//! project map and fold `simulation.event` messages through the same reducer
//! the server runs, so both sides converge without full snapshots crossing
//! the wire after the initial one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::SimulationEvent;
use crate::projects::Project;

// ═══════════════════════════════════════════════════════════════════════════════
// Client Messages (Client -> Server)
// ═══════════════════════════════════════════════════════════════════════════════

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ping to keep the connection alive; answered with `pong`.
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Server Messages (Server -> Client)
// ═══════════════════════════════════════════════════════════════════════════════

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Full project list, sent once when a subscriber connects.
    #[serde(rename = "projects.initial")]
    ProjectsInitial { projects: Vec<Project> },

    #[serde(rename = "project.created")]
    ProjectCreated { project: Project },

    #[serde(rename = "project.updated")]
    ProjectUpdated { project: Project },

    /// Carries only the id; the subscriber drops its replica locally.
    #[serde(rename = "project.deleted")]
    ProjectDeleted { id: Uuid },

    /// A raw applied event for the subscriber to fold into its replica.
    #[serde(rename = "simulation.event")]
    SimulationEvent { event: SimulationEvent },

    #[serde(rename = "pong")]
    Pong { timestamp: i64 },

    /// In-band error for this subscriber only; the connection stays open.
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    /// The wire tag of this message.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::ProjectsInitial { .. } => "projects.initial",
            Self::ProjectCreated { .. } => "project.created",
            Self::ProjectUpdated { .. } => "project.updated",
            Self::ProjectDeleted { .. } => "project.deleted",
            Self::SimulationEvent { .. } => "simulation.event",
            Self::Pong { .. } => "pong",
            Self::Error { .. } => "error",
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
