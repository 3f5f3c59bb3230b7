//! Simulation event definitions.
//!
//! Events are immutable facts emitted by the simulation engine. The kind set
//! is closed: adding a variant forces every consumer (reducer, validator,
//! message catalog) through an exhaustive match, which is the point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NetsimError;
use crate::projects::{InterfaceStatus, SimulationMetrics, SimulationStatus, Topology};

// =============================================================================
// Event Envelope
// =============================================================================

/// A fully-hydrated simulation event: globally unique id, owning project,
/// timestamp, and the kind-specific payload flattened alongside them.
///
/// On the wire this reads as one flat object, e.g.
/// `{"id": "...", "project_id": "...", "timestamp": "...",
///   "type": "simulation.tick", "tick": 5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub id: Uuid,

    pub project_id: Uuid,

    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub kind: EventKind,
}

impl SimulationEvent {
    /// Build an event stamped with a fresh id and the current time.
    pub fn new(project_id: Uuid, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            timestamp: Utc::now(),
            kind,
        }
    }

    /// The wire tag of this event's kind.
    pub fn kind_tag(&self) -> &'static str {
        self.kind.tag()
    }
}

// =============================================================================
// Event Kinds
// =============================================================================

/// The closed set of simulation event kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    /// The simulation started (or restarted). Resets the tick clock.
    #[serde(rename = "simulation.started")]
    Started { status: SimulationStatus },

    #[serde(rename = "simulation.paused")]
    Paused { status: SimulationStatus },

    #[serde(rename = "simulation.resumed")]
    Resumed { status: SimulationStatus },

    #[serde(rename = "simulation.stopped")]
    Stopped { status: SimulationStatus },

    /// Clock advance. Ticks are not required to be monotonic: the timeline
    /// scrubber rewinds by submitting earlier tick values.
    #[serde(rename = "simulation.tick")]
    Tick { tick: u64 },

    /// Wholesale metrics replacement from the engine.
    #[serde(rename = "simulation.metrics")]
    Metrics { metrics: SimulationMetrics },

    #[serde(rename = "packet.transmitted")]
    PacketTransmitted {
        packet: PacketInfo,
        link_id: String,
        latency_ms: f64,
    },

    #[serde(rename = "packet.dropped")]
    PacketDropped { packet: PacketInfo, reason: String },

    #[serde(rename = "interface.state-changed")]
    InterfaceStateChanged {
        device_id: String,
        interface_id: String,
        status: InterfaceStatus,
    },

    /// Wholesale topology replacement, e.g. after an editor save.
    #[serde(rename = "topology.updated")]
    TopologyUpdated { topology: Topology },
}

impl EventKind {
    /// Wire tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Started { .. } => "simulation.started",
            Self::Paused { .. } => "simulation.paused",
            Self::Resumed { .. } => "simulation.resumed",
            Self::Stopped { .. } => "simulation.stopped",
            Self::Tick { .. } => "simulation.tick",
            Self::Metrics { .. } => "simulation.metrics",
            Self::PacketTransmitted { .. } => "packet.transmitted",
            Self::PacketDropped { .. } => "packet.dropped",
            Self::InterfaceStateChanged { .. } => "interface.state-changed",
            Self::TopologyUpdated { .. } => "topology.updated",
        }
    }
}

/// The packet referenced by `packet.transmitted` / `packet.dropped`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketInfo {
    pub id: String,
    #[serde(default)]
    pub source_device: String,
    #[serde(default)]
    pub target_device: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub size_bytes: u64,
}

// =============================================================================
// Inbound Payload
// =============================================================================

/// An event as submitted by a client, before hydration.
///
/// `id` and `timestamp` are optional on the way in; the boundary fills them
/// before validation runs. `project_id`, when present, must match the target
/// aggregate; the URL is authoritative.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub project_id: Option<Uuid>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub kind: EventKind,
}

impl EventPayload {
    /// Hydrate into a full [`SimulationEvent`] owned by `project_id`.
    ///
    /// Missing `id`/`timestamp` are generated; a payload claiming a different
    /// owning project is rejected without touching any state.
    pub fn hydrate(self, project_id: Uuid) -> Result<SimulationEvent, NetsimError> {
        if let Some(claimed) = self.project_id {
            if claimed != project_id {
                return Err(NetsimError::validation(
                    "event project_id does not match the target project",
                )
                .with_context("claimed", claimed.to_string())
                .with_context("target", project_id.to_string()));
            }
        }

        Ok(SimulationEvent {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            project_id,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            kind: self.kind,
        })
    }
}
