//! Project aggregates and their substructures.
//!
//! A [`Project`] is the top-level state unit owned by the store: a network
//! topology, a simulation snapshot, playback state for the timeline UI, and
//! a bounded log of the events that produced the current state. Remote
//! replicas rebuild the same value by folding the identical reducer over the
//! same event stream, so everything in here is plain serializable data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::events::SimulationEvent;

pub mod normalize;
pub mod store;

pub use normalize::normalize;
pub use store::ProjectStore;

/// Maximum number of events retained in a project's log. Older entries are
/// dropped oldest-first once the cap is exceeded.
pub const EVENT_LOG_CAPACITY: usize = 500;

// =============================================================================
// Project
// =============================================================================

/// The authoritative state of one simulation project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub topology: Topology,

    #[serde(default)]
    pub simulation: SimulationState,

    #[serde(default)]
    pub playback: PlaybackState,

    /// Applied events, oldest first. Imported data sometimes carries a null
    /// or object-shaped log; anything that is not an array collapses to empty.
    #[serde(default, deserialize_with = "lenient_event_log")]
    pub event_log: Vec<SimulationEvent>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create an empty project: blank topology, idle simulation, empty log.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            tags: Vec::new(),
            topology: Topology::default(),
            simulation: SimulationState::default(),
            playback: PlaybackState::default(),
            event_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Accept only array-shaped logs; any other JSON value becomes an empty log
/// and unreadable entries are skipped rather than failing the whole project.
fn lenient_event_log<'de, D>(deserializer: D) -> Result<Vec<SimulationEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(entries) => Ok(entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// Condensed listing row for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub device_count: usize,
    pub link_count: usize,
    pub status: SimulationStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            description: project.description.clone(),
            device_count: project.topology.devices.len(),
            link_count: project.topology.links.len(),
            status: project.simulation.status,
            updated_at: project.updated_at,
        }
    }
}

// =============================================================================
// Topology
// =============================================================================

/// The device/link graph portion of a project, plus display metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub devices: Vec<Device>,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(default)]
    pub layers: Vec<Layer>,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    #[serde(default)]
    pub views: Vec<View>,
}

/// A node in the topology graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    /// Catalog model identifier (e.g. "router", "switch-24p"). The catalog
    /// itself lives outside this crate.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
}

/// Canvas coordinates for a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A network interface on a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: InterfaceStatus,
}

/// Operational state of an interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceStatus {
    #[default]
    Up,
    Down,
    /// Catch-all for states this build does not model.
    #[serde(other)]
    Unknown,
}

/// An edge between two device interfaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub source_device: String,
    pub source_interface: String,
    pub target_device: String,
    pub target_interface: String,
    /// Cable/medium identifier from the catalog, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// A display layer grouping devices for the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub order: u32,
    pub color: String,
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool {
    true
}

/// Free-floating text on the canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// A saved combination of visible layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub layer_ids: Vec<String>,
}

// =============================================================================
// Simulation State
// =============================================================================

/// Lifecycle status of a project's simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
    Error,
}

/// Snapshot of the simulation clock and counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    #[serde(default)]
    pub status: SimulationStatus,

    #[serde(default)]
    pub current_tick: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,

    /// Id of the most recently applied event, for replica catch-up checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_id: Option<Uuid>,

    #[serde(default)]
    pub metrics: SimulationMetrics,
}

/// Aggregated packet counters for a simulation run.
///
/// `average_latency_ms` is the exact arithmetic mean of every transmitted
/// packet's latency seen so far; the reducer maintains it incrementally.
/// `throughput_mbps` is supplied by the engine, never derived here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    #[serde(default)]
    pub total_packets: u64,

    #[serde(default)]
    pub dropped_packets: u64,

    #[serde(default)]
    pub average_latency_ms: f64,

    #[serde(default)]
    pub throughput_mbps: f64,
}

// =============================================================================
// Playback State
// =============================================================================

/// Timeline playback state for the editor's scrubber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    #[serde(default)]
    pub playing: bool,

    /// Speed multiplier. Non-positive or non-finite inputs reset to 1.
    #[serde(default = "default_speed")]
    pub speed: f64,

    #[serde(default)]
    pub looped: bool,

    #[serde(default)]
    pub cursor_tick: u64,

    #[serde(default)]
    pub bookmarks: Vec<u64>,
}

fn default_speed() -> f64 {
    1.0
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            playing: false,
            speed: 1.0,
            looped: false,
            cursor_tick: 0,
            bookmarks: Vec::new(),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Payload for creating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub topology: Option<Topology>,
}

/// Partial update for a project. Only fields that are present are merged
/// over the stored aggregate; everything else is left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub topology: Option<Topology>,
    #[serde(default)]
    pub simulation: Option<SimulationState>,
    #[serde(default)]
    pub playback: Option<PlaybackState>,
}
