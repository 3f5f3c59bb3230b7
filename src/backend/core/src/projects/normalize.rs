//! Normalization of possibly-partial project aggregates.
//!
//! Imported or client-supplied projects arrive with holes: no layers, a
//! zeroed playback speed, an over-long event log. `normalize` fills every
//! gap with a well-defined default so the rest of the crate can assume a
//! fully-populated aggregate. It runs on every read and every write path,
//! so it must be cheap and idempotent: `normalize(normalize(p)) ==
//! normalize(p)` for any input.

use super::{Layer, Project, EVENT_LOG_CAPACITY};

/// The four seed layers used whenever a topology arrives with none.
/// Ids, ordering and colors are fixed so that independently-normalized
/// replicas agree on them.
const SEED_LAYERS: [(&str, &str); 4] = [
    ("physical", "#2563eb"),
    ("logical", "#16a34a"),
    ("security", "#dc2626"),
    ("wireless", "#9333ea"),
];

/// Return a fully-defaulted copy of `project`.
pub fn normalize(mut project: Project) -> Project {
    if project.topology.layers.is_empty() {
        project.topology.layers = seed_layers();
    }

    if !project.playback.speed.is_finite() || project.playback.speed <= 0.0 {
        project.playback.speed = 1.0;
    }

    if project.event_log.len() > EVENT_LOG_CAPACITY {
        let excess = project.event_log.len() - EVENT_LOG_CAPACITY;
        project.event_log.drain(..excess);
    }

    project
}

fn seed_layers() -> Vec<Layer> {
    SEED_LAYERS
        .iter()
        .enumerate()
        .map(|(order, (name, color))| Layer {
            id: format!("layer-{name}"),
            name: (*name).to_string(),
            order: order as u32,
            color: (*color).to_string(),
            visible: true,
        })
        .collect()
}
