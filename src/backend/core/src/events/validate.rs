//! Semantic validation of hydrated simulation events.
//!
//! Structural checks (recognized kind tag, required fields) are enforced by
//! the typed decode of [`EventKind`]; what remains here are the value-level
//! rules a well-typed payload can still break. A failed check rejects the
//! event before the store or the hub ever see it.

use crate::error::NetsimError;

use super::event::{EventKind, SimulationEvent};

/// Check the kind-specific value rules for an already-hydrated event.
pub fn validate_event(event: &SimulationEvent) -> Result<(), NetsimError> {
    match &event.kind {
        EventKind::PacketTransmitted {
            packet,
            link_id,
            latency_ms,
        } => {
            if packet.id.trim().is_empty() {
                return Err(field_error("packet.id", "must not be empty"));
            }
            if link_id.trim().is_empty() {
                return Err(field_error("link_id", "must not be empty"));
            }
            if !latency_ms.is_finite() || *latency_ms < 0.0 {
                return Err(field_error(
                    "latency_ms",
                    "must be a finite, non-negative number",
                ));
            }
        }
        EventKind::PacketDropped { packet, .. } => {
            if packet.id.trim().is_empty() {
                return Err(field_error("packet.id", "must not be empty"));
            }
        }
        EventKind::InterfaceStateChanged {
            device_id,
            interface_id,
            ..
        } => {
            if device_id.trim().is_empty() {
                return Err(field_error("device_id", "must not be empty"));
            }
            if interface_id.trim().is_empty() {
                return Err(field_error("interface_id", "must not be empty"));
            }
        }
        EventKind::Metrics { metrics } => {
            for (field, value) in [
                ("metrics.average_latency_ms", metrics.average_latency_ms),
                ("metrics.throughput_mbps", metrics.throughput_mbps),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(field_error(field, "must be a finite, non-negative number"));
                }
            }
        }
        // Lifecycle statuses are typed, and ticks are intentionally
        // unconstrained (rewind is a feature).
        EventKind::Started { .. }
        | EventKind::Paused { .. }
        | EventKind::Resumed { .. }
        | EventKind::Stopped { .. }
        | EventKind::Tick { .. }
        | EventKind::TopologyUpdated { .. } => {}
    }

    Ok(())
}

fn field_error(field: &'static str, message: &'static str) -> NetsimError {
    NetsimError::validation(format!("{field} {message}")).with_context("field", field)
}
