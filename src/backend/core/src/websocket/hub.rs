//! Fan-out of store mutations to connected subscribers.
//!
//! One broadcast topic feeds every subscriber through its own queue:
//! delivery to one connection never blocks a writer or another connection,
//! and a subscriber that falls behind loses its oldest undelivered messages
//! rather than stalling anyone (at-most-once, best-effort). Per-subscriber
//! ordering follows publish order; nothing is ordered across subscribers.

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::gauge;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::events::SimulationEvent;
use crate::projects::Project;

use super::message::ServerMessage;

/// Statistics about the hub.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HubStats {
    pub total_published: u64,
    pub total_delivered: u64,
    pub active_subscribers: u64,
}

/// Publish/subscribe topic for project notifications.
pub struct ProjectHub {
    sender: broadcast::Sender<ServerMessage>,
    total_published: AtomicU64,
    total_delivered: AtomicU64,
}

impl ProjectHub {
    /// Create a hub whose per-subscriber queues hold up to `capacity`
    /// undelivered messages before the slowest subscriber starts losing them.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            total_published: AtomicU64::new(0),
            total_delivered: AtomicU64::new(0),
        }
    }

    /// Open a new subscription. The caller is responsible for sending the
    /// initial snapshot before draining this receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.sender.subscribe()
    }

    /// Publish a message to every current subscriber.
    pub fn publish(&self, message: ServerMessage) {
        let message_type = message.message_type();
        self.total_published.fetch_add(1, Ordering::Relaxed);
        gauge!("netsim_hub_subscribers").set(self.sender.receiver_count() as f64);

        match self.sender.send(message) {
            Ok(subscriber_count) => {
                self.total_delivered
                    .fetch_add(subscriber_count as u64, Ordering::Relaxed);
                debug!(
                    message_type,
                    subscribers = subscriber_count,
                    "Broadcast sent"
                );
            }
            Err(_) => {
                // No subscribers connected; normal during quiet periods.
                debug!(message_type, "No subscribers for broadcast");
            }
        }
    }

    pub fn project_created(&self, project: Project) {
        self.publish(ServerMessage::ProjectCreated { project });
    }

    pub fn project_updated(&self, project: Project) {
        self.publish(ServerMessage::ProjectUpdated { project });
    }

    pub fn project_deleted(&self, id: Uuid) {
        self.publish(ServerMessage::ProjectDeleted { id });
    }

    pub fn simulation_event(&self, event: SimulationEvent) {
        self.publish(ServerMessage::SimulationEvent { event });
    }

    /// Current hub statistics.
    pub fn stats(&self) -> HubStats {
        HubStats {
            total_published: self.total_published.load(Ordering::Relaxed),
            total_delivered: self.total_delivered.load(Ordering::Relaxed),
            active_subscribers: self.sender.receiver_count() as u64,
        }
    }
}
