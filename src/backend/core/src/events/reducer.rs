//! The event reducer: folds one simulation event into a project aggregate.
//!
//! `apply` is a pure function of `(project, event)`. It performs no I/O,
//! consults no clocks, and never touches its input: the same event stream
//! folded over the same starting aggregate yields the same value on every
//! replica, which is what lets the server ship events instead of snapshots.

use crate::projects::{Project, EVENT_LOG_CAPACITY};

use super::event::{EventKind, SimulationEvent};

/// Apply `event` to `project`, returning the next aggregate value.
///
/// Every kind, after its own effect, stamps `last_event_id`, appends the
/// event to the log (trimmed oldest-first to [`EVENT_LOG_CAPACITY`]), and
/// sets `updated_at` from the event's timestamp.
pub fn apply(project: &Project, event: &SimulationEvent) -> Project {
    let mut next = project.clone();

    match &event.kind {
        EventKind::Started { status } => {
            next.simulation.status = *status;
            next.simulation.started_at = Some(event.timestamp);
            next.simulation.current_tick = 0;
        }
        EventKind::Paused { status } | EventKind::Resumed { status } => {
            next.simulation.status = *status;
        }
        EventKind::Stopped { status } => {
            next.simulation.status = *status;
            next.simulation.stopped_at = Some(event.timestamp);
        }
        EventKind::Tick { tick } => {
            // Deliberately no monotonicity check: rewind/scrub submits
            // earlier ticks.
            next.simulation.current_tick = *tick;
        }
        EventKind::Metrics { metrics } => {
            next.simulation.metrics = metrics.clone();
        }
        EventKind::PacketTransmitted { latency_ms, .. } => {
            let metrics = &mut next.simulation.metrics;
            let previous_total = metrics.total_packets;
            metrics.total_packets += 1;
            metrics.average_latency_ms = if previous_total == 0 {
                *latency_ms
            } else {
                (metrics.average_latency_ms * previous_total as f64 + latency_ms)
                    / metrics.total_packets as f64
            };
        }
        EventKind::PacketDropped { .. } => {
            next.simulation.metrics.dropped_packets += 1;
        }
        EventKind::InterfaceStateChanged {
            device_id,
            interface_id,
            status,
        } => {
            // Unknown device or interface leaves the topology untouched;
            // editors delete hardware while the engine is still emitting.
            if let Some(device) = next
                .topology
                .devices
                .iter_mut()
                .find(|device| device.id == *device_id)
            {
                if let Some(interface) = device
                    .interfaces
                    .iter_mut()
                    .find(|interface| interface.id == *interface_id)
                {
                    interface.status = *status;
                }
            }
        }
        EventKind::TopologyUpdated { topology } => {
            next.topology = topology.clone();
        }
    }

    next.simulation.last_event_id = Some(event.id);
    next.event_log.push(event.clone());
    if next.event_log.len() > EVENT_LOG_CAPACITY {
        let excess = next.event_log.len() - EVENT_LOG_CAPACITY;
        next.event_log.drain(..excess);
    }
    next.updated_at = event.timestamp;

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event::PacketInfo;
    use crate::projects::{
        Device, Interface, InterfaceStatus, SimulationMetrics, SimulationStatus, Topology,
    };

    fn project() -> Project {
        Project::new("reducer-test")
    }

    fn event(project: &Project, kind: EventKind) -> SimulationEvent {
        SimulationEvent::new(project.id, kind)
    }

    fn transmitted(project: &Project, latency_ms: f64) -> SimulationEvent {
        event(
            project,
            EventKind::PacketTransmitted {
                packet: PacketInfo {
                    id: "pkt".into(),
                    ..PacketInfo::default()
                },
                link_id: "l1".into(),
                latency_ms,
            },
        )
    }

    #[test]
    fn test_packet_flow_updates_running_mean() {
        let base = project();

        let first = apply(&base, &transmitted(&base, 10.0));
        assert_eq!(first.simulation.metrics.total_packets, 1);
        assert_eq!(first.simulation.metrics.average_latency_ms, 10.0);

        let second = apply(&first, &transmitted(&first, 30.0));
        assert_eq!(second.simulation.metrics.total_packets, 2);
        assert_eq!(second.simulation.metrics.average_latency_ms, 20.0);

        let third = apply(
            &second,
            &event(
                &second,
                EventKind::PacketDropped {
                    packet: PacketInfo::default(),
                    reason: "ttl expired".into(),
                },
            ),
        );
        assert_eq!(third.simulation.metrics.dropped_packets, 1);
        assert_eq!(third.simulation.metrics.total_packets, 2);
    }

    #[test]
    fn test_lifecycle_and_tick() {
        let base = project();

        let started = apply(
            &base,
            &event(
                &base,
                EventKind::Started {
                    status: SimulationStatus::Running,
                },
            ),
        );
        assert_eq!(started.simulation.status, SimulationStatus::Running);
        assert_eq!(started.simulation.current_tick, 0);
        assert!(started.simulation.started_at.is_some());

        let ticked = apply(&started, &event(&started, EventKind::Tick { tick: 5 }));
        assert_eq!(ticked.simulation.current_tick, 5);
        assert_eq!(ticked.simulation.status, SimulationStatus::Running);

        let stopped = apply(
            &ticked,
            &event(
                &ticked,
                EventKind::Stopped {
                    status: SimulationStatus::Stopped,
                },
            ),
        );
        assert_eq!(stopped.simulation.status, SimulationStatus::Stopped);
        assert_eq!(stopped.simulation.current_tick, 5);
        assert!(stopped.simulation.stopped_at.is_some());
    }

    #[test]
    fn test_tick_accepts_rewind() {
        let base = project();
        let forward = apply(&base, &event(&base, EventKind::Tick { tick: 100 }));
        let rewound = apply(&forward, &event(&forward, EventKind::Tick { tick: 3 }));
        assert_eq!(rewound.simulation.current_tick, 3);
    }

    #[test]
    fn test_metrics_replaced_wholesale() {
        let base = project();
        let replacement = SimulationMetrics {
            total_packets: 9,
            dropped_packets: 2,
            average_latency_ms: 4.5,
            throughput_mbps: 120.0,
        };
        let next = apply(
            &base,
            &event(
                &base,
                EventKind::Metrics {
                    metrics: replacement.clone(),
                },
            ),
        );
        assert_eq!(next.simulation.metrics, replacement);
    }

    #[test]
    fn test_interface_state_change_hits_target() {
        let mut base = project();
        base.topology.devices.push(Device {
            id: "d1".into(),
            name: "r1".into(),
            kind: "router".into(),
            interfaces: vec![Interface {
                id: "eth0".into(),
                name: "eth0".into(),
                status: InterfaceStatus::Up,
            }],
            ..Device::default()
        });

        let next = apply(
            &base,
            &event(
                &base,
                EventKind::InterfaceStateChanged {
                    device_id: "d1".into(),
                    interface_id: "eth0".into(),
                    status: InterfaceStatus::Down,
                },
            ),
        );
        assert_eq!(
            next.topology.devices[0].interfaces[0].status,
            InterfaceStatus::Down
        );
    }

    #[test]
    fn test_interface_state_change_unknown_target_is_noop() {
        let mut base = project();
        base.topology.devices.push(Device {
            id: "d1".into(),
            name: "r1".into(),
            interfaces: vec![Interface {
                id: "eth0".into(),
                name: "eth0".into(),
                status: InterfaceStatus::Up,
            }],
            ..Device::default()
        });

        for (device_id, interface_id) in [("ghost", "eth0"), ("d1", "ghost")] {
            let next = apply(
                &base,
                &event(
                    &base,
                    EventKind::InterfaceStateChanged {
                        device_id: device_id.into(),
                        interface_id: interface_id.into(),
                        status: InterfaceStatus::Down,
                    },
                ),
            );
            assert_eq!(next.topology, base.topology);
        }
    }

    #[test]
    fn test_topology_replaced_wholesale() {
        let base = project();
        let mut replacement = Topology::default();
        replacement.devices.push(Device {
            id: "new".into(),
            name: "new".into(),
            ..Device::default()
        });

        let next = apply(
            &base,
            &event(
                &base,
                EventKind::TopologyUpdated {
                    topology: replacement.clone(),
                },
            ),
        );
        assert_eq!(next.topology, replacement);
    }

    #[test]
    fn test_every_kind_stamps_envelope_fields() {
        let base = project();
        let kinds = vec![
            EventKind::Started {
                status: SimulationStatus::Running,
            },
            EventKind::Paused {
                status: SimulationStatus::Paused,
            },
            EventKind::Resumed {
                status: SimulationStatus::Running,
            },
            EventKind::Stopped {
                status: SimulationStatus::Stopped,
            },
            EventKind::Tick { tick: 7 },
            EventKind::Metrics {
                metrics: SimulationMetrics::default(),
            },
            EventKind::PacketTransmitted {
                packet: PacketInfo::default(),
                link_id: "l1".into(),
                latency_ms: 1.0,
            },
            EventKind::PacketDropped {
                packet: PacketInfo::default(),
                reason: "congestion".into(),
            },
            EventKind::InterfaceStateChanged {
                device_id: "nope".into(),
                interface_id: "nope".into(),
                status: InterfaceStatus::Down,
            },
            EventKind::TopologyUpdated {
                topology: Topology::default(),
            },
        ];

        let mut current = base;
        for kind in kinds {
            let e = SimulationEvent::new(current.id, kind);
            current = apply(&current, &e);
            assert_eq!(current.simulation.last_event_id, Some(e.id));
            assert_eq!(current.updated_at, e.timestamp);
            assert_eq!(current.event_log.last().map(|logged| logged.id), Some(e.id));
        }
        assert_eq!(current.event_log.len(), 10);
    }

    #[test]
    fn test_event_log_trimmed_oldest_first() {
        let mut current = project();
        let mut ids = Vec::new();
        for tick in 0..(EVENT_LOG_CAPACITY as u64 + 50) {
            let e = SimulationEvent::new(current.id, EventKind::Tick { tick });
            ids.push(e.id);
            current = apply(&current, &e);
            assert!(current.event_log.len() <= EVENT_LOG_CAPACITY);
        }

        assert_eq!(current.event_log.len(), EVENT_LOG_CAPACITY);
        // The 50 oldest entries are gone, the newest survives.
        assert_eq!(current.event_log[0].id, ids[50]);
        assert_eq!(current.event_log.last().unwrap().id, *ids.last().unwrap());
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let base = project();
        let snapshot = base.clone();
        let _ = apply(&base, &transmitted(&base, 12.0));
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_mean_is_exact_for_first_packet() {
        let base = project();
        let next = apply(&base, &transmitted(&base, 0.1));
        // First packet assigns the latency directly, no arithmetic involved.
        assert_eq!(next.simulation.metrics.average_latency_ms, 0.1);
    }

    #[test]
    fn test_dropped_unaffected_by_other_kinds() {
        let base = project();
        let mut current = apply(
            &base,
            &event(
                &base,
                EventKind::PacketDropped {
                    packet: PacketInfo::default(),
                    reason: "full queue".into(),
                },
            ),
        );
        for kind in [
            EventKind::Tick { tick: 9 },
            EventKind::Started {
                status: SimulationStatus::Running,
            },
            EventKind::PacketTransmitted {
                packet: PacketInfo::default(),
                link_id: "l1".into(),
                latency_ms: 2.0,
            },
        ] {
            let e = SimulationEvent::new(current.id, kind);
            current = apply(&current, &e);
        }
        assert_eq!(current.simulation.metrics.dropped_packets, 1);
    }

    #[test]
    fn test_replay_from_log_converges() {
        let base = project();
        let mut current = base.clone();
        for tick in 0..20 {
            let e = if tick % 3 == 0 {
                transmitted(&current, tick as f64)
            } else {
                event(&current, EventKind::Tick { tick })
            };
            current = apply(&current, &e);
        }

        // Refold the final log over the pristine starting aggregate.
        let replayed = current
            .event_log
            .iter()
            .fold(base, |state, e| apply(&state, e));

        assert_eq!(replayed, current);
    }
}
