//! Integration tests for sylinder-telemetry.

use sylinder_telemetry::bus::EventBus;
use sylinder_telemetry::events::{EventKind, SimulationEvent};
use sylinder_telemetry::sinks::{EventSink, TracingSink, VecSink};

#[test]
fn emit_and_flush() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    let handle = sink.handle();
    bus.add_sink(Box::new(sink));

    bus.emit(SimulationEvent::new(
        0,
        EventKind::TimestepBegin {
            sim_time: 0.0,
            local_particles: 2,
        },
    ));
    bus.emit(SimulationEvent::new(0, EventKind::TimestepEnd { wall_time: 0.001 }));
    assert!(handle.is_empty());

    bus.flush();
    let events = handle.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].label(), "timestep_begin");
    assert_eq!(events[1].label(), "timestep_end");
}

#[test]
fn disabled_bus_drops_events() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    let handle = sink.handle();
    bus.add_sink(Box::new(sink));
    bus.set_enabled(false);
    bus.emit(SimulationEvent::new(0, EventKind::TimestepEnd { wall_time: 0.0 }));
    bus.flush();
    assert!(handle.is_empty());
}

#[test]
fn every_sink_sees_every_event() {
    let mut bus = EventBus::new();
    let a = VecSink::new();
    let b = VecSink::new();
    let (ha, hb) = (a.handle(), b.handle());
    bus.add_sink(Box::new(a));
    bus.add_sink(Box::new(b));
    bus.add_sink(Box::new(TracingSink::default()));
    assert_eq!(bus.sink_count(), 3);
    assert_eq!(bus.sink_names(), vec!["vec_sink", "vec_sink", "tracing_sink"]);

    for step in 0..3 {
        bus.emit(SimulationEvent::new(step, EventKind::TimestepEnd { wall_time: 0.0 }));
    }
    bus.finalize();
    assert_eq!(ha.len(), 3);
    assert_eq!(hb.len(), 3);
}

#[test]
fn event_serialization() {
    let event = SimulationEvent::new(
        5,
        EventKind::Stress {
            collision: [[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 3.0]],
            volume_fraction: 0.1,
        },
    )
    .on_rank(2);
    let json = serde_json::to_string(&event).unwrap();
    let recovered: SimulationEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, event);
    assert_eq!(recovered.rank, 2);
}

#[test]
fn convergence_event() {
    let event = SimulationEvent::new(
        10,
        EventKind::ResolverConvergence {
            iterations: 15,
            residual: 1e-8,
            converged: false,
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("converged"));

    let mut sink = TracingSink::new(tracing::Level::INFO);
    sink.handle(&event);
    assert_eq!(sink.name(), "tracing_sink");
}

#[test]
fn custom_event_label() {
    let event = SimulationEvent::new(
        1,
        EventKind::Custom {
            label: "snapshot".into(),
            payload: "{}".into(),
        },
    );
    assert_eq!(event.label(), "snapshot");
}

#[test]
fn rank_bound_bus_stamps_events() {
    let mut bus = EventBus::for_rank(3);
    assert_eq!(bus.rank(), Some(3));
    let sink = VecSink::new();
    let handle = sink.handle();
    bus.add_sink(Box::new(sink));

    bus.record(7, EventKind::TimestepEnd { wall_time: 0.0 });
    bus.emit(SimulationEvent::new(8, EventKind::TimestepEnd { wall_time: 0.0 }).on_rank(1));
    assert_eq!(bus.flush(), 2);
    assert_eq!(bus.flush(), 0);
    assert_eq!(bus.delivered(), 2);

    let events = handle.events();
    assert!(events.iter().all(|e| e.rank == 3));
    assert_eq!(events[0].timestep, 7);
}

#[test]
fn unbound_bus_keeps_event_rank() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    let handle = sink.handle();
    bus.add_sink(Box::new(sink));
    bus.emit(SimulationEvent::new(0, EventKind::TimestepEnd { wall_time: 0.0 }).on_rank(4));
    bus.flush();
    assert_eq!(handle.events()[0].rank, 4);
}
