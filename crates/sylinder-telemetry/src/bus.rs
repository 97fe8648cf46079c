//! Per-rank event bus.
//!
//! Events are queued on an `mpsc` channel while a step runs and handed to
//! every sink, in emission order, when the bus is flushed. A bus bound to a
//! rank stamps that rank on everything it queues.

use std::sync::mpsc;

use crate::events::{EventKind, SimulationEvent};
use crate::sinks::EventSink;

/// Queue of simulation events with fan-out to registered sinks.
pub struct EventBus {
    tx: mpsc::Sender<SimulationEvent>,
    rx: mpsc::Receiver<SimulationEvent>,
    sinks: Vec<Box<dyn EventSink>>,
    rank: Option<u32>,
    muted: bool,
    delivered: u64,
}

impl EventBus {
    /// Creates an unbound bus with no sinks. Events keep the rank they were
    /// built with.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            sinks: Vec::new(),
            rank: None,
            muted: false,
            delivered: 0,
        }
    }

    /// Creates a bus that tags every event with `rank`.
    pub fn for_rank(rank: u32) -> Self {
        Self {
            rank: Some(rank),
            ..Self::new()
        }
    }

    pub fn rank(&self) -> Option<u32> {
        self.rank
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// A disabled bus drops events at `emit`.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.muted = !enabled;
    }

    pub fn is_enabled(&self) -> bool {
        !self.muted
    }

    /// Queues an event for the next flush.
    pub fn emit(&self, event: SimulationEvent) {
        if self.muted {
            return;
        }
        let event = match self.rank {
            Some(rank) => event.on_rank(rank),
            None => event,
        };
        // The receiver lives as long as the bus.
        let _ = self.tx.send(event);
    }

    /// Shorthand for `emit(SimulationEvent::new(timestep, kind))`.
    pub fn record(&self, timestep: u64, kind: EventKind) {
        self.emit(SimulationEvent::new(timestep, kind));
    }

    /// Hands every queued event to every sink; returns how many events
    /// were dispatched.
    pub fn flush(&mut self) -> usize {
        let mut dispatched = 0;
        while let Ok(event) = self.rx.try_recv() {
            for sink in self.sinks.iter_mut() {
                sink.handle(&event);
            }
            dispatched += 1;
        }
        self.delivered += dispatched as u64;
        dispatched
    }

    /// Flushes, then lets every sink finalize.
    pub fn finalize(&mut self) {
        self.flush();
        for sink in self.sinks.iter_mut() {
            sink.finalize();
        }
    }

    /// Events dispatched over the lifetime of the bus.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Names of the registered sinks, in registration order.
    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
