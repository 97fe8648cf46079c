//! Pluggable event sinks.
//!
//! Sinks consume events from the bus and process them (collect in memory,
//! forward to `tracing`, ...).

use std::sync::{Arc, Mutex};

use crate::events::{EventKind, SimulationEvent};

/// Trait for event consumers.
///
/// Implement this to create custom telemetry outputs.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SimulationEvent);

    /// Called when the simulation ends. Flush buffers, close files, etc.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Collects events in memory.
///
/// The sink is moved into the bus; keep a [`VecSinkHandle`] to read what it
/// collected.
#[derive(Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

/// Read side of a [`VecSink`].
#[derive(Clone)]
pub struct VecSinkHandle {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl VecSink {
    /// Creates an empty vec sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that observes this sink's events.
    pub fn handle(&self) -> VecSinkHandle {
        VecSinkHandle {
            events: Arc::clone(&self.events),
        }
    }
}

impl VecSinkHandle {
    /// Copy of every event collected so far.
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of collected events.
    pub fn len(&self) -> usize {
        self.events.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Forwards events to `tracing`.
///
/// Routine events go out at the configured level; a resolver that did not
/// converge is always reported at `WARN`.
pub struct TracingSink {
    level: tracing::Level,
}

impl TracingSink {
    /// Creates a new tracing sink at the given log level.
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(tracing::Level::DEBUG)
    }
}

macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            tracing::Level::ERROR => tracing::error!($($arg)+),
            tracing::Level::WARN => tracing::warn!($($arg)+),
            tracing::Level::INFO => tracing::info!($($arg)+),
            tracing::Level::DEBUG => tracing::debug!($($arg)+),
            _ => tracing::trace!($($arg)+),
        }
    };
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        if let EventKind::ResolverConvergence {
            iterations,
            residual,
            converged: false,
        } = event.kind
        {
            tracing::warn!(
                timestep = event.timestep,
                rank = event.rank,
                iterations,
                residual,
                "resolver_not_converged"
            );
            return;
        }
        event_at!(
            self.level,
            timestep = event.timestep,
            rank = event.rank,
            event = ?event.kind,
            "simulation_event"
        );
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}
