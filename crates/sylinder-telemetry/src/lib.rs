//! # sylinder-telemetry
//!
//! Event bus for simulation telemetry. The orchestrator emits structured
//! events (timing, collision counts, resolver convergence, stress) that are
//! consumed by pluggable sinks.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventSink, TracingSink, VecSink, VecSinkHandle};
