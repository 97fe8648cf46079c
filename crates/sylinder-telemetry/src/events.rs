//! Simulation event types.
//!
//! Structured events emitted by the orchestrator at fixed points of each
//! timestep. Events are lightweight value types that carry just enough
//! data to be useful for monitoring and debugging.

use serde::{Deserialize, Serialize};

/// A simulation event emitted by the engine.
///
/// Events are tagged with the step counter and the emitting rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Step counter at emission (0-indexed).
    pub timestep: u64,
    /// Rank that emitted the event.
    pub rank: u32,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Timestep started.
    TimestepBegin {
        /// Simulation time at the start of the step.
        sim_time: f64,
        /// Particles owned by the emitting rank.
        local_particles: usize,
    },

    /// Timestep completed.
    TimestepEnd {
        /// Wall-clock time for the entire timestep (seconds).
        wall_time: f64,
    },

    /// Collision discovery completed.
    CollisionDiscovery {
        /// Records found on this rank.
        local_records: usize,
        /// Records found on all ranks.
        global_records: usize,
        /// Largest overlap depth among the local records.
        max_overlap: f64,
    },

    /// Collision resolver report for the timestep.
    ResolverConvergence {
        /// Iterations used.
        iterations: u32,
        /// Final complementarity residual.
        residual: f64,
        /// Whether the resolver reached its tolerance.
        converged: bool,
    },

    /// Post-step statistics.
    Stress {
        /// Collision stress, row-major.
        collision: [[f64; 3]; 3],
        /// Particle volume over box volume.
        volume_fraction: f64,
    },

    /// Particles were redistributed across ranks.
    DomainRebalance {
        /// `max / mean - 1` of per-rank particle counts before the rebalance.
        imbalance: f64,
        /// Particles that left the emitting rank.
        sent: usize,
    },

    /// Custom event for extensibility.
    Custom {
        /// Arbitrary label.
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    /// Creates a new event for the given timestep on rank 0.
    pub fn new(timestep: u64, kind: EventKind) -> Self {
        Self {
            timestep,
            rank: 0,
            kind,
        }
    }

    /// Tags the event with the emitting rank.
    pub fn on_rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }

    /// Short name of the payload variant.
    pub fn label(&self) -> &str {
        match &self.kind {
            EventKind::TimestepBegin { .. } => "timestep_begin",
            EventKind::TimestepEnd { .. } => "timestep_end",
            EventKind::CollisionDiscovery { .. } => "collision_discovery",
            EventKind::ResolverConvergence { .. } => "resolver_convergence",
            EventKind::Stress { .. } => "stress",
            EventKind::DomainRebalance { .. } => "domain_rebalance",
            EventKind::Custom { label, .. } => label,
        }
    }
}
