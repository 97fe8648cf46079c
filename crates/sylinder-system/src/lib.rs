//! # sylinder-system
//!
//! Time stepping of sylinder suspensions with hard-body collisions.
//!
//! ## Key Types
//!
//! - [`SylinderSystem`] — per-timestep orchestrator, generic over the [`Communicator`]
//! - [`SylinderConfig`] — run configuration, loaded from TOML
//! - [`BlockDiagonalMobility`] — drag-based force → velocity map
//! - [`SingleRank`] / [`ThreadComm`] — serial and in-process multi-rank collectives
//! - [`Scenario`] / [`ScenarioRunner`] — canonical regression scenarios

pub mod brownian;
pub mod comm;
pub mod config;
pub mod domain;
pub mod mobility;
pub mod runner;
pub mod scenarios;
pub mod state;
pub mod system;

pub use brownian::RngPool;
pub use comm::{Communicator, SingleRank, ThreadComm};
pub use config::{BoundaryConfig, MobilityKind, ParticleSeedConfig, SearchKind, SylinderConfig};
pub use domain::SlabDecomposition;
pub use mobility::{BlockDiagonalMobility, MobilityBlock};
pub use runner::{RunMetrics, ScenarioRunner};
pub use scenarios::{Scenario, ScenarioKind};
pub use state::StepVectors;
pub use system::{StepReport, SylinderSystem};
