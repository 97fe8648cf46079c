//! # sylinder-model
//!
//! The particle entity of the simulation and its local container.
//!
//! ## Key Types
//!
//! - [`Sylinder`] — A rigid spherocylinder (a sphere when its length is zero)
//!   with per-particle velocity and force channels.
//! - [`SylinderContainer`] — The particles owned by one rank.
//! - Procedural generators for scenarios and tests.

pub mod container;
pub mod generators;
pub mod sylinder;

pub use container::SylinderContainer;
pub use sylinder::{DragCoefficients, Sylinder};
