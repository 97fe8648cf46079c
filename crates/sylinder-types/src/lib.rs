//! # sylinder-types
//!
//! Shared types, identifiers, error types, and physical constants
//! for the sylinder collision engine.
//!
//! This crate has zero domain logic — it defines the vocabulary
//! that all other sylinder crates share.

pub mod constants;
pub mod error;
pub mod ids;

pub use error::{SylinderError, SylinderResult};
pub use ids::{GlobalId, GlobalIndex, RankId, WorkerId};
