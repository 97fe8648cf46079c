//! Error types for the sylinder engine.
//!
//! All crates return `SylinderResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the sylinder engine.
#[derive(Debug, Error)]
pub enum SylinderError {
    /// An operation was invoked on state that does not satisfy its
    /// precondition (e.g. a collector with no pools). Fatal for the run.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Particle or boundary geometry is malformed.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A distributed vector does not match the particle index space.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A collective operation could not complete on every rank.
    #[error("Communication error: {0}")]
    Communication(String),

    /// A simulation invariant was violated (e.g. negative contact force).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Convenience alias for `Result<T, SylinderError>`.
pub type SylinderResult<T> = Result<T, SylinderError>;
