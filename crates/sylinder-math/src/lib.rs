//! # sylinder-math
//!
//! Linear algebra primitives for the sylinder collision engine.
//!
//! Provides:
//! - Re-exports of `glam` double-precision types (`DVec3`, `DMat3`, `DQuat`)
//! - Closest points between line segments (sylinder axes)
//! - The [`LinearOperator`] abstraction used for mobility and constraint maps
//! - Sparse (CSR) and dense (`faer`) operator implementations

pub mod dense;
pub mod geometry;
pub mod sparse;

// Re-export glam types as the canonical math types.
pub use glam::{DMat3, DQuat, DVec3};

pub use dense::DenseOperator;
pub use geometry::{segment_segment, SegmentClosest};
pub use sparse::{CsrMatrix, LinearOperator};

/// Dot product of two equal-length slices.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Outer product `a ⊗ b` (entry `(i, j)` is `a_i * b_j`).
#[inline]
pub fn outer(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

