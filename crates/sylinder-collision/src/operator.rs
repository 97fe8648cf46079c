//! Constraint-coupling operator `D` and the complementarity matrix
//! `A = dt · Dᵀ M D`.
//!
//! `D` maps the contact force magnitudes `γ` (one per record) to generalized
//! forces (6 DOF per particle). It is stored transposed, one CSR row per
//! record with at most twelve non-zeros, so both `Dᵀ v` and `D γ` are cheap.

use sylinder_math::{CsrMatrix, LinearOperator};
use sylinder_types::constants::DOF_PER_PARTICLE;
use sylinder_types::{SylinderError, SylinderResult};

use crate::constraint::ConstraintRecord;

/// Sparse `D` built from a flat list of records.
#[derive(Debug, Clone)]
pub struct ConstraintOperator {
    /// `Dᵀ`: records × dof.
    transposed: CsrMatrix,
}

impl ConstraintOperator {
    /// Assembles `Dᵀ` for `particle_count` particles.
    ///
    /// Every global index referenced by a record must be below
    /// `particle_count`.
    pub fn new(records: &[ConstraintRecord], particle_count: usize) -> SylinderResult<Self> {
        let dof = particle_count * DOF_PER_PARTICLE;
        let mut triplets = Vec::with_capacity(records.len() * 2 * DOF_PER_PARTICLE);

        for (k, record) in records.iter().enumerate() {
            let mut push_side = |index: usize, column: [f64; DOF_PER_PARTICLE]| {
                let base = index * DOF_PER_PARTICLE;
                for (d, &v) in column.iter().enumerate() {
                    if v != 0.0 {
                        triplets.push((k, base + d, v));
                    }
                }
            };

            let i = record.global_index_i.index();
            if i >= particle_count {
                return Err(SylinderError::InvariantViolation(format!(
                    "record {k} references particle index {i} but only {particle_count} exist"
                )));
            }
            push_side(i, record.column_i());

            if !record.one_side {
                let j = record.global_index_j.index();
                if j >= particle_count {
                    return Err(SylinderError::InvariantViolation(format!(
                        "record {k} references particle index {j} but only {particle_count} exist"
                    )));
                }
                push_side(j, record.column_j());
            }
        }

        Ok(Self {
            transposed: CsrMatrix::from_triplets(records.len(), dof, &triplets),
        })
    }

    /// Number of records (columns of `D`).
    #[inline]
    pub fn constraint_count(&self) -> usize {
        self.transposed.rows
    }

    /// Generalized dimension (rows of `D`).
    #[inline]
    pub fn dof(&self) -> usize {
        self.transposed.cols
    }

    /// `force = D γ`.
    pub fn apply_d(&self, gamma: &[f64], force: &mut [f64]) {
        self.transposed.apply_transpose(gamma, force);
    }

    /// `rate = Dᵀ v`, the gap rate of every record under velocity `v`.
    pub fn apply_dt(&self, velocity: &[f64], rate: &mut [f64]) {
        self.transposed.apply(velocity, rate);
    }

    /// The stored `Dᵀ` matrix.
    pub fn transposed(&self) -> &CsrMatrix {
        &self.transposed
    }
}

/// Matrix-free `A = dt · Dᵀ M D` (symmetric positive semi-definite when the
/// mobility is).
pub struct SchurComplement<'a> {
    constraints: &'a ConstraintOperator,
    mobility: &'a dyn LinearOperator,
    dt: f64,
}

impl<'a> SchurComplement<'a> {
    pub fn new(
        constraints: &'a ConstraintOperator,
        mobility: &'a dyn LinearOperator,
        dt: f64,
    ) -> SylinderResult<Self> {
        let dof = constraints.dof();
        if mobility.rows() != dof || mobility.cols() != dof {
            return Err(SylinderError::DimensionMismatch {
                expected: dof,
                actual: mobility.rows().max(mobility.cols()),
            });
        }
        Ok(Self {
            constraints,
            mobility,
            dt,
        })
    }
}

impl LinearOperator for SchurComplement<'_> {
    fn rows(&self) -> usize {
        self.constraints.constraint_count()
    }

    fn cols(&self) -> usize {
        self.constraints.constraint_count()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        let dof = self.constraints.dof();
        let mut force = vec![0.0; dof];
        let mut velocity = vec![0.0; dof];
        self.constraints.apply_d(x, &mut force);
        self.mobility.apply(&force, &mut velocity);
        self.constraints.apply_dt(&velocity, y);
        for v in y.iter_mut() {
            *v *= self.dt;
        }
    }
}
