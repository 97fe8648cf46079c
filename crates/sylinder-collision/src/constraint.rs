//! Constraint record data type.
//!
//! A `ConstraintRecord` represents one detected overlap or near-contact
//! between two sylinders, or between a sylinder and an immovable boundary.
//! It carries everything the resolver needs to build one column of the
//! constraint-coupling operator `D`.

use serde::{Deserialize, Serialize};
use sylinder_math::{DMat3, DVec3};
use sylinder_types::constants::DOF_PER_PARTICLE;
use sylinder_types::{GlobalId, GlobalIndex};

/// One contact constraint.
///
/// Normal convention: `norm_i` points from the contact on `J` toward the
/// contact on `I`, so the force on `I` is `+gamma * norm_i` and a positive
/// `gamma` separates the bodies. `pos_i`/`pos_j` are lever arms from each
/// particle center to its surface contact point.
///
/// When `one_side` is true, `J` is a boundary that does not appear in the
/// mobility system and every `*_j` field is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    /// Signed gap at the start of the step (negative = overlap).
    pub phi0: f64,
    /// Force magnitude; an initial guess before the solve.
    pub gamma: f64,

    pub gid_i: GlobalId,
    pub gid_j: GlobalId,
    pub global_index_i: GlobalIndex,
    pub global_index_j: GlobalIndex,

    /// Unit contact normal on `I`.
    pub norm_i: DVec3,
    /// Unit contact normal on `J` (`-norm_i` for two-body contacts).
    pub norm_j: DVec3,
    /// Lever arm from the center of `I` to its contact point.
    pub pos_i: DVec3,
    /// Lever arm from the center of `J` (periodic image) to its contact point.
    pub pos_j: DVec3,

    /// True when `J` is an immovable boundary.
    pub one_side: bool,

    /// Virial stress contribution per unit `gamma`.
    pub stress: DMat3,
}

impl ConstraintRecord {
    /// Creates a two-body record with `norm_j = -norm_i` and zero initial `gamma`.
    #[allow(clippy::too_many_arguments)]
    pub fn two_body(
        phi0: f64,
        gid_i: GlobalId,
        gid_j: GlobalId,
        global_index_i: GlobalIndex,
        global_index_j: GlobalIndex,
        norm_i: DVec3,
        pos_i: DVec3,
        pos_j: DVec3,
        stress: DMat3,
    ) -> Self {
        Self {
            phi0,
            gamma: 0.0,
            gid_i,
            gid_j,
            global_index_i,
            global_index_j,
            norm_i,
            norm_j: -norm_i,
            pos_i,
            pos_j,
            one_side: false,
            stress,
        }
    }

    /// Creates a one-sided record against a boundary; `J` fields are zeroed.
    pub fn one_sided(
        phi0: f64,
        gid_i: GlobalId,
        global_index_i: GlobalIndex,
        norm_i: DVec3,
        pos_i: DVec3,
        stress: DMat3,
    ) -> Self {
        Self {
            phi0,
            gamma: 0.0,
            gid_i,
            gid_j: GlobalId(0),
            global_index_i,
            global_index_j: GlobalIndex(0),
            norm_i,
            norm_j: DVec3::ZERO,
            pos_i,
            pos_j: DVec3::ZERO,
            one_side: true,
            stress,
        }
    }

    /// Returns the overlap depth (positive if overlapping, zero otherwise).
    pub fn penetration_depth(&self) -> f64 {
        (-self.phi0).max(0.0)
    }

    /// Returns true if the record represents actual overlap.
    pub fn is_overlapping(&self) -> bool {
        self.phi0 < 0.0
    }

    /// Rate of change of the gap under the 6-DOF velocity vector `vel`
    /// (one row of `Dᵀ v`). Positive means the bodies separate.
    pub fn gap_rate(&self, vel: &[f64]) -> f64 {
        let mut rate = Self::side_rate(vel, self.global_index_i, self.norm_i, self.pos_i);
        if !self.one_side {
            rate += Self::side_rate(vel, self.global_index_j, self.norm_j, self.pos_j);
        }
        rate
    }

    /// Gap predicted after one explicit step of length `dt` under `vel`.
    pub fn predicted_gap(&self, vel: &[f64], dt: f64) -> f64 {
        self.phi0 + dt * self.gap_rate(vel)
    }

    /// The six entries of this record's `D` column for particle `I`
    /// (force direction, then torque direction).
    pub fn column_i(&self) -> [f64; DOF_PER_PARTICLE] {
        Self::column(self.norm_i, self.pos_i)
    }

    /// The six entries of this record's `D` column for particle `J`.
    pub fn column_j(&self) -> [f64; DOF_PER_PARTICLE] {
        Self::column(self.norm_j, self.pos_j)
    }

    fn column(norm: DVec3, lever: DVec3) -> [f64; DOF_PER_PARTICLE] {
        let torque = lever.cross(norm);
        [norm.x, norm.y, norm.z, torque.x, torque.y, torque.z]
    }

    fn side_rate(vel: &[f64], index: GlobalIndex, norm: DVec3, lever: DVec3) -> f64 {
        let base = index.dof_offset();
        let v = DVec3::new(vel[base], vel[base + 1], vel[base + 2]);
        let w = DVec3::new(vel[base + 3], vel[base + 4], vel[base + 5]);
        norm.dot(v + w.cross(lever))
    }
}
