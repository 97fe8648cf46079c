//! Per-step generalized vectors of the locally owned particles.
//!
//! All vectors have length `6 * local_count` and follow the local order of
//! the particle container; slot `i` holds `(vx, vy, vz, wx, wy, wz)` (or
//! force and torque) of particle `i`.

use sylinder_math::DVec3;
use sylinder_types::constants::DOF_PER_PARTICLE;

/// Local velocity and force vectors of one step.
#[derive(Debug, Clone, Default)]
pub struct StepVectors {
    /// Brownian velocity.
    pub velocity_brown: Vec<f64>,
    /// Brownian + non-Brownian + mobility · non-Brownian force.
    pub velocity_known: Vec<f64>,
    /// Velocity induced by the collision forces.
    pub velocity_col: Vec<f64>,
    /// Collision force and torque.
    pub force_col: Vec<f64>,
}

impl StepVectors {
    /// Zeroes every vector and resizes it for `particles` particles.
    pub fn reset(&mut self, particles: usize) {
        let dof = particles * DOF_PER_PARTICLE;
        for v in [
            &mut self.velocity_brown,
            &mut self.velocity_known,
            &mut self.velocity_col,
            &mut self.force_col,
        ] {
            v.clear();
            v.resize(dof, 0.0);
        }
    }

    /// Number of particles the vectors are sized for.
    pub fn particle_count(&self) -> usize {
        self.velocity_known.len() / DOF_PER_PARTICLE
    }
}

/// Reads slot `i` as `(linear, angular)`.
#[inline]
pub fn read_slot(v: &[f64], i: usize) -> (DVec3, DVec3) {
    let b = i * DOF_PER_PARTICLE;
    (
        DVec3::new(v[b], v[b + 1], v[b + 2]),
        DVec3::new(v[b + 3], v[b + 4], v[b + 5]),
    )
}

/// Writes `(linear, angular)` into slot `i`.
#[inline]
pub fn write_slot(v: &mut [f64], i: usize, linear: DVec3, angular: DVec3) {
    let b = i * DOF_PER_PARTICLE;
    v[b..b + 3].copy_from_slice(&linear.to_array());
    v[b + 3..b + 6].copy_from_slice(&angular.to_array());
}
