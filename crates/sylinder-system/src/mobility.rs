//! Mobility operators: generalized force → generalized velocity.
//!
//! Every particle is treated as an isolated body in Stokes flow, so the
//! mobility is block diagonal with one 6×6 block per particle: a 3×3
//! translational block (anisotropic along the axis for rods) and a 3×3
//! rotational block.

use rayon::prelude::*;
use sylinder_math::{outer, DMat3, DVec3, DenseOperator, LinearOperator};
use sylinder_model::Sylinder;
use sylinder_types::constants::DOF_PER_PARTICLE;

/// Mobility of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MobilityBlock {
    /// Force → translational velocity.
    pub trans: DMat3,
    /// Torque → angular velocity.
    pub rot: DMat3,
}

impl MobilityBlock {
    /// Builds the block from the drag coefficients in a fluid of viscosity `mu`.
    pub fn new(sylinder: &Sylinder, mu: f64) -> Self {
        Self::with_power(sylinder, mu, 1.0)
    }

    /// Symmetric square root of [`MobilityBlock::new`], used to color noise.
    pub fn sqrt(sylinder: &Sylinder, mu: f64) -> Self {
        Self::with_power(sylinder, mu, 0.5)
    }

    /// `drag^-power` along the principal directions.
    fn with_power(sylinder: &Sylinder, mu: f64, power: f64) -> Self {
        let drag = sylinder.drag_coefficients(mu);
        let inv = |c: f64| c.powf(-power);
        let rot = DMat3::IDENTITY * inv(drag.rotational);
        if sylinder.is_sphere() {
            return Self {
                trans: DMat3::IDENTITY * inv(drag.parallel),
                rot,
            };
        }
        let axial = outer(sylinder.direction(), sylinder.direction());
        Self {
            trans: axial * inv(drag.parallel) + (DMat3::IDENTITY - axial) * inv(drag.perpendicular),
            rot,
        }
    }

    /// `out = block · input` over one 6-DOF slot.
    #[inline]
    pub fn apply(&self, input: &[f64], out: &mut [f64]) {
        let f = self.trans * DVec3::new(input[0], input[1], input[2]);
        let t = self.rot * DVec3::new(input[3], input[4], input[5]);
        out[..3].copy_from_slice(&f.to_array());
        out[3..6].copy_from_slice(&t.to_array());
    }
}

/// Block-diagonal mobility applied matrix-free.
#[derive(Debug, Clone, Default)]
pub struct BlockDiagonalMobility {
    blocks: Vec<MobilityBlock>,
}

impl BlockDiagonalMobility {
    /// One block per particle, in slice order.
    pub fn from_sylinders(sylinders: &[Sylinder], mu: f64) -> Self {
        Self {
            blocks: sylinders
                .par_iter()
                .map(|s| MobilityBlock::new(s, mu))
                .collect(),
        }
    }

    /// Square-root mobility blocks, in slice order.
    pub fn sqrt_from_sylinders(sylinders: &[Sylinder], mu: f64) -> Self {
        Self {
            blocks: sylinders
                .par_iter()
                .map(|s| MobilityBlock::sqrt(s, mu))
                .collect(),
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, i: usize) -> Option<&MobilityBlock> {
        self.blocks.get(i)
    }

    /// Assembles the full matrix.
    pub fn to_dense(&self) -> DenseOperator {
        let dof = self.rows();
        DenseOperator::from_fn(dof, dof, |i, j| {
            let (bi, bj) = (i / DOF_PER_PARTICLE, j / DOF_PER_PARTICLE);
            if bi != bj {
                return 0.0;
            }
            let (r, c) = (i % DOF_PER_PARTICLE, j % DOF_PER_PARTICLE);
            let block = &self.blocks[bi];
            match (r < 3, c < 3) {
                (true, true) => block.trans.col(c)[r],
                (false, false) => block.rot.col(c - 3)[r - 3],
                _ => 0.0,
            }
        })
    }
}

impl LinearOperator for BlockDiagonalMobility {
    fn rows(&self) -> usize {
        self.blocks.len() * DOF_PER_PARTICLE
    }

    fn cols(&self) -> usize {
        self.rows()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.cols(), "input length");
        assert_eq!(y.len(), self.rows(), "output length");
        y.par_chunks_mut(DOF_PER_PARTICLE)
            .zip(x.par_chunks(DOF_PER_PARTICLE))
            .zip(self.blocks.par_iter())
            .for_each(|((out, input), block)| block.apply(input, out));
    }
}
