//! Thermal velocity generation.
//!
//! Each worker owns an independent ChaCha stream so draws can run in
//! parallel without shared state and stay reproducible for a fixed worker
//! count.

use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use sylinder_types::constants::DOF_PER_PARTICLE;
use sylinder_types::{SylinderError, SylinderResult};

use crate::mobility::BlockDiagonalMobility;

/// One random stream per worker.
pub struct RngPool {
    rngs: Vec<ChaChaRng>,
}

impl RngPool {
    /// Seeds worker `k` of rank `rank` with `seed + rank * workers + k`.
    pub fn new(seed: u64, rank: u32, workers: usize) -> SylinderResult<Self> {
        if workers == 0 {
            return Err(SylinderError::Precondition(
                "random pool needs at least one worker".into(),
            ));
        }
        let base = seed.wrapping_add(rank as u64 * workers as u64);
        Ok(Self {
            rngs: (0..workers)
                .map(|k| ChaChaRng::seed_from_u64(base.wrapping_add(k as u64)))
                .collect(),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.rngs.len()
    }

    /// Fills `out` with independent standard normal samples.
    ///
    /// The vector is split into one contiguous chunk per worker; worker `k`
    /// always draws for chunk `k`.
    pub fn fill_standard_normal(&mut self, out: &mut [f64]) {
        if out.is_empty() {
            return;
        }
        let chunk = out.len().div_ceil(self.rngs.len());
        out.par_chunks_mut(chunk)
            .zip(self.rngs.par_iter_mut())
            .for_each(|(values, rng)| {
                for v in values.iter_mut() {
                    *v = StandardNormal.sample(rng);
                }
            });
    }

    /// Brownian velocity `sqrt(2 kBT / dt) · M^½ ξ` for every particle of
    /// `mobility_sqrt`, written into `out` (6 DOF per particle).
    pub fn brownian_velocity(
        &mut self,
        mobility_sqrt: &BlockDiagonalMobility,
        kbt: f64,
        dt: f64,
        out: &mut [f64],
    ) -> SylinderResult<()> {
        let dof = mobility_sqrt.len() * DOF_PER_PARTICLE;
        if out.len() != dof {
            return Err(SylinderError::DimensionMismatch {
                expected: dof,
                actual: out.len(),
            });
        }
        let mut noise = vec![0.0; dof];
        self.fill_standard_normal(&mut noise);

        let scale = (2.0 * kbt / dt).sqrt();
        out.par_chunks_mut(DOF_PER_PARTICLE)
            .zip(noise.par_chunks(DOF_PER_PARTICLE))
            .enumerate()
            .for_each(|(i, (v, xi))| {
                if let Some(block) = mobility_sqrt.block(i) {
                    block.apply(xi, v);
                    for c in v.iter_mut() {
                        *c *= scale;
                    }
                }
            });
        Ok(())
    }
}
