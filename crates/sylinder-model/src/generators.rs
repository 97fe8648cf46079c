//! Procedural particle generators for scenarios and testing.
//!
//! These generators produce deterministic particle sets: the random
//! generator is seeded explicitly so every rank can reproduce the same
//! initial configuration.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use sylinder_math::{DQuat, DVec3};

use crate::sylinder::Sylinder;

/// Two equal spheres on the x-axis with centers at `±separation / 2`.
///
/// The sphere at `+x` gets gid 0 so it is the `I` side of the contact.
pub fn head_on_spheres(radius: f64, separation: f64) -> Vec<Sylinder> {
    vec![
        Sylinder::sphere(0, radius, DVec3::new(0.5 * separation, 0.0, 0.0)),
        Sylinder::sphere(1, radius, DVec3::new(-0.5 * separation, 0.0, 0.0)),
    ]
}

/// A simple cubic lattice of identical sylinders aligned with `axis`.
///
/// # Example
/// ```
/// use sylinder_math::DVec3;
/// use sylinder_model::generators::lattice;
/// let s = lattice([2, 2, 1], 3.0, 0.5, 1.0, DVec3::Z);
/// assert_eq!(s.len(), 4);
/// ```
pub fn lattice(counts: [usize; 3], spacing: f64, radius: f64, length: f64, axis: DVec3) -> Vec<Sylinder> {
    let orientation = DQuat::from_rotation_arc(DVec3::Z, axis.normalize());
    let mut out = Vec::with_capacity(counts[0] * counts[1] * counts[2]);
    let mut gid = 0u64;
    for k in 0..counts[2] {
        for j in 0..counts[1] {
            for i in 0..counts[0] {
                let pos = DVec3::new(i as f64, j as f64, k as f64) * spacing;
                out.push(Sylinder::new(gid, radius, length, pos, orientation));
                gid += 1;
            }
        }
    }
    out
}

/// Uniformly random centers in `[low, high)` with isotropic orientations.
pub fn random_in_box(
    count: usize,
    low: DVec3,
    high: DVec3,
    radius: f64,
    length: f64,
    seed: u64,
) -> Vec<Sylinder> {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    (0..count)
        .map(|gid| {
            let pos = DVec3::new(
                rng.gen_range(low.x..high.x),
                rng.gen_range(low.y..high.y),
                rng.gen_range(low.z..high.z),
            );
            let axis = random_unit_vector(&mut rng);
            let orientation = DQuat::from_rotation_arc(DVec3::Z, axis);
            Sylinder::new(gid as u64, radius, length, pos, orientation)
        })
        .collect()
}

/// Uniform direction on the unit sphere.
pub fn random_unit_vector(rng: &mut impl Rng) -> DVec3 {
    let z: f64 = rng.gen_range(-1.0..1.0);
    let phi: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let rho = (1.0 - z * z).sqrt();
    DVec3::new(rho * phi.cos(), rho * phi.sin(), z)
}
