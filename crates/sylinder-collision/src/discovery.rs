//! Pairwise overlap tests and the adapter that routes their results into
//! the calling worker's pool.

use sylinder_math::{outer, segment_segment, DVec3};
use sylinder_model::Sylinder;
use sylinder_types::constants::GEOMETRY_EPSILON;

use crate::collector::ConstraintPool;
use crate::constraint::ConstraintRecord;

/// Something a [`Sylinder`] can be tested against.
///
/// `shift` is added to the source position to form its periodic image.
/// `buffer` widens the detection threshold: a record is produced whenever
/// the gap is below `buffer`, so near-contacts can be constrained too.
pub trait Collidable<S: ?Sized> {
    /// Tests `self` (the target) against `source`, returning a record on contact.
    fn test_collision_within(&self, source: &S, shift: DVec3, buffer: f64)
        -> Option<ConstraintRecord>;

    /// Same as [`test_collision_within`](Collidable::test_collision_within)
    /// with a zero buffer, i.e. actual overlap only.
    fn test_collision(&self, source: &S, shift: DVec3) -> Option<ConstraintRecord> {
        self.test_collision_within(source, shift, 0.0)
    }
}

impl Collidable<Sylinder> for Sylinder {
    fn test_collision_within(
        &self,
        source: &Sylinder,
        shift: DVec3,
        buffer: f64,
    ) -> Option<ConstraintRecord> {
        // One record per physical pair; never against self or an own image.
        if self.gid >= source.gid {
            return None;
        }

        let source_center = source.pos + shift;
        let reach = self.bounding_radius() + source.bounding_radius() + buffer.max(0.0);
        if (self.pos - source_center).length_squared() > reach * reach {
            return None;
        }

        let (p1, q1) = self.collision_endpoints();
        let (p2, q2) = source.collision_endpoints();
        let closest = segment_segment(p1, q1, p2 + shift, q2 + shift);

        let phi0 = closest.distance - (self.radius_collision + source.radius_collision);
        if phi0 >= buffer {
            return None;
        }
        if closest.distance < GEOMETRY_EPSILON {
            tracing::trace!(
                gid_i = self.gid.0,
                gid_j = source.gid.0,
                "coincident axes, contact normal undefined; skipping pair"
            );
            return None;
        }

        let norm_i = (closest.point_a - closest.point_b) / closest.distance;
        let pos_i = closest.point_a - norm_i * self.radius_collision - self.pos;
        let pos_j = closest.point_b + norm_i * source.radius_collision - source_center;
        let stress = -outer(self.pos - source_center, norm_i);

        Some(ConstraintRecord::two_body(
            phi0,
            self.gid,
            source.gid,
            self.global_index,
            source.global_index,
            norm_i,
            pos_i,
            pos_j,
            stress,
        ))
    }
}

/// Routes the results of [`Collidable`] tests into one worker's pool.
///
/// Each discovery task builds its own adapter around the pool it was handed,
/// so adapters of different workers never share state.
pub struct PairDiscoveryAdapter<'a> {
    pool: &'a mut ConstraintPool,
    buffer: f64,
    tested: usize,
}

impl<'a> PairDiscoveryAdapter<'a> {
    pub fn new(pool: &'a mut ConstraintPool, buffer: f64) -> Self {
        Self {
            pool,
            buffer,
            tested: 0,
        }
    }

    /// Tests one `(target, source, shift)` candidate; a detected contact is
    /// appended to the pool. Returns whether a record was produced.
    pub fn visit<S: ?Sized>(&mut self, target: &Sylinder, source: &S, shift: DVec3) -> bool
    where
        Sylinder: Collidable<S>,
    {
        self.tested += 1;
        match target.test_collision_within(source, shift, self.buffer) {
            Some(record) => {
                self.pool.push(record);
                true
            }
            None => false,
        }
    }

    /// Number of candidates tested through this adapter.
    pub fn tested(&self) -> usize {
        self.tested
    }
}
