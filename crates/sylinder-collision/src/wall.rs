//! Immovable planar boundaries.
//!
//! A wall is the half-space `{ x : (x - origin) · normal >= 0 }`. Sylinders
//! in contact with it produce one-sided constraint records.

use serde::{Deserialize, Serialize};
use sylinder_math::{outer, DVec3};
use sylinder_model::Sylinder;
use sylinder_types::constants::GEOMETRY_EPSILON;
use sylinder_types::{SylinderError, SylinderResult};

use crate::constraint::ConstraintRecord;
use crate::discovery::Collidable;

/// Planar wall with a unit normal pointing into the allowed region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    origin: DVec3,
    normal: DVec3,
}

impl Wall {
    /// Creates a wall through `origin`; `normal` is normalized.
    ///
    /// A zero or non-finite normal is rejected.
    pub fn new(origin: DVec3, normal: DVec3) -> SylinderResult<Self> {
        let len = normal.length();
        if !len.is_finite() || len < GEOMETRY_EPSILON {
            return Err(SylinderError::InvalidGeometry(format!(
                "wall normal must be non-zero, got {normal}"
            )));
        }
        if !origin.is_finite() {
            return Err(SylinderError::InvalidGeometry(format!(
                "wall origin must be finite, got {origin}"
            )));
        }
        Ok(Self {
            origin,
            normal: normal / len,
        })
    }

    /// Horizontal floor at `z = height`, normal `+z`.
    pub fn floor(height: f64) -> Self {
        Self {
            origin: DVec3::new(0.0, 0.0, height),
            normal: DVec3::Z,
        }
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Signed distance of a point from the plane.
    #[inline]
    pub fn signed_distance(&self, p: DVec3) -> f64 {
        (p - self.origin).dot(self.normal)
    }

    /// Gap between the collision surface of `sylinder` and the plane;
    /// negative when it penetrates.
    pub fn clearance(&self, sylinder: &Sylinder) -> f64 {
        let (p, q) = sylinder.collision_endpoints();
        self.signed_distance(p).min(self.signed_distance(q)) - sylinder.radius_collision
    }

    /// Moves a penetrating `sylinder` along the normal until it clears the
    /// wall. Returns the distance moved.
    pub fn push_out(&self, sylinder: &mut Sylinder) -> f64 {
        let gap = self.clearance(sylinder);
        if gap >= 0.0 {
            return 0.0;
        }
        let lift = GEOMETRY_EPSILON - gap;
        sylinder.pos += self.normal * lift;
        lift
    }
}

impl Collidable<Wall> for Sylinder {
    fn test_collision_within(
        &self,
        wall: &Wall,
        _shift: DVec3,
        buffer: f64,
    ) -> Option<ConstraintRecord> {
        let (p, q) = self.collision_endpoints();
        let dp = wall.signed_distance(p);
        let dq = wall.signed_distance(q);

        // Axis parallel to the wall: contact at the axis midpoint.
        let (axis_point, dist) = if (dp - dq).abs() < GEOMETRY_EPSILON {
            let mid = (p + q) * 0.5;
            (mid, wall.signed_distance(mid))
        } else if dp < dq {
            (p, dp)
        } else {
            (q, dq)
        };

        let phi0 = dist - self.radius_collision;
        if phi0 >= buffer {
            return None;
        }

        let n = wall.normal;
        let contact = axis_point - n * self.radius_collision;
        let wall_point = axis_point - n * dist;
        let stress = -outer(self.pos - wall_point, n);

        Some(ConstraintRecord::one_sided(
            phi0,
            self.gid,
            self.global_index,
            n,
            contact - self.pos,
            stress,
        ))
    }
}
