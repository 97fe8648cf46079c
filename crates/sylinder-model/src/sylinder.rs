//! The sylinder particle: a rigid rod with hemispherical caps.
//!
//! The axis direction is the orientation applied to `+z`. Collision
//! geometry (`length_collision`, `radius_collision`) may differ from the
//! hydrodynamic geometry so a suspension can be given a small soft shell.

use serde::{Deserialize, Serialize};
use sylinder_math::{DQuat, DVec3};
use sylinder_types::{GlobalId, GlobalIndex, SylinderError, SylinderResult};

/// Translational and rotational drag coefficients of one sylinder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragCoefficients {
    /// Drag along the axis.
    pub parallel: f64,
    /// Drag perpendicular to the axis.
    pub perpendicular: f64,
    /// Rotational drag.
    pub rotational: f64,
}

/// A rigid spherocylinder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sylinder {
    /// Stable global identifier.
    pub gid: GlobalId,
    /// Slot in the distributed 6-DOF vectors; reassigned every step.
    pub global_index: GlobalIndex,
    /// Rank that currently owns this particle.
    pub rank: u32,

    /// Center position.
    pub pos: DVec3,
    /// Orientation; the axis is `orientation * Z`.
    pub orientation: DQuat,

    /// Hydrodynamic cylinder length (cap-to-cap minus the two caps).
    pub length: f64,
    /// Hydrodynamic radius.
    pub radius: f64,
    /// Collision length.
    pub length_collision: f64,
    /// Collision radius.
    pub radius_collision: f64,

    // ─── Velocity channels (written by the orchestrator) ───
    pub vel: DVec3,
    pub omega: DVec3,
    pub vel_col: DVec3,
    pub omega_col: DVec3,
    pub vel_brown: DVec3,
    pub omega_brown: DVec3,
    pub vel_non_brown: DVec3,
    pub omega_non_brown: DVec3,

    // ─── Force channels ───
    pub force_col: DVec3,
    pub torque_col: DVec3,
    pub force_non_brown: DVec3,
    pub torque_non_brown: DVec3,
}

impl Sylinder {
    /// Creates a sylinder at rest with collision geometry equal to its
    /// hydrodynamic geometry.
    pub fn new(gid: u64, radius: f64, length: f64, pos: DVec3, orientation: DQuat) -> Self {
        Self {
            gid: GlobalId(gid),
            global_index: GlobalIndex(0),
            rank: 0,
            pos,
            orientation: orientation.normalize(),
            length,
            radius,
            length_collision: length,
            radius_collision: radius,
            vel: DVec3::ZERO,
            omega: DVec3::ZERO,
            vel_col: DVec3::ZERO,
            omega_col: DVec3::ZERO,
            vel_brown: DVec3::ZERO,
            omega_brown: DVec3::ZERO,
            vel_non_brown: DVec3::ZERO,
            omega_non_brown: DVec3::ZERO,
            force_col: DVec3::ZERO,
            torque_col: DVec3::ZERO,
            force_non_brown: DVec3::ZERO,
            torque_non_brown: DVec3::ZERO,
        }
    }

    /// Creates a sphere (zero-length sylinder).
    pub fn sphere(gid: u64, radius: f64, pos: DVec3) -> Self {
        Self::new(gid, radius, 0.0, pos, DQuat::IDENTITY)
    }

    /// Scales the collision geometry relative to the hydrodynamic one.
    pub fn with_collision_scale(mut self, scale: f64) -> Self {
        self.radius_collision = self.radius * scale;
        self.length_collision = self.length * scale;
        self
    }

    /// Unit axis direction.
    #[inline]
    pub fn direction(&self) -> DVec3 {
        self.orientation * DVec3::Z
    }

    /// Endpoints of the collision axis, `center ∓ direction * length / 2`.
    #[inline]
    pub fn collision_endpoints(&self) -> (DVec3, DVec3) {
        let half = self.direction() * (0.5 * self.length_collision);
        (self.pos - half, self.pos + half)
    }

    /// True if this particle is short enough to be treated as a sphere.
    #[inline]
    pub fn is_sphere(&self) -> bool {
        self.length < 2.0 * self.radius
    }

    /// Radius of the smallest sphere around the center containing the
    /// collision shape.
    #[inline]
    pub fn bounding_radius(&self) -> f64 {
        0.5 * self.length_collision + self.radius_collision
    }

    /// Geometric volume (cylinder plus two hemispherical caps).
    pub fn volume(&self) -> f64 {
        let r = self.radius;
        std::f64::consts::PI * r * r * self.length + 4.0 / 3.0 * std::f64::consts::PI * r * r * r
    }

    /// Slender-body drag coefficients in a fluid of viscosity `mu`.
    ///
    /// Short particles (length below one diameter) use Stokes sphere drag.
    pub fn drag_coefficients(&self, mu: f64) -> DragCoefficients {
        use std::f64::consts::PI;
        let r = self.radius;
        let l = self.length;
        if self.is_sphere() {
            DragCoefficients {
                parallel: 6.0 * PI * r * mu,
                perpendicular: 6.0 * PI * r * mu,
                rotational: 8.0 * PI * r * r * r * mu,
            }
        } else {
            let b = -(1.0 + 2.0 * (r / l).ln());
            DragCoefficients {
                parallel: 8.0 * PI * l * mu / (2.0 * b),
                perpendicular: 8.0 * PI * l * mu / (b + 2.0),
                rotational: 2.0 * PI * mu * l * l * l / (3.0 * (b + 2.0)),
            }
        }
    }

    /// Explicit Euler update of position and orientation.
    ///
    /// The orientation is advanced by the rotation vector `omega * dt`
    /// and renormalized so it stays a unit rotation.
    pub fn move_euler(&mut self, vel: DVec3, omega: DVec3, dt: f64) {
        self.pos += vel * dt;
        let rotation = DQuat::from_scaled_axis(omega * dt);
        self.orientation = (rotation * self.orientation).normalize();
    }

    /// Checks that the geometry is finite and physically meaningful.
    pub fn validate(&self) -> SylinderResult<()> {
        if !(self.radius > 0.0 && self.radius.is_finite()) {
            return Err(SylinderError::InvalidGeometry(format!(
                "sylinder {} has radius {}",
                self.gid.0, self.radius
            )));
        }
        if !(self.length >= 0.0 && self.length.is_finite()) {
            return Err(SylinderError::InvalidGeometry(format!(
                "sylinder {} has length {}",
                self.gid.0, self.length
            )));
        }
        if !(self.radius_collision > 0.0 && self.length_collision >= 0.0) {
            return Err(SylinderError::InvalidGeometry(format!(
                "sylinder {} has collision radius {} and length {}",
                self.gid.0, self.radius_collision, self.length_collision
            )));
        }
        if !self.pos.is_finite() {
            return Err(SylinderError::InvalidGeometry(format!(
                "sylinder {} has non-finite position",
                self.gid.0
            )));
        }
        if !self.orientation.is_normalized() {
            return Err(SylinderError::InvalidGeometry(format!(
                "sylinder {} orientation is not a unit quaternion",
                self.gid.0
            )));
        }
        Ok(())
    }
}
