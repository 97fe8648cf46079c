//! Closest-point queries between sylinder axes.
//!
//! A sylinder's axis is the segment `center ± direction * length / 2`.
//! Collision gaps are measured between axes and then reduced by the
//! two radii, so the only primitive needed is segment–segment distance.

use sylinder_types::constants::GEOMETRY_EPSILON;

use crate::DVec3;

/// Result of a segment–segment closest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentClosest {
    /// Distance between the closest points.
    pub distance: f64,
    /// Closest point on the first segment.
    pub point_a: DVec3,
    /// Closest point on the second segment.
    pub point_b: DVec3,
    /// Parameter of `point_a` along the first segment, in `[0, 1]`.
    pub s: f64,
    /// Parameter of `point_b` along the second segment, in `[0, 1]`.
    pub t: f64,
}

/// Closest points between segments `[p1, q1]` and `[p2, q2]`.
///
/// Zero-length segments are treated as points. For parallel segments with
/// overlapping projections the returned pair sits at the middle of the
/// overlap, so the contact lever arm is symmetric for side-by-side rods.
pub fn segment_segment(p1: DVec3, q1: DVec3, p2: DVec3, q2: DVec3) -> SegmentClosest {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    let (s, t) = if a <= GEOMETRY_EPSILON && e <= GEOMETRY_EPSILON {
        (0.0, 0.0)
    } else if a <= GEOMETRY_EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= GEOMETRY_EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let s = if denom > GEOMETRY_EPSILON * a * e {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                parallel_midpoint(a, b, c)
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    let point_a = p1 + d1 * s;
    let point_b = p2 + d2 * t;
    SegmentClosest {
        distance: (point_a - point_b).length(),
        point_a,
        point_b,
        s,
        t,
    }
}

/// Parameter on the first segment at the middle of the overlap of the
/// second segment's projection, for (near-)parallel segments.
fn parallel_midpoint(a: f64, b: f64, c: f64) -> f64 {
    let s0 = -c / a;
    let s1 = (b - c) / a;
    let lo = s0.min(s1).max(0.0);
    let hi = s0.max(s1).min(1.0);
    if lo <= hi {
        0.5 * (lo + hi)
    } else if s0.max(s1) < 0.0 {
        0.0
    } else {
        1.0
    }
}
