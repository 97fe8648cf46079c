//! Integration tests for sylinder-math.

use sylinder_math::dense::DenseOperator;
use sylinder_math::geometry::segment_segment;
use sylinder_math::sparse::{CsrMatrix, LinearOperator};
use sylinder_math::DVec3;

// ─── Segment Distance Tests ───────────────────────────────────

#[test]
fn crossing_segments() {
    let r = segment_segment(
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, -1.0, 0.5),
        DVec3::new(0.0, 1.0, 0.5),
    );
    assert!((r.distance - 0.5).abs() < 1e-12);
    assert!((r.point_a - DVec3::ZERO).length() < 1e-12);
    assert!((r.point_b - DVec3::new(0.0, 0.0, 0.5)).length() < 1e-12);
}

#[test]
fn point_segments_are_spheres() {
    let p = DVec3::new(0.9, 0.0, 0.0);
    let q = DVec3::new(-0.9, 0.0, 0.0);
    let r = segment_segment(p, p, q, q);
    assert!((r.distance - 1.8).abs() < 1e-12);
    assert_eq!(r.point_a, p);
    assert_eq!(r.point_b, q);
}

#[test]
fn point_against_segment_clamps() {
    let r = segment_segment(
        DVec3::new(3.0, 1.0, 0.0),
        DVec3::new(3.0, 1.0, 0.0),
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(2.0, 0.0, 0.0),
    );
    assert!((r.t - 1.0).abs() < 1e-12);
    assert!((r.distance - 2.0_f64.sqrt()).abs() < 1e-12);
}

#[test]
fn parallel_segments_use_overlap_midpoint() {
    let r = segment_segment(
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(4.0, 0.0, 0.0),
        DVec3::new(2.0, 1.0, 0.0),
        DVec3::new(6.0, 1.0, 0.0),
    );
    assert!((r.distance - 1.0).abs() < 1e-12);
    assert!((r.point_a.x - 3.0).abs() < 1e-12);
    assert!((r.point_b.x - 3.0).abs() < 1e-12);
}

#[test]
fn disjoint_collinear_segments() {
    let r = segment_segment(
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(3.0, 0.0, 0.0),
        DVec3::new(5.0, 0.0, 0.0),
    );
    assert!((r.distance - 2.0).abs() < 1e-12);
}

// ─── Sparse Operator Tests ────────────────────────────────────

#[test]
fn csr_from_triplets_and_apply() {
    // [1 0 2]
    // [0 3 0]
    let m = CsrMatrix::from_triplets(2, 3, &[(0, 2, 2.0), (1, 1, 3.0), (0, 0, 1.0)]);
    assert_eq!(m.nnz(), 3);
    assert_eq!(m.columns[..2], [0, 2]);

    let mut y = vec![0.0; 2];
    m.apply(&[1.0, 1.0, 1.0], &mut y);
    assert_eq!(y, vec![3.0, 3.0]);

    let mut z = vec![0.0; 3];
    m.apply_transpose(&[1.0, 2.0], &mut z);
    assert_eq!(z, vec![1.0, 6.0, 2.0]);
}

#[test]
fn csr_duplicates_are_additive() {
    let m = CsrMatrix::from_triplets(1, 1, &[(0, 0, 1.5), (0, 0, 2.5)]);
    let mut y = vec![0.0; 1];
    m.apply(&[2.0], &mut y);
    assert_eq!(y[0], 8.0);
}

// ─── Dense Operator Tests ─────────────────────────────────────

#[test]
fn dense_matches_sparse() {
    let m = CsrMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (0, 1, -1.0), (1, 0, -1.0), (1, 1, 2.0)]);
    let d = DenseOperator::from_operator(&m);
    assert_eq!(d.get(0, 1), -1.0);
    assert_eq!(d.asymmetry(), 0.0);

    let mut y = vec![0.0; 2];
    d.apply(&[1.0, 3.0], &mut y);
    assert!((y[0] + 1.0).abs() < 1e-12);
    assert!((y[1] - 5.0).abs() < 1e-12);
}
