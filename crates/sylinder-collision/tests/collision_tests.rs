//! Integration tests for sylinder-collision.

use sylinder_collision::{
    complementarity_residual, BbpgdResolver, BruteForce, CellList, Collidable, CollisionPipeline,
    Collector, ConstraintOperator, ConstraintRecord, NeighborSearch, PairDiscoveryAdapter,
    ResolveProblem, Resolver, ResolverConfig, SchurComplement, SearchDomain, Wall,
};
use sylinder_math::{DMat3, DQuat, DVec3, DenseOperator, LinearOperator};
use sylinder_model::generators::{head_on_spheres, random_in_box};
use sylinder_model::Sylinder;
use sylinder_types::{GlobalIndex, SylinderError, WorkerId};

/// Identity mobility over `n` particles.
struct Identity(usize);

impl LinearOperator for Identity {
    fn rows(&self) -> usize {
        self.0 * 6
    }
    fn cols(&self) -> usize {
        self.0 * 6
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        y.copy_from_slice(x);
    }
}

fn indexed(mut sylinders: Vec<Sylinder>) -> Vec<Sylinder> {
    for (i, s) in sylinders.iter_mut().enumerate() {
        s.global_index = GlobalIndex(i as u32);
    }
    sylinders
}

fn open_box() -> SearchDomain {
    SearchDomain::open(DVec3::splat(-10.0), DVec3::splat(10.0)).unwrap()
}

fn sample_record(gamma: f64) -> ConstraintRecord {
    let pair = indexed(head_on_spheres(1.0, 1.8));
    let mut rec = pair[0].test_collision(&pair[1], DVec3::ZERO).unwrap();
    rec.gamma = gamma;
    rec
}

fn pairs(collector: &Collector) -> Vec<(u64, u64)> {
    let mut out: Vec<_> = collector
        .records()
        .map(|r| (r.gid_i.0, r.gid_j.0))
        .collect();
    out.sort_unstable();
    out
}

// ─── Collector Tests ──────────────────────────────────────────

#[test]
fn collector_rejects_zero_workers() {
    assert!(matches!(Collector::new(0), Err(SylinderError::Precondition(_))));
}

#[test]
fn collector_default_matches_thread_count() {
    let c = Collector::with_worker_count();
    assert_eq!(c.worker_count(), rayon::current_num_threads());
    assert_eq!(c.local_count(), 0);
}

#[test]
fn local_count_is_sum_of_pool_sizes() {
    let mut c = Collector::new(4).unwrap();
    c.record(WorkerId(0), sample_record(0.0)).unwrap();
    c.record(WorkerId(2), sample_record(0.0)).unwrap();
    c.record(WorkerId(2), sample_record(0.0)).unwrap();
    assert_eq!(c.pool_sizes(), vec![1, 0, 2, 0]);
    assert_eq!(c.local_count(), 3);
    assert_eq!(c.flatten().len(), 3);
}

#[test]
fn record_out_of_range_worker_fails() {
    let mut c = Collector::new(2).unwrap();
    assert!(c.record(WorkerId(2), sample_record(0.0)).is_err());
    assert_eq!(c.local_count(), 0);
}

#[test]
fn clear_is_idempotent() {
    let mut c = Collector::new(3).unwrap();
    c.record(WorkerId(1), sample_record(0.0)).unwrap();
    c.clear();
    assert_eq!(c.local_count(), 0);
    c.clear();
    assert_eq!(c.local_count(), 0);
    assert_eq!(c.worker_count(), 3);
}

#[test]
fn max_overlap_is_largest_penetration_depth() {
    let mut c = Collector::new(2).unwrap();
    assert_eq!(c.max_overlap(), 0.0);

    let near = head_on_spheres(1.0, 2.2);
    let gap = near[0].test_collision_within(&near[1], DVec3::ZERO, 0.5).unwrap();
    c.record(WorkerId(0), gap).unwrap();
    assert_eq!(c.max_overlap(), 0.0);

    c.record(WorkerId(1), sample_record(0.0)).unwrap();
    assert!((c.max_overlap() - 0.2).abs() < 1e-12);
}

#[test]
fn empty_collector_has_zero_stress() {
    let c = Collector::new(2).unwrap();
    assert_eq!(c.compute_stress(8.0).unwrap(), DMat3::ZERO);
}

#[test]
fn stress_requires_positive_volume() {
    let c = Collector::new(1).unwrap();
    assert!(c.compute_stress(0.0).is_err());
    assert!(c.compute_stress(f64::NAN).is_err());
}

#[test]
fn stress_is_summed_across_pools_then_normalized() {
    let mut c = Collector::new(3).unwrap();
    c.record(WorkerId(0), sample_record(0.1)).unwrap();
    c.record(WorkerId(2), sample_record(0.3)).unwrap();
    let stress = c.compute_stress(2.0).unwrap();
    // Per unit gamma: -(1.8, 0, 0) ⊗ (1, 0, 0).
    let expected = -1.8 * 0.4 / 2.0;
    assert!((stress.x_axis.x - expected).abs() < 1e-12);
    assert!(stress.y_axis.length() < 1e-12);
    assert!(stress.z_axis.length() < 1e-12);
}

#[test]
fn write_back_gamma_follows_flatten_order() {
    let mut c = Collector::new(2).unwrap();
    c.record(WorkerId(1), sample_record(0.0)).unwrap();
    c.record(WorkerId(0), sample_record(0.0)).unwrap();
    c.write_back_gamma(&[1.0, 2.0]).unwrap();
    let g: Vec<f64> = c.flatten().iter().map(|r| r.gamma).collect();
    assert_eq!(g, vec![1.0, 2.0]);
    assert!(matches!(
        c.write_back_gamma(&[1.0]),
        Err(SylinderError::DimensionMismatch { expected: 2, actual: 1 })
    ));
}

// ─── Pair Test Tests ──────────────────────────────────────────

#[test]
fn head_on_spheres_overlap() {
    let s = indexed(head_on_spheres(1.0, 1.8));
    let rec = s[0].test_collision(&s[1], DVec3::ZERO).unwrap();
    assert!((rec.phi0 + 0.2).abs() < 1e-12);
    assert!((rec.norm_i - DVec3::X).length() < 1e-12);
    assert!((rec.norm_j + DVec3::X).length() < 1e-12);
    assert!((rec.pos_i - DVec3::new(-1.0, 0.0, 0.0)).length() < 1e-12);
    assert!((rec.pos_j - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-12);
    assert!(!rec.one_side);
    assert!(rec.is_overlapping());
}

#[test]
fn pair_is_recorded_from_lower_gid_only() {
    let s = indexed(head_on_spheres(1.0, 1.8));
    assert!(s[1].test_collision(&s[0], DVec3::ZERO).is_none());
    assert!(s[0].test_collision(&s[0], DVec3::ZERO).is_none());
}

#[test]
fn disjoint_spheres_do_not_collide() {
    let s = head_on_spheres(1.0, 2.5);
    assert!(s[0].test_collision(&s[1], DVec3::ZERO).is_none());
}

#[test]
fn buffer_records_near_contacts() {
    let s = head_on_spheres(1.0, 2.2);
    let rec = s[0].test_collision_within(&s[1], DVec3::ZERO, 0.5).unwrap();
    assert!((rec.phi0 - 0.2).abs() < 1e-12);
    assert!(!rec.is_overlapping());
}

#[test]
fn coincident_centers_are_skipped() {
    let a = Sylinder::sphere(0, 1.0, DVec3::ZERO);
    let b = Sylinder::sphere(1, 1.0, DVec3::ZERO);
    assert!(a.test_collision(&b, DVec3::ZERO).is_none());
}

#[test]
fn crossed_rods_touch_at_axis_crossing() {
    let along_x = DQuat::from_rotation_arc(DVec3::Z, DVec3::X);
    let along_y = DQuat::from_rotation_arc(DVec3::Z, DVec3::Y);
    let a = Sylinder::new(0, 0.5, 4.0, DVec3::ZERO, along_x);
    let b = Sylinder::new(1, 0.5, 4.0, DVec3::new(0.0, 0.0, 0.8), along_y);
    let rec = a.test_collision(&b, DVec3::ZERO).unwrap();
    assert!((rec.phi0 + 0.2).abs() < 1e-12);
    assert!((rec.norm_i + DVec3::Z).length() < 1e-12);
}

#[test]
fn periodic_image_shift_is_applied() {
    let a = Sylinder::sphere(0, 0.25, DVec3::new(0.2, 0.0, 0.0));
    let b = Sylinder::sphere(1, 0.25, DVec3::new(9.9, 0.0, 0.0));
    assert!(a.test_collision(&b, DVec3::ZERO).is_none());
    let rec = a.test_collision(&b, DVec3::new(-10.0, 0.0, 0.0)).unwrap();
    assert!((rec.phi0 + 0.2).abs() < 1e-12);
    assert!((rec.norm_i - DVec3::X).length() < 1e-12);
}

#[test]
fn adapter_pushes_into_its_pool() {
    let s = indexed(head_on_spheres(1.0, 1.8));
    let mut c = Collector::new(2).unwrap();
    {
        let pool = c.pool_mut(WorkerId(1)).unwrap();
        let mut adapter = PairDiscoveryAdapter::new(pool, 0.0);
        assert!(adapter.visit(&s[0], &s[1], DVec3::ZERO));
        assert!(!adapter.visit(&s[1], &s[0], DVec3::ZERO));
        assert_eq!(adapter.tested(), 2);
    }
    assert_eq!(c.pool_sizes(), vec![0, 1]);
}

// ─── Wall Tests ───────────────────────────────────────────────

#[test]
fn wall_rejects_zero_normal() {
    assert!(Wall::new(DVec3::ZERO, DVec3::ZERO).is_err());
}

#[test]
fn sphere_penetrating_floor() {
    let s = Sylinder::sphere(0, 1.0, DVec3::new(0.0, 0.0, 0.5));
    let rec = s.test_collision(&Wall::floor(0.0), DVec3::ZERO).unwrap();
    assert!(rec.one_side);
    assert!((rec.phi0 + 0.5).abs() < 1e-12);
    assert!((rec.norm_i - DVec3::Z).length() < 1e-12);
    assert!((rec.pos_i + DVec3::Z).length() < 1e-12);
}

#[test]
fn tilted_rod_touches_wall_with_lower_end() {
    let q = DQuat::from_rotation_arc(DVec3::Z, DVec3::new(1.0, 0.0, 1.0).normalize());
    let s = Sylinder::new(0, 0.1, 2.0, DVec3::new(0.0, 0.0, 0.6), q);
    let rec = s.test_collision(&Wall::floor(0.0), DVec3::ZERO).unwrap();
    let lower = 0.6 - std::f64::consts::FRAC_1_SQRT_2;
    assert!((rec.phi0 - (lower - 0.1)).abs() < 1e-12);
    assert!(rec.pos_i.x < 0.0);
}

#[test]
fn push_out_clears_penetrating_rod() {
    let floor = Wall::floor(0.0);
    let tilted = DQuat::from_rotation_arc(DVec3::Z, DVec3::new(1.0, 0.0, 1.0).normalize());
    let mut s = Sylinder::new(0, 0.2, 2.0, DVec3::new(0.0, 0.0, 0.3), tilted);
    assert!(floor.clearance(&s) < 0.0);
    assert!(s.test_collision(&floor, DVec3::ZERO).is_some());

    let moved = floor.push_out(&mut s);
    assert!(moved > 0.0);
    assert!(floor.clearance(&s) >= 0.0);
    assert!(s.test_collision(&floor, DVec3::ZERO).is_none());
    assert_eq!(s.pos.x, 0.0);

    // Already clear: untouched.
    let before = s.pos;
    assert_eq!(floor.push_out(&mut s), 0.0);
    assert_eq!(s.pos, before);
}

#[test]
fn wall_normal_is_normalized() {
    let w = Wall::new(DVec3::ZERO, DVec3::new(0.0, 3.0, 0.0)).unwrap();
    assert!((w.normal() - DVec3::Y).length() < 1e-12);
    let s = Sylinder::sphere(0, 1.0, DVec3::new(0.0, 2.0, 0.0));
    assert!(s.test_collision(&w, DVec3::ZERO).is_none());
}

// ─── Neighbor Search Tests ────────────────────────────────────

#[test]
fn cell_list_matches_brute_force_in_periodic_box() {
    let domain = SearchDomain::new(DVec3::ZERO, DVec3::splat(5.0), [true, true, false]).unwrap();
    let particles = indexed(random_in_box(
        60,
        DVec3::ZERO,
        DVec3::splat(5.0),
        0.2,
        1.0,
        11,
    ));

    let mut brute = CollisionPipeline::new(Box::new(BruteForce::new(domain, 0.0)), 0.0);
    let mut cells = CollisionPipeline::new(Box::new(CellList::new(domain, 0.0)), 0.0);
    let mut a = Collector::new(3).unwrap();
    let mut b = Collector::new(5).unwrap();
    brute.discover(&particles, &particles, &mut a).unwrap();
    cells.discover(&particles, &particles, &mut b).unwrap();

    assert_eq!(pairs(&a), pairs(&b));
}

#[test]
fn cell_list_reports_image_across_boundary() {
    let domain = SearchDomain::new(DVec3::ZERO, DVec3::splat(10.0), [true; 3]).unwrap();
    let particles = vec![
        Sylinder::sphere(0, 0.25, DVec3::new(0.2, 5.0, 5.0)),
        Sylinder::sphere(1, 0.25, DVec3::new(9.9, 5.0, 5.0)),
    ];
    let mut search = CellList::new(domain, 0.0);
    search.build(&particles).unwrap();
    let mut shifts = Vec::new();
    search.for_each_candidate(&particles[0], &mut |j, shift| {
        if j == 1 {
            shifts.push(shift);
        }
    });
    assert!(shifts.contains(&DVec3::new(-10.0, 0.0, 0.0)));
}

#[test]
fn short_periodic_box_yields_every_overlapping_image() {
    // Rods wider than half the box touch through both x-faces at once.
    let domain = SearchDomain::new(
        DVec3::new(0.0, -10.0, -10.0),
        DVec3::new(3.0, 10.0, 10.0),
        [true, false, false],
    )
    .unwrap();
    let along_y = DQuat::from_rotation_arc(DVec3::Z, DVec3::Y);
    let particles = indexed(vec![
        Sylinder::new(0, 0.8, 4.0, DVec3::new(0.5, 0.0, 0.0), along_y),
        Sylinder::new(1, 0.8, 4.0, DVec3::new(2.0, 0.0, 0.0), along_y),
    ]);

    let mut brute = CollisionPipeline::new(Box::new(BruteForce::new(domain, 0.0)), 0.0);
    let mut cells = CollisionPipeline::new(Box::new(CellList::new(domain, 0.0)), 0.0);
    let mut a = Collector::new(2).unwrap();
    let mut b = Collector::new(2).unwrap();
    brute.discover(&particles, &particles, &mut a).unwrap();
    cells.discover(&particles, &particles, &mut b).unwrap();

    assert_eq!(a.local_count(), 2);
    assert_eq!(b.local_count(), 2);
    for rec in a.records() {
        assert!((rec.phi0 + 0.1).abs() < 1e-12);
    }
    let normals: Vec<f64> = a.records().map(|r| r.norm_i.x).collect();
    assert!(normals.iter().any(|&x| x > 0.999));
    assert!(normals.iter().any(|&x| x < -0.999));
}

#[test]
fn brute_force_reports_images_within_range() {
    let domain = SearchDomain::new(DVec3::ZERO, DVec3::splat(10.0), [true; 3]).unwrap();
    let particles = vec![
        Sylinder::sphere(0, 0.25, DVec3::new(0.2, 5.0, 5.0)),
        Sylinder::sphere(1, 0.25, DVec3::new(9.9, 5.0, 5.0)),
    ];
    let mut search = BruteForce::new(domain, 0.0);
    search.build(&particles).unwrap();
    assert!((search.range() - 0.5).abs() < 1e-12);
    let mut shifts = Vec::new();
    search.for_each_candidate(&particles[0], &mut |j, shift| {
        if j == 1 {
            shifts.push(shift);
        }
    });
    assert_eq!(shifts, vec![DVec3::new(-10.0, 0.0, 0.0)]);
}

#[test]
fn search_domain_rejects_inverted_box() {
    assert!(SearchDomain::open(DVec3::ONE, DVec3::ZERO).is_err());
}

// ─── Pipeline Tests ───────────────────────────────────────────

#[test]
fn pipeline_finds_head_on_pair_once() {
    let s = indexed(head_on_spheres(1.0, 1.8));
    let mut pipeline = CollisionPipeline::new(Box::new(CellList::new(open_box(), 0.0)), 0.0);
    let mut c = Collector::new(4).unwrap();
    let stats = pipeline.discover(&s, &s, &mut c).unwrap();
    assert_eq!(c.local_count(), 1);
    assert_eq!(stats.pair_records, 1);
    assert_eq!(stats.wall_records, 0);
}

#[test]
fn three_disjoint_particles_produce_nothing() {
    let s = indexed(vec![
        Sylinder::sphere(0, 0.5, DVec3::new(0.0, 0.0, 0.0)),
        Sylinder::sphere(1, 0.5, DVec3::new(3.0, 0.0, 0.0)),
        Sylinder::sphere(2, 0.5, DVec3::new(0.0, 3.0, 0.0)),
    ]);
    let mut pipeline = CollisionPipeline::new(Box::new(CellList::new(open_box(), 0.0)), 0.0);
    let mut c = Collector::new(2).unwrap();
    pipeline.discover(&s, &s, &mut c).unwrap();
    assert_eq!(c.local_count(), 0);
    assert_eq!(c.compute_stress(1.0).unwrap(), DMat3::ZERO);
}

#[test]
fn pipeline_clears_previous_records() {
    let s = indexed(head_on_spheres(1.0, 1.8));
    let mut pipeline = CollisionPipeline::new(Box::new(BruteForce::new(open_box(), 0.0)), 0.0);
    let mut c = Collector::new(2).unwrap();
    pipeline.discover(&s, &s, &mut c).unwrap();
    pipeline.discover(&s, &s, &mut c).unwrap();
    assert_eq!(c.local_count(), 1);
}

#[test]
fn pipeline_records_wall_contacts() {
    let s = indexed(vec![Sylinder::sphere(0, 1.0, DVec3::new(0.0, 0.0, 0.5))]);
    let mut pipeline = CollisionPipeline::new(Box::new(CellList::new(open_box(), 0.0)), 0.0)
        .with_wall(Wall::floor(0.0));
    let mut c = Collector::new(2).unwrap();
    let stats = pipeline.discover(&s, &s, &mut c).unwrap();
    assert_eq!(stats.wall_records, 1);
    let rec = c.records().next().unwrap();
    assert!(rec.one_side);
    assert!((rec.phi0 + 0.5).abs() < 1e-12);
}

// ─── Resolver Tests ───────────────────────────────────────────

fn solve(records: &[ConstraintRecord], n: usize, velocity: &[f64]) -> sylinder_collision::ResolveOutcome {
    let mobility = Identity(n);
    let problem = ResolveProblem {
        records,
        velocity_known: velocity,
        mobility: &mobility,
        dt: 1.0,
    };
    BbpgdResolver::default().resolve(&problem).unwrap()
}

#[test]
fn empty_problem_is_trivially_converged() {
    let out = solve(&[], 2, &[0.0; 12]);
    assert!(out.gamma.is_empty());
    assert!(out.report.converged);
    assert_eq!(out.force_col, vec![0.0; 12]);
}

#[test]
fn head_on_spheres_are_pushed_apart() {
    let s = indexed(head_on_spheres(1.0, 1.8));
    let rec = s[0].test_collision(&s[1], DVec3::ZERO).unwrap();
    let out = solve(&[rec], 2, &[0.0; 12]);

    assert!(out.report.converged);
    assert!((out.gamma[0] - 0.1).abs() < 1e-5);
    assert!(out.phi[0].abs() < 1e-5);
    // Particle 0 sits at +x and moves further +x; particle 1 moves -x.
    assert!(out.vel_col[0] > 0.0);
    assert!(out.vel_col[6] < 0.0);
    assert!((out.vel_col[0] + out.vel_col[6]).abs() < 1e-12);
}

#[test]
fn separating_contact_needs_no_force() {
    let s = indexed(head_on_spheres(1.0, 1.8));
    let rec = s[0].test_collision(&s[1], DVec3::ZERO).unwrap();
    let mut v = [0.0; 12];
    v[0] = 1.0;
    v[6] = -1.0;
    let out = solve(&[rec], 2, &v);
    assert_eq!(out.gamma[0], 0.0);
    assert!(out.phi[0] > 0.0);
}

#[test]
fn near_contact_with_positive_gap_stays_inactive() {
    let s = indexed(head_on_spheres(1.0, 2.2));
    let rec = s[0].test_collision_within(&s[1], DVec3::ZERO, 0.5).unwrap();
    let out = solve(&[rec], 2, &[0.0; 12]);
    assert_eq!(out.gamma[0], 0.0);
}

#[test]
fn wall_contact_pushes_sphere_up() {
    let s = indexed(vec![Sylinder::sphere(0, 1.0, DVec3::new(0.0, 0.0, 0.5))]);
    let rec = s[0].test_collision(&Wall::floor(0.0), DVec3::ZERO).unwrap();
    let out = solve(&[rec], 1, &[0.0; 6]);
    assert!((out.gamma[0] - 0.5).abs() < 1e-5);
    assert!(out.vel_col[2] > 0.0);
}

#[test]
fn cluster_solution_is_complementary() {
    let s = indexed(random_in_box(
        40,
        DVec3::ZERO,
        DVec3::splat(4.0),
        0.3,
        0.8,
        3,
    ));
    let mut pipeline = CollisionPipeline::new(Box::new(CellList::new(open_box(), 0.0)), 0.0);
    let mut c = Collector::new(3).unwrap();
    pipeline.discover(&s, &s, &mut c).unwrap();
    let records = c.flatten();
    let out = solve(&records, s.len(), &vec![0.0; s.len() * 6]);

    assert!(out.gamma.iter().all(|&g| g >= 0.0));
    assert!(out.phi.iter().all(|&p| p > -1e-4));
    assert!(complementarity_residual(&out.gamma, &out.phi) <= out.report.residual + 1e-15);
    assert!(out.report.converged, "residual {}", out.report.residual);
}

#[test]
fn post_step_gaps_are_complementary() {
    let s = indexed(random_in_box(
        30,
        DVec3::ZERO,
        DVec3::splat(4.0),
        0.3,
        0.8,
        8,
    ));
    let mut pipeline = CollisionPipeline::new(Box::new(CellList::new(open_box(), 0.0)), 0.0);
    let mut c = Collector::new(2).unwrap();
    pipeline.discover(&s, &s, &mut c).unwrap();
    let records = c.flatten();
    assert!(!records.is_empty());

    // Squeeze the cluster toward its center.
    let mut known = vec![0.0; s.len() * 6];
    for (i, p) in s.iter().enumerate() {
        let v = (DVec3::splat(2.0) - p.pos) * 0.05;
        known[6 * i..6 * i + 3].copy_from_slice(&v.to_array());
    }
    let out = solve(&records, s.len(), &known);
    assert!(out.report.converged, "residual {}", out.report.residual);

    let total: Vec<f64> = known.iter().zip(&out.vel_col).map(|(a, b)| a + b).collect();
    for (k, rec) in records.iter().enumerate() {
        let gap = rec.predicted_gap(&total, 1.0);
        assert!((gap - out.phi[k]).abs() < 1e-9, "record {k}");
        assert!(gap > -1e-4, "record {k} gap {gap}");
        if out.gamma[k] > 1e-4 {
            assert!(gap.abs() < 1e-4, "record {k} active with gap {gap}");
        }
    }
}

#[test]
fn resolver_rejects_mismatched_mobility() {
    let mobility = Identity(3);
    let problem = ResolveProblem {
        records: &[],
        velocity_known: &[0.0; 12],
        mobility: &mobility,
        dt: 1.0,
    };
    assert!(BbpgdResolver::default().resolve(&problem).is_err());
}

#[test]
fn resolver_config_presets_validate() {
    assert!(ResolverConfig::default().validate().is_ok());
    assert!(ResolverConfig::debug().validate().is_ok());
    assert!(ResolverConfig::high_accuracy().validate().is_ok());
    let bad = ResolverConfig {
        tolerance: 0.0,
        ..Default::default()
    };
    assert!(bad.validate().is_err());
}

#[test]
fn resolver_config_deserializes_with_defaults() {
    let cfg: ResolverConfig = serde_json::from_str(r#"{"tolerance": 1e-7}"#).unwrap();
    assert_eq!(cfg.max_iterations, ResolverConfig::default().max_iterations);
    assert_eq!(cfg.tolerance, 1e-7);
}

// ─── Operator Tests ───────────────────────────────────────────

#[test]
fn schur_complement_is_symmetric() {
    let s = indexed(random_in_box(
        25,
        DVec3::ZERO,
        DVec3::splat(3.0),
        0.3,
        1.0,
        5,
    ));
    let mut pipeline = CollisionPipeline::new(Box::new(BruteForce::new(open_box(), 0.0)), 0.0);
    let mut c = Collector::new(2).unwrap();
    pipeline.discover(&s, &s, &mut c).unwrap();
    let records = c.flatten();
    assert!(!records.is_empty());

    let dof = s.len() * 6;
    let mobility = DenseOperator::from_fn(dof, dof, |i, j| {
        if i == j {
            2.0
        } else if (i + j) % 7 == 0 {
            0.01
        } else {
            0.0
        }
    });
    let d = ConstraintOperator::new(&records, s.len()).unwrap();
    let schur = SchurComplement::new(&d, &mobility, 0.5).unwrap();
    let dense = DenseOperator::from_operator(&schur);
    assert!(dense.asymmetry() < 1e-12);
    for k in 0..records.len() {
        assert!(dense.get(k, k) > 0.0);
    }
}

#[test]
fn operator_rows_match_gap_rates() {
    let s = indexed(head_on_spheres(1.0, 1.8));
    let rec = s[0].test_collision(&s[1], DVec3::ZERO).unwrap();
    let d = ConstraintOperator::new(std::slice::from_ref(&rec), 2).unwrap();
    let v = [0.3, 0.1, 0.0, 0.0, 0.2, 0.0, -0.4, 0.0, 0.5, 0.1, 0.0, 0.0];
    let mut rate = [0.0];
    d.apply_dt(&v, &mut rate);
    assert!((rate[0] - rec.gap_rate(&v)).abs() < 1e-12);
}

#[test]
fn operator_rejects_unknown_particle() {
    let rec = sample_record(0.0);
    assert!(ConstraintOperator::new(&[rec], 1).is_err());
}
