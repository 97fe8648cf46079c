//! Per-timestep orchestration.
//!
//! One step runs these phases in a fixed order on every rank:
//! 1. **Domain maintenance** — periodic wrap, rebalance, exchange, global indices
//! 2. **Known velocity** — Brownian + non-Brownian + mobility · non-Brownian force
//! 3. **Discovery** — local targets against every particle, into the collector
//! 4. **Resolution** — gather records, solve the same global problem everywhere
//! 5. **Write-back** — collision velocity and force per particle
//! 6. **Integration** — explicit Euler on position and orientation
//! 7. **Statistics** — collision stress, volume fraction
//!
//! Phase 1 is [`SylinderSystem::prepare_step`]; phases 2–7 are
//! [`SylinderSystem::run_step`]. No particle may be added, removed or moved
//! between the two.

use std::collections::HashSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sylinder_collision::{
    BbpgdResolver, BruteForce, CellList, CollisionPipeline, Collector, ConstraintRecord,
    NeighborSearch, ResolveProblem, Resolver, SolveReport,
};
use sylinder_math::{DMat3, DVec3, LinearOperator};
use sylinder_model::{Sylinder, SylinderContainer};
use sylinder_telemetry::{EventBus, EventKind};
use sylinder_types::{GlobalId, SylinderError, SylinderResult};

use crate::brownian::RngPool;
use crate::comm::Communicator;
use crate::config::{MobilityKind, SearchKind, SylinderConfig};
use crate::domain::{load_imbalance, offsets, SlabDecomposition};
use crate::mobility::BlockDiagonalMobility;
use crate::state::{read_slot, write_slot, StepVectors};

/// Summary of one completed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Step counter after the step.
    pub step: u64,
    /// Records discovered on this rank.
    pub local_records: usize,
    /// Records discovered on all ranks.
    pub global_records: usize,
    /// Largest overlap depth before resolution, over all ranks.
    pub max_overlap: f64,
    /// Resolver report (identical on every rank).
    pub solve: SolveReport,
    /// Wall-clock time of `run_step` on this rank (seconds).
    pub wall_time: f64,
}

/// Distributed sylinder suspension with hard-body collisions.
pub struct SylinderSystem<C: Communicator> {
    config: SylinderConfig,
    comm: C,

    container: SylinderContainer,
    /// Every particle of every rank, ordered by global index.
    global_view: Vec<Sylinder>,
    decomposition: SlabDecomposition,

    pipeline: CollisionPipeline,
    collector: Collector,
    resolver: Box<dyn Resolver>,
    rng: RngPool,

    vectors: StepVectors,
    local_mobility: BlockDiagonalMobility,
    global_mobility: Box<dyn LinearOperator>,
    mobility_dirty: bool,
    prepared: bool,

    collision_stress: DMat3,
    volume_fraction: f64,
    sim_time: f64,
    step_count: u64,
    snap_id: u64,
    last_report: Option<StepReport>,

    bus: EventBus,
}

impl<C: Communicator> SylinderSystem<C> {
    /// Builds the system from this rank's initial particles.
    ///
    /// Collective: every rank must call it. Particles may start on any rank;
    /// they are moved to their owners by the first [`prepare_step`].
    /// Global ids must be unique across ranks.
    ///
    /// [`prepare_step`]: SylinderSystem::prepare_step
    pub fn new(config: SylinderConfig, sylinders: Vec<Sylinder>, comm: C) -> SylinderResult<Self> {
        config.validate()?;
        let container = SylinderContainer::new(sylinders)?;

        let gids = comm.all_gather(container.iter().map(|s| s.gid).collect())?;
        let mut seen = HashSet::with_capacity(gids.len());
        if let Some(dup) = gids.iter().find(|gid| !seen.insert(**gid)) {
            return Err(SylinderError::InvalidGeometry(format!(
                "duplicate sylinder gid {}",
                dup.0
            )));
        }

        let domain = config.search_domain()?;
        let search: Box<dyn NeighborSearch> = match config.search {
            SearchKind::CellList => Box::new(CellList::new(domain, config.collision_buffer)),
            SearchKind::BruteForce => Box::new(BruteForce::new(domain, config.collision_buffer)),
        };
        let mut pipeline = CollisionPipeline::new(search, config.collision_buffer);
        for wall in config.build_walls()? {
            pipeline = pipeline.with_wall(wall);
        }

        let collector = Collector::with_worker_count();
        let rng = RngPool::new(config.rng_seed, comm.rank().0, collector.worker_count())?;
        let decomposition =
            SlabDecomposition::uniform(config.box_low[0], config.box_high[0], comm.size());

        let comm_rank = comm.rank().0;
        tracing::info!(
            rank = comm_rank,
            ranks = comm.size(),
            particles = container.len(),
            global_particles = gids.len(),
            workers = collector.worker_count(),
            search = pipeline.search.name(),
            "sylinder system initialized"
        );

        Ok(Self {
            resolver: Box::new(BbpgdResolver::new(config.resolver)),
            config,
            comm,
            container,
            global_view: Vec::new(),
            decomposition,
            pipeline,
            collector,
            rng,
            vectors: StepVectors::default(),
            local_mobility: BlockDiagonalMobility::default(),
            global_mobility: Box::new(BlockDiagonalMobility::default()),
            mobility_dirty: true,
            prepared: false,
            collision_stress: DMat3::ZERO,
            volume_fraction: 0.0,
            sim_time: 0.0,
            step_count: 0,
            snap_id: 0,
            last_report: None,
            bus: EventBus::for_rank(comm_rank),
        })
    }

    /// Replaces the contact resolver.
    pub fn with_resolver(mut self, resolver: Box<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Domain maintenance. Collective.
    ///
    /// Wraps periodic coordinates, rebalances when the load imbalance
    /// exceeds the configured threshold, moves particles to their owning
    /// rank, assigns contiguous global indices, refreshes the global view
    /// and rebuilds the mobility if the geometry changed.
    pub fn prepare_step(&mut self) -> SylinderResult<()> {
        let rank = self.comm.rank();
        let domain = self.config.search_domain()?;
        self.container
            .wrap_periodic(domain.low, domain.high, domain.periodic);

        let counts = self.comm.all_gather(vec![self.container.len()])?;
        let imbalance = load_imbalance(&counts);
        let rebalance = self.comm.size() > 1 && imbalance > self.config.rebalance_threshold;
        if rebalance {
            let xs = self
                .comm
                .all_gather(self.container.iter().map(|s| s.pos.x).collect())?;
            self.decomposition = SlabDecomposition::balanced(
                &xs,
                self.comm.size(),
                self.config.box_low[0],
                self.config.box_high[0],
            );
        }

        // Exchange particles whose owner changed.
        let decomposition = &self.decomposition;
        let leaving = self
            .container
            .drain_where(|s| decomposition.owner(s) != rank.index());
        let sent = leaving.len();
        let tagged: Vec<(usize, Sylinder)> = leaving
            .into_iter()
            .map(|s| (self.decomposition.owner(&s), s))
            .collect();
        let arriving: Vec<Sylinder> = self
            .comm
            .all_gather(tagged)?
            .into_iter()
            .filter(|(dest, _)| *dest == rank.index())
            .map(|(_, s)| s)
            .collect();
        let received = arriving.len();
        self.container.extend(arriving)?;
        self.container.sort_by_gid();

        if rebalance {
            tracing::debug!(rank = rank.0, imbalance, sent, received, "domain rebalanced");
            self.bus
                .record(self.step_count, EventKind::DomainRebalance { imbalance, sent });
        }
        if sent > 0 || received > 0 {
            self.mobility_dirty = true;
        }

        let counts = self.comm.all_gather(vec![self.container.len()])?;
        let offset = offsets(&counts)[rank.index()];
        let offset = u32::try_from(offset).map_err(|_| {
            SylinderError::Precondition(format!("global index offset {offset} exceeds u32"))
        })?;
        self.container.assign_global_indices(offset);
        for s in self.container.iter_mut() {
            s.rank = rank.0;
        }

        self.global_view = self
            .comm
            .all_gather(self.container.as_slice().to_vec())?;

        if self.mobility_dirty {
            self.rebuild_mobility();
        }
        self.vectors.reset(self.container.len());
        self.prepared = true;
        Ok(())
    }

    fn rebuild_mobility(&mut self) {
        let mu = self.config.viscosity;
        self.local_mobility = BlockDiagonalMobility::from_sylinders(self.container.as_slice(), mu);
        let global = BlockDiagonalMobility::from_sylinders(&self.global_view, mu);
        self.global_mobility = match self.config.mobility {
            MobilityKind::BlockDiagonal => Box::new(global),
            MobilityKind::Dense => Box::new(global.to_dense()),
        };
        self.mobility_dirty = false;
    }

    /// Phases 2–7 of one step. Collective.
    ///
    /// Fails with a precondition error unless [`prepare_step`] ran since
    /// the last call.
    ///
    /// [`prepare_step`]: SylinderSystem::prepare_step
    pub fn run_step(&mut self) -> SylinderResult<StepReport> {
        if !self.prepared {
            return Err(SylinderError::Precondition(
                "run_step called without prepare_step".into(),
            ));
        }
        let start = Instant::now();
        let rank = self.comm.rank();
        let dt = self.config.dt;
        let n_local = self.container.len();

        self.bus.record(
            self.step_count,
            EventKind::TimestepBegin {
                sim_time: self.sim_time,
                local_particles: n_local,
            },
        );

        // Known velocity.
        if self.config.brownian && self.config.kbt > 0.0 {
            let sqrt_mobility = BlockDiagonalMobility::sqrt_from_sylinders(
                self.container.as_slice(),
                self.config.viscosity,
            );
            self.rng.brownian_velocity(
                &sqrt_mobility,
                self.config.kbt,
                dt,
                &mut self.vectors.velocity_brown,
            )?;
        }
        let mut force_non_brown = vec![0.0; self.vectors.velocity_known.len()];
        for (i, s) in self.container.iter().enumerate() {
            write_slot(&mut force_non_brown, i, s.force_non_brown, s.torque_non_brown);
        }
        self.local_mobility
            .apply(&force_non_brown, &mut self.vectors.velocity_known);
        for (i, s) in self.container.iter_mut().enumerate() {
            let (vb, wb) = read_slot(&self.vectors.velocity_brown, i);
            let (vf, wf) = read_slot(&self.vectors.velocity_known, i);
            s.vel_brown = vb;
            s.omega_brown = wb;
            write_slot(
                &mut self.vectors.velocity_known,
                i,
                vb + s.vel_non_brown + vf,
                wb + s.omega_non_brown + wf,
            );
        }

        // Discovery.
        let stats = self.pipeline.discover(
            self.container.as_slice(),
            &self.global_view,
            &mut self.collector,
        )?;
        let local_records = self.collector.local_count();
        let max_overlap = self.comm.all_reduce_max(self.collector.max_overlap())?;

        // Resolution on the gathered global problem, in canonical record order.
        let record_counts = self.comm.all_gather(vec![local_records])?;
        let records = self.comm.all_gather(self.collector.flatten())?;
        let order = canonical_order(&records);
        let sorted: Vec<ConstraintRecord> = order.iter().map(|&k| records[k].clone()).collect();
        let velocity_known = self.comm.all_gather(self.vectors.velocity_known.clone())?;

        let outcome = self.resolver.resolve(&ResolveProblem {
            records: &sorted,
            velocity_known: &velocity_known,
            mobility: self.global_mobility.as_ref(),
            dt,
        })?;

        let mut gamma = vec![0.0; records.len()];
        for (&k, &g) in order.iter().zip(&outcome.gamma) {
            gamma[k] = g;
        }
        let first = offsets(&record_counts)[rank.index()];
        self.collector
            .write_back_gamma(&gamma[first..first + local_records])?;

        // Write-back and integration.
        for (i, s) in self.container.iter_mut().enumerate() {
            let g = s.global_index.index();
            let (v_col, w_col) = read_slot(&outcome.vel_col, g);
            let (f_col, t_col) = read_slot(&outcome.force_col, g);
            write_slot(&mut self.vectors.velocity_col, i, v_col, w_col);
            write_slot(&mut self.vectors.force_col, i, f_col, t_col);
            s.vel_col = v_col;
            s.omega_col = w_col;
            s.force_col = f_col;
            s.torque_col = t_col;

            let (v_known, w_known) = read_slot(&self.vectors.velocity_known, i);
            s.vel = v_known + v_col;
            s.omega = w_known + w_col;
            let (vel, omega) = (s.vel, s.omega);
            s.move_euler(vel, omega, dt);

            // Non-Brownian inputs are consumed by one step.
            s.vel_non_brown = DVec3::ZERO;
            s.omega_non_brown = DVec3::ZERO;
            s.force_non_brown = DVec3::ZERO;
            s.torque_non_brown = DVec3::ZERO;
        }
        self.mobility_dirty = true;
        self.prepared = false;

        // Statistics.
        let volume = self.config.box_volume();
        let local_stress = self.collector.compute_stress(volume)?;
        let mut reduced = [0.0; 10];
        reduced[..9].copy_from_slice(&local_stress.to_cols_array());
        reduced[9] = self.container.total_volume();
        self.comm.all_reduce_sum(&mut reduced)?;
        let mut stress_cols = [0.0; 9];
        stress_cols.copy_from_slice(&reduced[..9]);
        self.collision_stress = DMat3::from_cols_array(&stress_cols);
        self.volume_fraction = reduced[9] / volume;

        self.step_count += 1;
        self.sim_time += dt;
        if self.step_count % self.config.snapshot_every == 0 {
            self.snap_id += 1;
        }

        let report = StepReport {
            step: self.step_count,
            local_records,
            global_records: records.len(),
            max_overlap,
            solve: outcome.report,
            wall_time: start.elapsed().as_secs_f64(),
        };
        self.last_report = Some(report);
        self.emit_step_events(&report, stats.candidates);

        tracing::debug!(
            rank = rank.0,
            step = self.step_count,
            local_records,
            global_records = report.global_records,
            iterations = report.solve.iterations,
            residual = report.solve.residual,
            "step finished"
        );
        Ok(report)
    }

    fn emit_step_events(&mut self, report: &StepReport, candidates: usize) {
        let step = self.step_count;
        let t = self.collision_stress.transpose();
        self.bus.record(
            step,
            EventKind::CollisionDiscovery {
                local_records: report.local_records,
                global_records: report.global_records,
                max_overlap: report.max_overlap,
            },
        );
        self.bus.record(
            step,
            EventKind::ResolverConvergence {
                iterations: report.solve.iterations,
                residual: report.solve.residual,
                converged: report.solve.converged,
            },
        );
        self.bus.record(
            step,
            EventKind::Stress {
                collision: [
                    t.x_axis.to_array(),
                    t.y_axis.to_array(),
                    t.z_axis.to_array(),
                ],
                volume_fraction: self.volume_fraction,
            },
        );
        self.bus.record(
            step,
            EventKind::Custom {
                label: "discovery_candidates".into(),
                payload: candidates.to_string(),
            },
        );
        self.bus.record(
            step,
            EventKind::TimestepEnd {
                wall_time: report.wall_time,
            },
        );
        self.bus.flush();
    }

    /// [`prepare_step`](Self::prepare_step) followed by [`run_step`](Self::run_step).
    pub fn step(&mut self) -> SylinderResult<StepReport> {
        self.prepare_step()?;
        self.run_step()
    }

    /// Sets the non-Brownian force and torque of every local particle for
    /// the next step, 6 values per particle in container order.
    pub fn set_force_non_brown(&mut self, force: &[f64]) -> SylinderResult<()> {
        self.check_local_len(force.len())?;
        for (i, s) in self.container.iter_mut().enumerate() {
            let (f, t) = read_slot(force, i);
            s.force_non_brown = f;
            s.torque_non_brown = t;
        }
        Ok(())
    }

    /// Sets the non-Brownian velocity of every local particle for the next
    /// step, 6 values per particle in container order.
    pub fn set_velocity_non_brown(&mut self, velocity: &[f64]) -> SylinderResult<()> {
        self.check_local_len(velocity.len())?;
        for (i, s) in self.container.iter_mut().enumerate() {
            let (v, w) = read_slot(velocity, i);
            s.vel_non_brown = v;
            s.omega_non_brown = w;
        }
        Ok(())
    }

    fn check_local_len(&self, len: usize) -> SylinderResult<()> {
        let expected = self.container.len() * sylinder_types::constants::DOF_PER_PARTICLE;
        if len != expected {
            return Err(SylinderError::DimensionMismatch {
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    /// Adds particles on this rank with fresh gids following the current
    /// global maximum. Collective.
    ///
    /// Incoming gids are ignored; the assigned gids are returned in input
    /// order. The next step must start with [`prepare_step`](Self::prepare_step).
    pub fn add_new_sylinders(&mut self, mut new: Vec<Sylinder>) -> SylinderResult<Vec<GlobalId>> {
        let local_next = self.container.max_gid().map_or(0, |g| g.0 + 1);
        let next = self
            .comm
            .all_gather(vec![local_next])?
            .into_iter()
            .max()
            .unwrap_or(0);
        let counts = self.comm.all_gather(vec![new.len()])?;
        let first = next + offsets(&counts)[self.comm.rank().index()] as u64;

        let mut assigned = Vec::with_capacity(new.len());
        for (k, s) in new.iter_mut().enumerate() {
            s.gid = GlobalId(first + k as u64);
            s.validate()?;
            assigned.push(s.gid);
        }
        self.container.extend(new)?;
        self.prepared = false;
        self.mobility_dirty = true;
        Ok(assigned)
    }

    pub fn config(&self) -> &SylinderConfig {
        &self.config
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Locally owned particles.
    pub fn container(&self) -> &SylinderContainer {
        &self.container
    }

    /// Every particle, ordered by global index, as of the last `prepare_step`.
    pub fn global_view(&self) -> &[Sylinder] {
        &self.global_view
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn decomposition(&self) -> &SlabDecomposition {
        &self.decomposition
    }

    /// Local known velocity of the last step.
    pub fn velocity_known(&self) -> &[f64] {
        &self.vectors.velocity_known
    }

    /// Local collision velocity of the last step.
    pub fn velocity_col(&self) -> &[f64] {
        &self.vectors.velocity_col
    }

    /// Local collision force of the last step.
    pub fn force_col(&self) -> &[f64] {
        &self.vectors.force_col
    }

    /// Global collision stress of the last step.
    pub fn collision_stress(&self) -> DMat3 {
        self.collision_stress
    }

    pub fn volume_fraction(&self) -> f64 {
        self.volume_fraction
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn snap_id(&self) -> u64 {
        self.snap_id
    }

    pub fn last_report(&self) -> Option<&StepReport> {
        self.last_report.as_ref()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }
}

/// Permutation sorting records by `(gid_i, one_side, gid_j)`.
///
/// Makes the global problem independent of how particles are spread over
/// ranks; ties keep gather order.
fn canonical_order(records: &[ConstraintRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&k| {
        let r = &records[k];
        (r.gid_i, r.one_side, r.gid_j)
    });
    order
}
