//! Unified discovery pipeline: neighbor search → pair tests → wall tests.
//!
//! The pipeline is owned by the orchestrator and run once per timestep to
//! refill the [`Collector`].

use std::ops::Add;

use rayon::prelude::*;
use sylinder_math::DVec3;
use sylinder_model::Sylinder;
use sylinder_types::SylinderResult;

use crate::collector::Collector;
use crate::discovery::PairDiscoveryAdapter;
use crate::neighbor::NeighborSearch;
use crate::wall::Wall;

/// Per-step discovery statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiscoveryStats {
    /// Candidate pairs (and wall pairs) tested.
    pub candidates: usize,
    /// Two-body records produced.
    pub pair_records: usize,
    /// One-sided records produced.
    pub wall_records: usize,
}

impl Add for DiscoveryStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            candidates: self.candidates + other.candidates,
            pair_records: self.pair_records + other.pair_records,
            wall_records: self.wall_records + other.wall_records,
        }
    }
}

impl DiscoveryStats {
    /// Total records produced.
    pub fn records(&self) -> usize {
        self.pair_records + self.wall_records
    }
}

/// Discovery phases of one step.
pub struct CollisionPipeline {
    /// Neighbor search acceleration structure.
    pub search: Box<dyn NeighborSearch>,
    /// Immovable boundaries.
    pub walls: Vec<Wall>,
    /// Gap below which a pair is recorded.
    pub buffer: f64,
}

impl CollisionPipeline {
    pub fn new(search: Box<dyn NeighborSearch>, buffer: f64) -> Self {
        Self {
            search,
            walls: Vec::new(),
            buffer,
        }
    }

    /// Adds a boundary wall.
    pub fn with_wall(mut self, wall: Wall) -> Self {
        self.walls.push(wall);
        self
    }

    /// Clears `collector` and refills it with every contact between
    /// `targets` (the locally owned particles) and `sources` (every particle
    /// that can touch them, including the targets themselves), followed by
    /// every contact between `targets` and the walls.
    ///
    /// Targets are split into one contiguous chunk per worker pool; each
    /// chunk is processed by the task that owns that pool.
    pub fn discover(
        &mut self,
        targets: &[Sylinder],
        sources: &[Sylinder],
        collector: &mut Collector,
    ) -> SylinderResult<DiscoveryStats> {
        collector.clear();
        self.search.build(sources)?;

        let workers = collector.worker_count();
        let chunk = targets.len().div_ceil(workers).max(1);
        let search: &dyn NeighborSearch = self.search.as_ref();
        let walls = &self.walls;
        let buffer = self.buffer;

        let stats = collector
            .workers_mut()
            .map(|(worker, pool)| {
                let begin = (worker.index() * chunk).min(targets.len());
                let end = (begin + chunk).min(targets.len());
                let mut local = DiscoveryStats::default();
                let mut adapter = PairDiscoveryAdapter::new(pool, buffer);

                for target in &targets[begin..end] {
                    search.for_each_candidate(target, &mut |j, shift| {
                        if adapter.visit(target, &sources[j], shift) {
                            local.pair_records += 1;
                        }
                    });
                }
                for target in &targets[begin..end] {
                    for wall in walls {
                        if adapter.visit(target, wall, DVec3::ZERO) {
                            local.wall_records += 1;
                        }
                    }
                }
                local.candidates = adapter.tested();
                local
            })
            .reduce(DiscoveryStats::default, |a, b| a + b);

        tracing::debug!(
            search = search.name(),
            candidates = stats.candidates,
            pairs = stats.pair_records,
            walls = stats.wall_records,
            "collision discovery finished"
        );
        Ok(stats)
    }
}
