//! Per-worker constraint buffers.
//!
//! During discovery every worker appends to its own [`ConstraintPool`] and
//! nothing else, so the pools need no locking. The worker index is handed
//! to each task by [`Collector::workers_mut`]; there is no global counter.

use rayon::prelude::*;
use sylinder_math::DMat3;
use sylinder_types::constants::POOL_RESERVE;
use sylinder_types::{SylinderError, SylinderResult, WorkerId};

use crate::constraint::ConstraintRecord;

/// Append-only record buffer owned by one worker during discovery.
#[derive(Debug, Clone, Default)]
pub struct ConstraintPool {
    records: Vec<ConstraintRecord>,
}

impl ConstraintPool {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Appends one record.
    #[inline]
    pub fn push(&mut self, record: ConstraintRecord) {
        self.records.push(record);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &[ConstraintRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConstraintRecord> {
        self.records.iter()
    }

    fn clear(&mut self) {
        self.records.clear();
    }

    /// Partial stress sum `Σ stress · gamma` over this pool.
    fn stress_sum(&self) -> DMat3 {
        self.records
            .iter()
            .fold(DMat3::ZERO, |acc, r| acc + r.stress * r.gamma)
    }
}

/// Owns one [`ConstraintPool`] per worker thread.
///
/// Created once per run and reused every step; the number of pools never
/// changes after construction. Between the end of discovery and the next
/// [`clear`](Collector::clear) the pools are read-only.
#[derive(Debug, Clone)]
pub struct Collector {
    pools: Vec<ConstraintPool>,
}

impl Collector {
    /// Creates a collector with `workers` pools.
    ///
    /// Zero workers is a precondition violation.
    pub fn new(workers: usize) -> SylinderResult<Self> {
        if workers == 0 {
            return Err(SylinderError::Precondition(
                "collector needs at least one worker pool".into(),
            ));
        }
        let pools = (0..workers)
            .map(|_| ConstraintPool::with_capacity(POOL_RESERVE))
            .collect();
        Ok(Self { pools })
    }

    /// Creates a collector with one pool per thread of the current rayon pool.
    pub fn with_worker_count() -> Self {
        let workers = rayon::current_num_threads().max(1);
        Self {
            pools: (0..workers)
                .map(|_| ConstraintPool::with_capacity(POOL_RESERVE))
                .collect(),
        }
    }

    /// Number of worker pools.
    #[inline]
    pub fn worker_count(&self) -> usize {
        self.pools.len()
    }

    /// Empties every pool. Idempotent.
    pub fn clear(&mut self) {
        for pool in &mut self.pools {
            pool.clear();
        }
    }

    /// Appends `record` to the pool of `worker`.
    pub fn record(&mut self, worker: WorkerId, record: ConstraintRecord) -> SylinderResult<()> {
        let count = self.pools.len();
        let pool = self.pools.get_mut(worker.index()).ok_or_else(|| {
            SylinderError::Precondition(format!(
                "worker {} out of range for {count} pools",
                worker.index()
            ))
        })?;
        pool.push(record);
        Ok(())
    }

    /// Exclusive access to every pool, tagged with its worker id, as a
    /// parallel iterator. Each task owns exactly one pool.
    pub fn workers_mut(
        &mut self,
    ) -> impl IndexedParallelIterator<Item = (WorkerId, &mut ConstraintPool)> + '_ {
        self.pools
            .par_iter_mut()
            .enumerate()
            .map(|(i, pool)| (WorkerId::from(i), pool))
    }

    /// Exclusive access to one pool.
    pub fn pool_mut(&mut self, worker: WorkerId) -> Option<&mut ConstraintPool> {
        self.pools.get_mut(worker.index())
    }

    /// Total number of records across pools.
    pub fn local_count(&self) -> usize {
        self.pools.iter().map(ConstraintPool::len).sum()
    }

    /// Size of each pool, in worker order.
    pub fn pool_sizes(&self) -> Vec<usize> {
        self.pools.iter().map(ConstraintPool::len).collect()
    }

    /// Every record, pool by pool.
    pub fn records(&self) -> impl Iterator<Item = &ConstraintRecord> {
        self.pools.iter().flat_map(ConstraintPool::iter)
    }

    /// Copies every record into one vector, pool by pool.
    pub fn flatten(&self) -> Vec<ConstraintRecord> {
        let mut out = Vec::with_capacity(self.local_count());
        for pool in &self.pools {
            out.extend_from_slice(pool.as_slice());
        }
        out
    }

    /// Stores solved force magnitudes back into the records, in the same
    /// order as [`flatten`](Collector::flatten).
    pub fn write_back_gamma(&mut self, gamma: &[f64]) -> SylinderResult<()> {
        let expected = self.local_count();
        if gamma.len() != expected {
            return Err(SylinderError::DimensionMismatch {
                expected,
                actual: gamma.len(),
            });
        }
        let mut values = gamma.iter();
        for pool in &mut self.pools {
            for (record, &g) in pool.records.iter_mut().zip(&mut values) {
                record.gamma = g;
            }
        }
        Ok(())
    }

    /// Largest penetration depth among the records (0 if none overlap).
    pub fn max_overlap(&self) -> f64 {
        self.records()
            .map(ConstraintRecord::penetration_depth)
            .fold(0.0, f64::max)
    }

    /// Unnormalized stress `Σ stress · gamma`.
    ///
    /// Each pool is reduced by its own task; the partial sums are then
    /// added sequentially in pool order.
    pub fn stress_sum(&self) -> DMat3 {
        let partials: Vec<DMat3> = self.pools.par_iter().map(ConstraintPool::stress_sum).collect();
        partials.into_iter().fold(DMat3::ZERO, |acc, s| acc + s)
    }

    /// Collision stress `(1 / volume) · Σ stress · gamma`.
    ///
    /// The division happens exactly once, after the cross-pool sum. Summing
    /// the results of several ranks therefore gives the global stress for
    /// the same `volume`.
    pub fn compute_stress(&self, volume: f64) -> SylinderResult<DMat3> {
        if !(volume > 0.0 && volume.is_finite()) {
            return Err(SylinderError::Precondition(format!(
                "stress normalization volume must be positive, got {volume}"
            )));
        }
        Ok(self.stress_sum() * (1.0 / volume))
    }
}
