//! Spatial decomposition of particles over ranks.
//!
//! The box is cut into slabs along x, one per rank. Cuts are placed at
//! quantiles of the particle x-coordinates so every rank owns about the
//! same number of particles.

use sylinder_model::Sylinder;

/// Ascending x-positions of the `ranks - 1` interior slab boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct SlabDecomposition {
    cuts: Vec<f64>,
}

impl SlabDecomposition {
    /// Equal-width slabs over `[low, high)`.
    pub fn uniform(low: f64, high: f64, ranks: usize) -> Self {
        let ranks = ranks.max(1);
        let width = (high - low) / ranks as f64;
        Self {
            cuts: (1..ranks).map(|k| low + width * k as f64).collect(),
        }
    }

    /// Slabs holding equal shares of `xs`.
    ///
    /// The result depends only on the multiset of values, so every rank
    /// computes the same cuts from the same gathered input.
    pub fn balanced(xs: &[f64], ranks: usize, low: f64, high: f64) -> Self {
        let ranks = ranks.max(1);
        if xs.is_empty() {
            return Self::uniform(low, high, ranks);
        }
        let mut sorted = xs.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let cuts = (1..ranks)
            .map(|k| {
                let idx = (k * n) / ranks;
                if idx == 0 {
                    f64::NEG_INFINITY
                } else if idx >= n {
                    f64::INFINITY
                } else {
                    0.5 * (sorted[idx - 1] + sorted[idx])
                }
            })
            .collect();
        Self { cuts }
    }

    /// Number of slabs.
    pub fn ranks(&self) -> usize {
        self.cuts.len() + 1
    }

    pub fn cuts(&self) -> &[f64] {
        &self.cuts
    }

    /// Rank owning a particle at `x`.
    #[inline]
    pub fn owner_of(&self, x: f64) -> usize {
        self.cuts.partition_point(|&c| c <= x)
    }

    #[inline]
    pub fn owner(&self, sylinder: &Sylinder) -> usize {
        self.owner_of(sylinder.pos.x)
    }
}

/// `max / mean - 1` of per-rank counts (0 when there are no particles).
pub fn load_imbalance(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 || counts.is_empty() {
        return 0.0;
    }
    let mean = total as f64 / counts.len() as f64;
    let max = counts.iter().copied().max().unwrap_or(0) as f64;
    max / mean - 1.0
}

/// Exclusive prefix sum: the first global index of each rank.
pub fn offsets(counts: &[usize]) -> Vec<usize> {
    counts
        .iter()
        .scan(0usize, |acc, &c| {
            let start = *acc;
            *acc += c;
            Some(start)
        })
        .collect()
}
