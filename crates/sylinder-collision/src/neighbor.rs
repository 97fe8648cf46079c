//! Neighbor search interface.
//!
//! Quickly identifies *candidate* pairs that might be in contact. The exact
//! test is done afterwards by [`Collidable`](crate::discovery::Collidable);
//! a search may report extra candidates and duplicates, but must report
//! every truly overlapping pair, including across periodic boundaries.

use serde::{Deserialize, Serialize};
use sylinder_math::DVec3;
use sylinder_model::Sylinder;
use sylinder_types::{SylinderError, SylinderResult};

/// Simulation box the search works in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchDomain {
    pub low: DVec3,
    pub high: DVec3,
    /// Per-axis periodicity.
    pub periodic: [bool; 3],
}

impl SearchDomain {
    /// Creates a domain, rejecting empty or inverted boxes.
    pub fn new(low: DVec3, high: DVec3, periodic: [bool; 3]) -> SylinderResult<Self> {
        if !(low.is_finite() && high.is_finite()) || high.cmple(low).any() {
            return Err(SylinderError::InvalidGeometry(format!(
                "search box must satisfy low < high on every axis, got {low} .. {high}"
            )));
        }
        Ok(Self {
            low,
            high,
            periodic,
        })
    }

    /// Non-periodic box.
    pub fn open(low: DVec3, high: DVec3) -> SylinderResult<Self> {
        Self::new(low, high, [false; 3])
    }

    /// Box edge lengths.
    pub fn lengths(&self) -> DVec3 {
        self.high - self.low
    }

    /// Box volume.
    pub fn volume(&self) -> f64 {
        let l = self.lengths();
        l.x * l.y * l.z
    }
}

/// Candidate pair generator.
pub trait NeighborSearch: Send + Sync {
    /// Rebuilds the acceleration structure for the current source positions.
    fn build(&mut self, sources: &[Sylinder]) -> SylinderResult<()>;

    /// Calls `visit(source_index, shift)` for every candidate source near
    /// `target`. `shift` is added to the source position to form the image
    /// that should be tested.
    fn for_each_candidate(&self, target: &Sylinder, visit: &mut dyn FnMut(usize, DVec3));

    /// Returns the strategy name.
    fn name(&self) -> &str;
}

/// Visits every source, once per periodic image within interaction range.
///
/// Quadratic; intended for small systems and as a reference for the cell
/// list. Boxes shorter than the interaction range yield several images of
/// the same source.
pub struct BruteForce {
    domain: SearchDomain,
    buffer: f64,
    positions: Vec<DVec3>,
    range: f64,
}

impl BruteForce {
    /// `buffer` widens the interaction range the same way it widens contact
    /// detection.
    pub fn new(domain: SearchDomain, buffer: f64) -> Self {
        Self {
            domain,
            buffer: buffer.max(0.0),
            positions: Vec::new(),
            range: 0.0,
        }
    }

    /// Interaction range of the last build.
    pub fn range(&self) -> f64 {
        self.range
    }

    /// Image offsets `k` along one axis with `|delta - k·length| <= range`.
    fn image_span(&self, axis: usize, delta: f64) -> std::ops::RangeInclusive<i64> {
        if !self.domain.periodic[axis] {
            return 0..=0;
        }
        let length = self.domain.lengths()[axis];
        let low = ((delta - self.range) / length).ceil() as i64;
        let high = ((delta + self.range) / length).floor() as i64;
        low..=high
    }
}

impl NeighborSearch for BruteForce {
    fn build(&mut self, sources: &[Sylinder]) -> SylinderResult<()> {
        self.positions.clear();
        self.positions.extend(sources.iter().map(|s| s.pos));
        let max_radius = sources
            .iter()
            .map(Sylinder::bounding_radius)
            .fold(0.0_f64, f64::max);
        self.range = 2.0 * max_radius + self.buffer;
        Ok(())
    }

    fn for_each_candidate(&self, target: &Sylinder, visit: &mut dyn FnMut(usize, DVec3)) {
        let lengths = self.domain.lengths();
        for (j, &p) in self.positions.iter().enumerate() {
            let delta = target.pos - p;
            for kx in self.image_span(0, delta.x) {
                for ky in self.image_span(1, delta.y) {
                    for kz in self.image_span(2, delta.z) {
                        let shift = DVec3::new(kx as f64, ky as f64, kz as f64) * lengths;
                        visit(j, shift);
                    }
                }
            }
        }
    }

    fn name(&self) -> &str {
        "brute_force"
    }
}
