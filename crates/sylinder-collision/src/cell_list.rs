//! Cell-list neighbor search.
//!
//! Partitions space into cells at least one interaction range wide and bins
//! sylinder centers into them. Candidates for a target come from its own
//! cell and the 26 adjacent ones. Periodic axes wrap, and the image shift of
//! every candidate is reported alongside its index.

use std::collections::HashMap;

use sylinder_math::DVec3;
use sylinder_model::Sylinder;
use sylinder_types::{SylinderError, SylinderResult};

use crate::neighbor::{NeighborSearch, SearchDomain};

type CellKey = (i64, i64, i64);

/// Uniform grid over the search domain.
pub struct CellList {
    domain: SearchDomain,
    buffer: f64,
    /// Edge length of a cell along each axis.
    cell_size: DVec3,
    /// Cell count along periodic axes (0 on open axes).
    dims: [i64; 3],
    /// Per cell: source index and the shift that maps it into the box.
    grid: HashMap<CellKey, Vec<(u32, DVec3)>>,
    range: f64,
}

impl CellList {
    /// Creates an empty cell list; `buffer` widens the interaction range
    /// the same way it widens contact detection.
    pub fn new(domain: SearchDomain, buffer: f64) -> Self {
        Self {
            domain,
            buffer: buffer.max(0.0),
            cell_size: DVec3::ONE,
            dims: [0; 3],
            grid: HashMap::new(),
            range: 0.0,
        }
    }

    /// Interaction range of the last build.
    pub fn range(&self) -> f64 {
        self.range
    }

    /// Cell of `p` together with the shift that maps `p` into the periodic box.
    fn locate(&self, p: DVec3) -> (CellKey, DVec3) {
        let lengths = self.domain.lengths();
        let mut key = [0_i64; 3];
        let mut shift = DVec3::ZERO;
        for axis in 0..3 {
            let raw = ((p[axis] - self.domain.low[axis]) / self.cell_size[axis]).floor() as i64;
            if self.dims[axis] > 0 {
                let wrapped = raw.rem_euclid(self.dims[axis]);
                shift[axis] = ((wrapped - raw) / self.dims[axis]) as f64 * lengths[axis];
                key[axis] = wrapped;
            } else {
                key[axis] = raw;
            }
        }
        ((key[0], key[1], key[2]), shift)
    }
}

impl NeighborSearch for CellList {
    fn build(&mut self, sources: &[Sylinder]) -> SylinderResult<()> {
        self.grid.clear();
        if sources.len() > u32::MAX as usize {
            return Err(SylinderError::Precondition(format!(
                "cell list holds at most {} sources, got {}",
                u32::MAX,
                sources.len()
            )));
        }

        let max_radius = sources
            .iter()
            .map(Sylinder::bounding_radius)
            .fold(0.0_f64, f64::max);
        self.range = (2.0 * max_radius + self.buffer).max(f64::EPSILON);

        let lengths = self.domain.lengths();
        for axis in 0..3 {
            if self.domain.periodic[axis] {
                let dim = ((lengths[axis] / self.range).floor() as i64).max(1);
                self.dims[axis] = dim;
                self.cell_size[axis] = lengths[axis] / dim as f64;
            } else {
                self.dims[axis] = 0;
                self.cell_size[axis] = self.range;
            }
        }

        for (i, s) in sources.iter().enumerate() {
            let (key, shift) = self.locate(s.pos);
            self.grid.entry(key).or_default().push((i as u32, shift));
        }
        Ok(())
    }

    fn for_each_candidate(&self, target: &Sylinder, visit: &mut dyn FnMut(usize, DVec3)) {
        let lengths = self.domain.lengths();
        let (center, target_shift) = self.locate(target.pos);
        let center = [center.0, center.1, center.2];

        for dx in -1..=1_i64 {
            for dy in -1..=1_i64 {
                for dz in -1..=1_i64 {
                    let mut key = [0_i64; 3];
                    let mut image = DVec3::ZERO;
                    for (axis, d) in [dx, dy, dz].into_iter().enumerate() {
                        let n = center[axis] + d;
                        let dim = self.dims[axis];
                        if dim > 0 {
                            let wrapped = n.rem_euclid(dim);
                            image[axis] = ((n - wrapped) / dim) as f64 * lengths[axis];
                            key[axis] = wrapped;
                        } else {
                            key[axis] = n;
                        }
                    }
                    let Some(cell) = self.grid.get(&(key[0], key[1], key[2])) else {
                        continue;
                    };
                    for &(j, source_shift) in cell {
                        visit(j as usize, source_shift + image - target_shift);
                    }
                }
            }
        }
    }

    fn name(&self) -> &str {
        "cell_list"
    }
}
