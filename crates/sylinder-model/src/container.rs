//! The particles owned by one rank.

use serde::{Deserialize, Serialize};
use sylinder_math::DVec3;
use sylinder_types::{GlobalId, GlobalIndex, SylinderResult};

use crate::sylinder::Sylinder;

/// Local particle storage of one rank.
///
/// Particle order is the local order of the rank; `global_index` values
/// are contiguous within a rank once [`assign_global_indices`] has run.
///
/// [`assign_global_indices`]: SylinderContainer::assign_global_indices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SylinderContainer {
    sylinders: Vec<Sylinder>,
}

impl SylinderContainer {
    /// Creates a container, validating every particle.
    pub fn new(sylinders: Vec<Sylinder>) -> SylinderResult<Self> {
        for s in &sylinders {
            s.validate()?;
        }
        Ok(Self { sylinders })
    }

    /// Number of local particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.sylinders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sylinders.is_empty()
    }

    pub fn as_slice(&self) -> &[Sylinder] {
        &self.sylinders
    }

    pub fn as_mut_slice(&mut self) -> &mut [Sylinder] {
        &mut self.sylinders
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sylinder> {
        self.sylinders.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Sylinder> {
        self.sylinders.iter_mut()
    }

    pub fn get(&self, i: usize) -> Option<&Sylinder> {
        self.sylinders.get(i)
    }

    /// Finds a local particle by global id.
    pub fn find(&self, gid: GlobalId) -> Option<&Sylinder> {
        self.sylinders.iter().find(|s| s.gid == gid)
    }

    /// Appends validated particles.
    pub fn extend(&mut self, new: Vec<Sylinder>) -> SylinderResult<()> {
        for s in &new {
            s.validate()?;
        }
        self.sylinders.extend(new);
        Ok(())
    }

    /// Removes and returns every particle for which `leaves` is true.
    pub fn drain_where(&mut self, mut leaves: impl FnMut(&Sylinder) -> bool) -> Vec<Sylinder> {
        let mut kept = Vec::with_capacity(self.sylinders.len());
        let mut gone = Vec::new();
        for s in self.sylinders.drain(..) {
            if leaves(&s) {
                gone.push(s);
            } else {
                kept.push(s);
            }
        }
        self.sylinders = kept;
        gone
    }

    /// Sorts particles by global id so local order is deterministic.
    pub fn sort_by_gid(&mut self) {
        self.sylinders.sort_by_key(|s| s.gid);
    }

    /// Largest global id, if any particle exists.
    pub fn max_gid(&self) -> Option<GlobalId> {
        self.sylinders.iter().map(|s| s.gid).max()
    }

    /// Numbers local particles `offset, offset + 1, ...` in local order.
    pub fn assign_global_indices(&mut self, offset: u32) {
        for (i, s) in self.sylinders.iter_mut().enumerate() {
            s.global_index = GlobalIndex(offset + i as u32);
        }
    }

    /// Wraps centers back into `[low, high)` along periodic axes.
    pub fn wrap_periodic(&mut self, low: DVec3, high: DVec3, periodic: [bool; 3]) {
        let span = high - low;
        for s in &mut self.sylinders {
            for axis in 0..3 {
                if periodic[axis] && span[axis] > 0.0 {
                    let rel = (s.pos[axis] - low[axis]).rem_euclid(span[axis]);
                    s.pos[axis] = low[axis] + rel;
                }
            }
        }
    }

    /// Sum of particle volumes.
    pub fn total_volume(&self) -> f64 {
        self.sylinders.iter().map(Sylinder::volume).sum()
    }
}
