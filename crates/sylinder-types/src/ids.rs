//! Strongly-typed identifiers for simulation entities.
//!
//! Newtype wrappers prevent accidental mixing of a particle's global id
//! (stable for its lifetime) with its global index (its slot in the
//! distributed solution vector, reassigned at every domain exchange).

use serde::{Deserialize, Serialize};

/// Globally unique, stable particle identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlobalId(pub u64);

/// Position of a particle in the distributed solution vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlobalIndex(pub u32);

/// Rank (process) identifier in the distributed layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankId(pub u32);

/// Worker thread identifier within a rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub u32);

impl GlobalIndex {
    /// Returns the raw index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// First row of this particle's 6-DOF block.
    #[inline]
    pub fn dof_offset(self) -> usize {
        self.index() * crate::constants::DOF_PER_PARTICLE
    }
}

impl RankId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl WorkerId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u64> for GlobalId {
    fn from(val: u64) -> Self {
        Self(val)
    }
}

impl From<u32> for GlobalIndex {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<usize> for WorkerId {
    fn from(val: usize) -> Self {
        Self(val as u32)
    }
}
