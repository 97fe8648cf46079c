//! Collective communication between ranks.
//!
//! Every collective must be entered by all ranks in the same order; the
//! orchestrator's fixed phase sequence guarantees that.

use std::any::Any;
use std::sync::{Arc, Barrier, Mutex};

use sylinder_types::{RankId, SylinderError, SylinderResult};

/// Collectives the orchestrator needs.
pub trait Communicator: Send {
    /// This rank.
    fn rank(&self) -> RankId;

    /// Number of ranks.
    fn size(&self) -> usize;

    /// Blocks until every rank has arrived.
    fn barrier(&self) -> SylinderResult<()>;

    /// Every rank's contribution, indexed by rank.
    fn all_gather_ranks<T: Clone + Send + 'static>(&self, local: Vec<T>)
        -> SylinderResult<Vec<Vec<T>>>;

    /// Every rank's contribution concatenated in rank order.
    fn all_gather<T: Clone + Send + 'static>(&self, local: Vec<T>) -> SylinderResult<Vec<T>> {
        Ok(self.all_gather_ranks(local)?.into_iter().flatten().collect())
    }

    /// Element-wise sum over ranks, written back into `values` on every rank.
    ///
    /// Contributions are added in rank order so every rank gets bit-identical
    /// results.
    fn all_reduce_sum(&self, values: &mut [f64]) -> SylinderResult<()> {
        let gathered = self.all_gather_ranks(values.to_vec())?;
        values.fill(0.0);
        for contribution in gathered {
            if contribution.len() != values.len() {
                return Err(SylinderError::Communication(format!(
                    "all_reduce_sum length {} differs from local length {}",
                    contribution.len(),
                    values.len()
                )));
            }
            for (v, c) in values.iter_mut().zip(contribution) {
                *v += c;
            }
        }
        Ok(())
    }

    /// Maximum over ranks.
    fn all_reduce_max(&self, value: f64) -> SylinderResult<f64> {
        Ok(self
            .all_gather(vec![value])?
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max))
    }
}

/// The only rank of a serial run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleRank;

impl Communicator for SingleRank {
    fn rank(&self) -> RankId {
        RankId(0)
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> SylinderResult<()> {
        Ok(())
    }

    fn all_gather_ranks<T: Clone + Send + 'static>(
        &self,
        local: Vec<T>,
    ) -> SylinderResult<Vec<Vec<T>>> {
        Ok(vec![local])
    }
}

struct Shared {
    barrier: Barrier,
    slots: Mutex<Vec<Option<Box<dyn Any + Send>>>>,
}

/// Ranks running as threads of one process.
///
/// Collectives exchange data through one slot per rank guarded by a mutex;
/// two barrier phases separate writing the slots from reading them and
/// reading from the next write.
pub struct ThreadComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl ThreadComm {
    /// Creates `size` connected communicators, one per rank, to be moved
    /// into their threads.
    pub fn group(size: usize) -> SylinderResult<Vec<ThreadComm>> {
        if size == 0 {
            return Err(SylinderError::Precondition(
                "communicator group needs at least one rank".into(),
            ));
        }
        let shared = Arc::new(Shared {
            barrier: Barrier::new(size),
            slots: Mutex::new((0..size).map(|_| None).collect()),
        });
        Ok((0..size)
            .map(|rank| ThreadComm {
                rank,
                size,
                shared: Arc::clone(&shared),
            })
            .collect())
    }

    fn poisoned() -> SylinderError {
        SylinderError::Communication("collective slot lock poisoned".into())
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> RankId {
        RankId(self.rank as u32)
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) -> SylinderResult<()> {
        self.shared.barrier.wait();
        Ok(())
    }

    fn all_gather_ranks<T: Clone + Send + 'static>(
        &self,
        local: Vec<T>,
    ) -> SylinderResult<Vec<Vec<T>>> {
        // Both barriers are reached on every path.
        let written = match self.shared.slots.lock() {
            Ok(mut slots) => {
                slots[self.rank] = Some(Box::new(local));
                Ok(())
            }
            Err(_) => Err(Self::poisoned()),
        };
        self.shared.barrier.wait();

        let gathered = written.and_then(|()| {
            let slots = self.shared.slots.lock().map_err(|_| Self::poisoned())?;
            slots
                .iter()
                .enumerate()
                .map(|(rank, slot)| {
                    slot.as_ref()
                        .and_then(|boxed| boxed.downcast_ref::<Vec<T>>())
                        .cloned()
                        .ok_or_else(|| {
                            SylinderError::Communication(format!(
                                "rank {rank} contributed a different type to all_gather"
                            ))
                        })
                })
                .collect::<SylinderResult<Vec<_>>>()
        });
        self.shared.barrier.wait();
        gathered
    }
}
