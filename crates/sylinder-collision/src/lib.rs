//! # sylinder-collision
//!
//! Contact discovery and resolution for sylinder suspensions.
//!
//! One step of the collision pipeline:
//! 1. **Neighbor search** — cell list or brute force, periodic aware
//! 2. **Discovery** — exact segment-based overlap tests, each worker writing
//!    [`ConstraintRecord`]s into its own pool of the [`Collector`]
//! 3. **Resolution** — a complementarity solve for non-negative contact
//!    force magnitudes ([`BbpgdResolver`])
//!
//! Neighbor search and resolution are pluggable traits.

pub mod cell_list;
pub mod collector;
pub mod constraint;
pub mod discovery;
pub mod neighbor;
pub mod operator;
pub mod pipeline;
pub mod resolver;
pub mod wall;

pub use cell_list::CellList;
pub use collector::{Collector, ConstraintPool};
pub use constraint::ConstraintRecord;
pub use discovery::{Collidable, PairDiscoveryAdapter};
pub use neighbor::{BruteForce, NeighborSearch, SearchDomain};
pub use operator::{ConstraintOperator, SchurComplement};
pub use pipeline::{CollisionPipeline, DiscoveryStats};
pub use resolver::{
    complementarity_residual, BbpgdResolver, ResolveOutcome, ResolveProblem, Resolver,
    ResolverConfig, SolveReport,
};
pub use wall::Wall;
