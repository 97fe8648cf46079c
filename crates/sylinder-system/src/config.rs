//! Simulation configuration.
//!
//! Parameters that control one run: timestep, fluid, box, boundaries,
//! collision detection and resolution, parallel decomposition. Loaded from
//! TOML; every field has a default so a config file only lists what it
//! changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sylinder_collision::{ResolverConfig, SearchDomain, Wall};
use sylinder_math::DVec3;
use sylinder_types::constants::{DEFAULT_DT, DEFAULT_KBT, DEFAULT_VISCOSITY};
use sylinder_types::{SylinderError, SylinderResult};

/// Mobility operator used to turn forces into velocities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobilityKind {
    /// Per-particle 6×6 drag blocks, applied matrix-free.
    BlockDiagonal,
    /// The same blocks assembled into a dense matrix (small systems only).
    Dense,
}

/// Neighbor search strategy for collision discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    CellList,
    BruteForce,
}

/// A planar wall: origin and normal pointing into the fluid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConfig {
    pub origin: [f64; 3],
    pub normal: [f64; 3],
}

impl BoundaryConfig {
    /// Builds the wall, rejecting a zero normal.
    pub fn to_wall(&self) -> SylinderResult<Wall> {
        Wall::new(DVec3::from_array(self.origin), DVec3::from_array(self.normal))
    }
}

/// Procedural initial configuration used by the `simulate` command when no
/// particle file is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSeedConfig {
    /// Number of particles placed uniformly at random in the box.
    pub count: usize,
    pub radius: f64,
    pub length: f64,
    /// Collision geometry relative to the hydrodynamic one.
    pub collision_scale: f64,
    pub seed: u64,
}

impl Default for ParticleSeedConfig {
    fn default() -> Self {
        Self {
            count: 100,
            radius: 0.0125,
            length: 0.5,
            collision_scale: 1.0,
            seed: 1,
        }
    }
}

/// Configuration for a sylinder simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SylinderConfig {
    /// Timestep size.
    pub dt: f64,
    /// Fluid viscosity.
    pub viscosity: f64,
    /// Thermal energy kBT.
    pub kbt: f64,
    /// Whether to add thermal (Brownian) velocities.
    pub brownian: bool,
    /// Base seed of the per-worker random streams.
    pub rng_seed: u64,

    /// Simulation box lower corner.
    pub box_low: [f64; 3],
    /// Simulation box upper corner.
    pub box_high: [f64; 3],
    /// Per-axis periodicity.
    pub periodic: [bool; 3],
    /// Immovable planar boundaries.
    pub walls: Vec<BoundaryConfig>,

    /// Pairs closer than this (gap) are constrained.
    pub collision_buffer: f64,
    pub resolver: ResolverConfig,
    pub mobility: MobilityKind,
    pub search: SearchKind,

    /// Re-decompose the domain when `max / mean - 1` of per-rank particle
    /// counts exceeds this.
    pub rebalance_threshold: f64,
    /// Advance `snap_id` every this many steps.
    pub snapshot_every: u64,

    pub particles: ParticleSeedConfig,
}

impl Default for SylinderConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            viscosity: DEFAULT_VISCOSITY,
            kbt: DEFAULT_KBT,
            brownian: false,
            rng_seed: 1234,
            box_low: [0.0; 3],
            box_high: [10.0; 3],
            periodic: [false; 3],
            walls: Vec::new(),
            collision_buffer: 0.0,
            resolver: ResolverConfig::default(),
            mobility: MobilityKind::BlockDiagonal,
            search: SearchKind::CellList,
            rebalance_threshold: 0.2,
            snapshot_every: 100,
            particles: ParticleSeedConfig::default(),
        }
    }
}

impl SylinderConfig {
    /// Creates a config for debugging (unit fluid, large steps, loose resolver).
    pub fn debug() -> Self {
        Self {
            dt: 0.01,
            viscosity: 1.0,
            kbt: 0.0,
            resolver: ResolverConfig::debug(),
            snapshot_every: 1,
            ..Default::default()
        }
    }

    /// Parses a TOML document and validates it.
    pub fn from_toml_str(text: &str) -> SylinderResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SylinderError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> SylinderResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> SylinderResult<String> {
        toml::to_string_pretty(self).map_err(|e| SylinderError::Serialization(e.to_string()))
    }

    /// Checks every value for physical and numerical sanity.
    pub fn validate(&self) -> SylinderResult<()> {
        fn positive(name: &str, v: f64) -> SylinderResult<()> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(SylinderError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {v}"
                )))
            }
        }
        fn non_negative(name: &str, v: f64) -> SylinderResult<()> {
            if v >= 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(SylinderError::InvalidConfig(format!(
                    "{name} must be non-negative and finite, got {v}"
                )))
            }
        }

        positive("dt", self.dt)?;
        positive("viscosity", self.viscosity)?;
        non_negative("kbt", self.kbt)?;
        non_negative("collision_buffer", self.collision_buffer)?;
        non_negative("rebalance_threshold", self.rebalance_threshold)?;
        if self.snapshot_every == 0 {
            return Err(SylinderError::InvalidConfig(
                "snapshot_every must be at least 1".into(),
            ));
        }
        self.resolver.validate()?;
        self.search_domain()
            .map_err(|e| SylinderError::InvalidConfig(e.to_string()))?;
        for wall in &self.walls {
            wall.to_wall()
                .map_err(|e| SylinderError::InvalidConfig(e.to_string()))?;
        }

        positive("particles.radius", self.particles.radius)?;
        non_negative("particles.length", self.particles.length)?;
        positive("particles.collision_scale", self.particles.collision_scale)?;
        Ok(())
    }

    /// Box the neighbor search and periodic wrap operate in.
    pub fn search_domain(&self) -> SylinderResult<SearchDomain> {
        SearchDomain::new(
            DVec3::from_array(self.box_low),
            DVec3::from_array(self.box_high),
            self.periodic,
        )
    }

    /// Box volume, used to normalize stress and volume fraction.
    pub fn box_volume(&self) -> f64 {
        let l = DVec3::from_array(self.box_high) - DVec3::from_array(self.box_low);
        l.x * l.y * l.z
    }

    /// Every configured wall.
    pub fn build_walls(&self) -> SylinderResult<Vec<Wall>> {
        self.walls.iter().map(BoundaryConfig::to_wall).collect()
    }
}
