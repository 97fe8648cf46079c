//! Canonical scenarios — initial particles + config for each test case.
//!
//! Three scenarios for regression testing:
//! 1. **Head-on** — two overlapping spheres pushed apart along x
//! 2. **Wall contact** — a sphere sunk into a floor
//! 3. **Suspension** — random rods in a periodic box

use serde::{Deserialize, Serialize};
use sylinder_math::DVec3;
use sylinder_model::generators::{head_on_spheres, random_in_box};
use sylinder_model::Sylinder;
use sylinder_types::SylinderResult;

use crate::config::{BoundaryConfig, SylinderConfig};

/// Which scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Two unit spheres with centers 1.8 apart.
    HeadOn,
    /// A unit sphere with its center 0.5 above a floor.
    WallContact,
    /// Random rods in a periodic box.
    Suspension,
}

impl ScenarioKind {
    /// Returns all scenario kinds.
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::HeadOn,
            ScenarioKind::WallContact,
            ScenarioKind::Suspension,
        ]
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::HeadOn => "head_on",
            ScenarioKind::WallContact => "wall_contact",
            ScenarioKind::Suspension => "suspension",
        }
    }

    /// Parses a name produced by [`ScenarioKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// A fully specified scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub config: SylinderConfig,
    pub sylinders: Vec<Sylinder>,
    /// Number of timesteps to simulate.
    pub timesteps: u32,
}

impl Scenario {
    /// Two spheres of radius 1 overlapping by 0.2, at rest in an open box.
    pub fn head_on() -> Self {
        let config = SylinderConfig {
            box_low: [-10.0; 3],
            box_high: [10.0; 3],
            ..SylinderConfig::debug()
        };
        Self {
            kind: ScenarioKind::HeadOn,
            config,
            sylinders: head_on_spheres(1.0, 1.8),
            timesteps: 1,
        }
    }

    /// Sphere of radius 1 at `z = 0.5` above a floor at `z = 0`.
    pub fn wall_contact() -> Self {
        let config = SylinderConfig {
            box_low: [-5.0, -5.0, 0.0],
            box_high: [5.0, 5.0, 10.0],
            walls: vec![BoundaryConfig {
                origin: [0.0; 3],
                normal: [0.0, 0.0, 1.0],
            }],
            ..SylinderConfig::debug()
        };
        Self {
            kind: ScenarioKind::WallContact,
            config,
            sylinders: vec![Sylinder::sphere(0, 1.0, DVec3::new(0.0, 0.0, 0.5))],
            timesteps: 1,
        }
    }

    /// Dense random rods in a fully periodic box, with thermal noise.
    pub fn suspension() -> Self {
        let mut config = SylinderConfig {
            box_low: [0.0; 3],
            box_high: [4.0; 3],
            periodic: [true; 3],
            brownian: true,
            kbt: 1e-3,
            ..SylinderConfig::debug()
        };
        config.particles.count = 60;
        config.particles.radius = 0.1;
        config.particles.length = 0.8;
        let sylinders = seed_in_box(&config);
        Self {
            kind: ScenarioKind::Suspension,
            config,
            sylinders,
            timesteps: 10,
        }
    }

    /// Create a scenario from its kind.
    pub fn from_kind(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::HeadOn => Self::head_on(),
            ScenarioKind::WallContact => Self::wall_contact(),
            ScenarioKind::Suspension => Self::suspension(),
        }
    }
}

/// Random particles in the configured box, following `config.particles`,
/// moved off any wall they would start inside of.
pub fn seed_particles(config: &SylinderConfig) -> SylinderResult<Vec<Sylinder>> {
    let walls = config.build_walls()?;
    let mut sylinders = seed_in_box(config);
    let mut moved = 0usize;
    for s in sylinders.iter_mut() {
        for wall in &walls {
            if wall.push_out(s) > 0.0 {
                moved += 1;
            }
        }
    }
    if moved > 0 {
        tracing::debug!(moved, walls = walls.len(), "seeded sylinders moved off walls");
    }
    Ok(sylinders)
}

fn seed_in_box(config: &SylinderConfig) -> Vec<Sylinder> {
    let p = &config.particles;
    random_in_box(
        p.count,
        DVec3::from_array(config.box_low),
        DVec3::from_array(config.box_high),
        p.radius,
        p.length,
        p.seed,
    )
    .into_iter()
    .map(|s| s.with_collision_scale(p.collision_scale))
    .collect()
}
