//! Physical constants and simulation defaults.

/// Degrees of freedom per particle: 3 translational + 3 rotational.
pub const DOF_PER_PARTICLE: usize = 6;

/// Default simulation timestep (seconds).
pub const DEFAULT_DT: f64 = 1.0e-4;

/// Default fluid viscosity (pN·s/µm², water at room temperature).
pub const DEFAULT_VISCOSITY: f64 = 0.001;

/// Default thermal energy kBT (pN·µm at 300 K).
pub const DEFAULT_KBT: f64 = 0.00411;

/// Default resolver iteration budget per timestep.
pub const DEFAULT_RESOLVER_ITERATIONS: u32 = 2000;

/// Default resolver residual tolerance (length units of the gap function).
pub const DEFAULT_RESOLVER_TOLERANCE: f64 = 1.0e-5;

/// Initial per-pool capacity reserved by the collector.
pub const POOL_RESERVE: usize = 50;

/// Distances below this are treated as coincident points.
pub const GEOMETRY_EPSILON: f64 = 1.0e-12;
