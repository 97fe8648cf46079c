//! Contact force resolution.
//!
//! Given the records of one step, find force magnitudes `γ` such that
//!
//! ```text
//! γ ≥ 0,   φ = q + A γ ≥ 0,   γ · φ = 0
//! A = dt · Dᵀ M D,            q = φ₀ + dt · Dᵀ V_known
//! ```
//!
//! i.e. every contact is either inactive (no force, non-negative gap) or
//! active (positive force, closed gap) at the end of the step.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use sylinder_math::{dot, LinearOperator};
use sylinder_types::constants::{
    DEFAULT_RESOLVER_ITERATIONS, DEFAULT_RESOLVER_TOLERANCE, DOF_PER_PARTICLE,
};
use sylinder_types::{SylinderError, SylinderResult};

use crate::constraint::ConstraintRecord;
use crate::operator::{ConstraintOperator, SchurComplement};

/// Resolver iteration controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Iteration budget per solve.
    pub max_iterations: u32,
    /// Stop when `max |min(γ, φ)|` drops below this.
    pub tolerance: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_RESOLVER_ITERATIONS,
            tolerance: DEFAULT_RESOLVER_TOLERANCE,
        }
    }
}

impl ResolverConfig {
    /// Creates a config for debugging (fewer iterations, looser tolerance).
    pub fn debug() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-3,
        }
    }

    /// Creates a config for stiff, tightly packed systems.
    pub fn high_accuracy() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-8,
        }
    }

    /// Rejects non-positive budgets and tolerances.
    pub fn validate(&self) -> SylinderResult<()> {
        if self.max_iterations == 0 {
            return Err(SylinderError::InvalidConfig(
                "resolver.max_iterations must be at least 1".into(),
            ));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(SylinderError::InvalidConfig(format!(
                "resolver.tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Convergence summary of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Number of iterations actually performed.
    pub iterations: u32,
    /// Final residual `max |min(γ, φ)|`.
    pub residual: f64,
    /// Whether the residual reached the tolerance.
    pub converged: bool,
    /// Wall-clock time of the solve (seconds).
    pub wall_time: f64,
}

impl SolveReport {
    fn trivial(wall_time: f64) -> Self {
        Self {
            iterations: 0,
            residual: 0.0,
            converged: true,
            wall_time,
        }
    }
}

/// Everything one solve needs, borrowed from the caller.
pub struct ResolveProblem<'a> {
    /// Records of every rank, in global order.
    pub records: &'a [ConstraintRecord],
    /// Velocity absent collision forces, 6 DOF per particle.
    pub velocity_known: &'a [f64],
    /// Force → velocity map over the same index space.
    pub mobility: &'a dyn LinearOperator,
    pub dt: f64,
}

impl ResolveProblem<'_> {
    /// Number of particles implied by the velocity vector.
    pub fn particle_count(&self) -> usize {
        self.velocity_known.len() / DOF_PER_PARTICLE
    }

    /// Checks vector lengths and the timestep.
    pub fn validate(&self) -> SylinderResult<()> {
        let dof = self.velocity_known.len();
        if dof % DOF_PER_PARTICLE != 0 {
            return Err(SylinderError::Precondition(format!(
                "known velocity length {dof} is not a multiple of {DOF_PER_PARTICLE}"
            )));
        }
        if self.mobility.rows() != dof || self.mobility.cols() != dof {
            return Err(SylinderError::DimensionMismatch {
                expected: dof,
                actual: self.mobility.rows(),
            });
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SylinderError::Precondition(format!(
                "timestep must be positive, got {}",
                self.dt
            )));
        }
        Ok(())
    }
}

/// Result of a solve.
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    /// One non-negative force magnitude per record.
    pub gamma: Vec<f64>,
    /// Gap at the end of the step for each record, `q + A γ`.
    pub phi: Vec<f64>,
    /// Collision force `D γ`, 6 DOF per particle.
    pub force_col: Vec<f64>,
    /// Collision velocity `M D γ`.
    pub vel_col: Vec<f64>,
    pub report: SolveReport,
}

impl ResolveOutcome {
    fn empty(dof: usize, report: SolveReport) -> Self {
        Self {
            gamma: Vec::new(),
            phi: Vec::new(),
            force_col: vec![0.0; dof],
            vel_col: vec![0.0; dof],
            report,
        }
    }
}

/// Trait for complementarity solvers.
///
/// # Implementations
///
/// - [`BbpgdResolver`] — Barzilai–Borwein projected gradient descent
pub trait Resolver: Send {
    /// Solves one step's contact problem.
    ///
    /// Non-convergence is not an error: the best iterate is returned with
    /// `report.converged == false`.
    fn resolve(&mut self, problem: &ResolveProblem<'_>) -> SylinderResult<ResolveOutcome>;

    /// Returns the resolver's name.
    fn name(&self) -> &str;
}

/// Barzilai–Borwein projected gradient descent on
/// `min ½ γᵀAγ + qᵀγ  s.t.  γ ≥ 0`.
///
/// Step sizes alternate between the two BB formulas. The iterate with the
/// lowest residual seen is the one returned.
#[derive(Debug, Clone)]
pub struct BbpgdResolver {
    config: ResolverConfig,
}

impl BbpgdResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Runs the projected iteration on an assembled problem.
    ///
    /// `gamma` is the warm start on entry and the solution on exit; `phi`
    /// receives `q + A γ`.
    fn iterate(
        &self,
        a: &dyn LinearOperator,
        q: &[f64],
        gamma: &mut [f64],
        phi: &mut [f64],
    ) -> (u32, f64) {
        let n = q.len();
        for g in gamma.iter_mut() {
            *g = g.max(0.0);
        }

        let mut grad = vec![0.0; n];
        gradient(a, q, gamma, &mut grad);
        let mut residual = complementarity_residual(gamma, &grad);

        let mut best_gamma = gamma.to_vec();
        let mut best_grad = grad.clone();
        let mut best_residual = residual;
        if residual < self.config.tolerance {
            phi.copy_from_slice(&grad);
            return (0, residual);
        }

        // Initial step: exact line search along the gradient.
        let mut a_grad = vec![0.0; n];
        a.apply(&grad, &mut a_grad);
        let curvature = dot(&grad, &a_grad);
        let mut alpha = if curvature > 0.0 {
            dot(&grad, &grad) / curvature
        } else {
            1.0
        };

        let mut next = vec![0.0; n];
        let mut next_grad = vec![0.0; n];
        let mut iterations = 0;

        for k in 1..=self.config.max_iterations {
            iterations = k;
            for i in 0..n {
                next[i] = (gamma[i] - alpha * grad[i]).max(0.0);
            }
            gradient(a, q, &next, &mut next_grad);
            residual = complementarity_residual(&next, &next_grad);

            if residual < best_residual {
                best_residual = residual;
                best_gamma.copy_from_slice(&next);
                best_grad.copy_from_slice(&next_grad);
            }
            if residual < self.config.tolerance {
                break;
            }

            let mut ss = 0.0;
            let mut sy = 0.0;
            let mut yy = 0.0;
            for i in 0..n {
                let s = next[i] - gamma[i];
                let y = next_grad[i] - grad[i];
                ss += s * s;
                sy += s * y;
                yy += y * y;
            }

            gamma.copy_from_slice(&next);
            grad.copy_from_slice(&next_grad);

            if ss == 0.0 {
                // Projection pinned every component; no further progress.
                break;
            }
            let candidate = if k % 2 == 1 { ss / sy } else { sy / yy };
            if candidate.is_finite() && candidate > 0.0 {
                alpha = candidate;
            }
        }

        gamma.copy_from_slice(&best_gamma);
        phi.copy_from_slice(&best_grad);
        (iterations, best_residual)
    }
}

impl Default for BbpgdResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl Resolver for BbpgdResolver {
    fn resolve(&mut self, problem: &ResolveProblem<'_>) -> SylinderResult<ResolveOutcome> {
        let start = Instant::now();
        problem.validate()?;
        let dof = problem.velocity_known.len();

        if problem.records.is_empty() {
            return Ok(ResolveOutcome::empty(
                dof,
                SolveReport::trivial(start.elapsed().as_secs_f64()),
            ));
        }

        let constraints = ConstraintOperator::new(problem.records, problem.particle_count())?;
        let schur = SchurComplement::new(&constraints, problem.mobility, problem.dt)?;

        let nc = problem.records.len();
        let mut q = vec![0.0; nc];
        constraints.apply_dt(problem.velocity_known, &mut q);
        for (qk, record) in q.iter_mut().zip(problem.records) {
            *qk = record.phi0 + problem.dt * *qk;
        }

        let mut gamma: Vec<f64> = problem.records.iter().map(|r| r.gamma).collect();
        let mut phi = vec![0.0; nc];
        let (iterations, residual) = self.iterate(&schur, &q, &mut gamma, &mut phi);

        let mut force_col = vec![0.0; dof];
        let mut vel_col = vec![0.0; dof];
        constraints.apply_d(&gamma, &mut force_col);
        problem.mobility.apply(&force_col, &mut vel_col);

        let report = SolveReport {
            iterations,
            residual,
            converged: residual < self.config.tolerance,
            wall_time: start.elapsed().as_secs_f64(),
        };
        if !report.converged {
            tracing::warn!(
                constraints = nc,
                iterations,
                residual,
                tolerance = self.config.tolerance,
                "collision resolver did not converge; using best iterate"
            );
        } else {
            tracing::debug!(constraints = nc, iterations, residual, "collision resolver converged");
        }

        Ok(ResolveOutcome {
            gamma,
            phi,
            force_col,
            vel_col,
            report,
        })
    }

    fn name(&self) -> &str {
        "bbpgd"
    }
}

/// `grad = A γ + q`, which is also the end-of-step gap `φ`.
fn gradient(a: &dyn LinearOperator, q: &[f64], gamma: &[f64], grad: &mut [f64]) {
    a.apply(gamma, grad);
    for (g, qi) in grad.iter_mut().zip(q) {
        *g += qi;
    }
}

/// `max_k |min(γ_k, φ_k)|`: zero exactly at a complementary solution.
pub fn complementarity_residual(gamma: &[f64], phi: &[f64]) -> f64 {
    gamma
        .iter()
        .zip(phi)
        .fold(0.0_f64, |m, (g, p)| m.max(g.min(*p).abs()))
}
