//! Scenario runner — executes scenarios on a single rank and collects metrics.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use sylinder_types::SylinderResult;

use crate::comm::SingleRank;
use crate::scenarios::{Scenario, ScenarioKind};
use crate::system::SylinderSystem;

/// Metrics collected from one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Scenario name.
    pub scenario: String,
    pub particles: usize,
    /// Number of timesteps executed.
    pub timesteps: u32,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// Average wall-clock time per timestep (seconds).
    pub avg_step_time: f64,
    /// Average resolver iterations per step.
    pub avg_iterations: f64,
    /// Steps whose resolver reached its tolerance.
    pub converged_steps: u32,
    /// Largest number of records in any step.
    pub max_records: usize,
    /// Overlap found in the first step.
    pub initial_max_overlap: f64,
    /// Trace of the collision stress after the last step.
    pub final_stress_trace: f64,
    pub final_volume_fraction: f64,
}

impl RunMetrics {
    /// CSV header line.
    pub fn to_csv_header() -> String {
        "scenario,particles,timesteps,total_wall_time_s,avg_step_ms,avg_iterations,converged_steps,max_records,initial_max_overlap,final_stress_trace,final_volume_fraction".to_string()
    }

    /// Format this metrics instance as a CSV data row.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{:.6},{:.4},{:.1},{},{},{:.6e},{:.6e},{:.6}",
            self.scenario,
            self.particles,
            self.timesteps,
            self.total_wall_time,
            self.avg_step_time * 1000.0,
            self.avg_iterations,
            self.converged_steps,
            self.max_records,
            self.initial_max_overlap,
            self.final_stress_trace,
            self.final_volume_fraction,
        )
    }

    /// Format multiple metrics as a complete CSV string.
    pub fn to_csv(metrics: &[RunMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}

/// Runs scenarios and collects metrics.
pub struct ScenarioRunner;

impl ScenarioRunner {
    /// Run a single scenario.
    pub fn run(scenario: &Scenario) -> SylinderResult<RunMetrics> {
        let mut system = SylinderSystem::new(
            scenario.config.clone(),
            scenario.sylinders.clone(),
            SingleRank,
        )?;

        let mut step_times = Vec::with_capacity(scenario.timesteps as usize);
        let mut total_iterations = 0u64;
        let mut converged_steps = 0u32;
        let mut max_records = 0usize;
        let mut initial_max_overlap = 0.0;

        let total_start = Instant::now();
        for k in 0..scenario.timesteps {
            let report = system.step()?;
            step_times.push(report.wall_time);
            total_iterations += u64::from(report.solve.iterations);
            if report.solve.converged {
                converged_steps += 1;
            }
            max_records = max_records.max(report.global_records);
            if k == 0 {
                initial_max_overlap = report.max_overlap;
            }
        }
        let total_wall_time = total_start.elapsed().as_secs_f64();

        let steps = step_times.len().max(1) as f64;
        let stress = system.collision_stress();
        Ok(RunMetrics {
            scenario: scenario.kind.name().to_string(),
            particles: scenario.sylinders.len(),
            timesteps: scenario.timesteps,
            total_wall_time,
            avg_step_time: step_times.iter().sum::<f64>() / steps,
            avg_iterations: total_iterations as f64 / steps,
            converged_steps,
            max_records,
            initial_max_overlap,
            final_stress_trace: stress.x_axis.x + stress.y_axis.y + stress.z_axis.z,
            final_volume_fraction: system.volume_fraction(),
        })
    }

    /// Run all scenarios and return metrics for each.
    pub fn run_all() -> SylinderResult<Vec<RunMetrics>> {
        ScenarioKind::all()
            .iter()
            .map(|&kind| Self::run(&Scenario::from_kind(kind)))
            .collect()
    }
}
