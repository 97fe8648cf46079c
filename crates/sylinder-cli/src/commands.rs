//! CLI command implementations.

use sylinder_model::Sylinder;
use sylinder_system::runner::{RunMetrics, ScenarioRunner};
use sylinder_system::scenarios::{seed_particles, Scenario, ScenarioKind};
use sylinder_system::{SingleRank, SylinderConfig, SylinderSystem};
use sylinder_telemetry::TracingSink;

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn read_particles(path: &str) -> Result<Vec<Sylinder>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let particles: Vec<Sylinder> = serde_json::from_str(&content)?;
    Ok(particles)
}

/// Run a simulation from config file.
pub fn simulate(
    config_path: Option<&str>,
    steps: u64,
    particles_path: Option<&str>,
    output_path: Option<&str>,
) -> CliResult {
    println!("Sylinder Simulation");
    println!("───────────────────");

    let config = match config_path {
        Some(path) => {
            println!("Config:     {path}");
            SylinderConfig::load(path)?
        }
        None => {
            println!("Config:     (defaults)");
            SylinderConfig::default()
        }
    };
    let particles = match particles_path {
        Some(path) => {
            println!("Particles:  {path}");
            read_particles(path)?
        }
        None => seed_particles(&config)?,
    };
    println!(
        "Setup:      {} particles, dt = {:e}, {} steps",
        particles.len(),
        config.dt,
        steps
    );
    println!();

    let snapshot_every = config.snapshot_every;
    let mut system = SylinderSystem::new(config, particles, SingleRank)?;
    system
        .bus_mut()
        .add_sink(Box::new(TracingSink::new(tracing::Level::DEBUG)));

    let mut unconverged = 0u64;
    for _ in 0..steps {
        let report = system.step()?;
        if !report.solve.converged {
            unconverged += 1;
        }
        if report.step % snapshot_every == 0 {
            println!(
                "  step {:>6}  snap {:>4}  records {:>6}  iters {:>5}  residual {:.3e}  phi {:.4}",
                report.step,
                system.snap_id(),
                report.global_records,
                report.solve.iterations,
                report.solve.residual,
                system.volume_fraction(),
            );
        }
    }
    system.bus_mut().finalize();

    let stress = system.collision_stress();
    println!();
    println!("Sim time:       {:.6}", system.sim_time());
    println!("Unconverged:    {unconverged} / {steps}");
    println!(
        "Stress trace:   {:.6e}",
        stress.x_axis.x + stress.y_axis.y + stress.z_axis.z
    );

    if let Some(path) = output_path {
        let json = serde_json::to_string_pretty(system.container().as_slice())?;
        std::fs::write(path, json)?;
        println!("Particles written to: {path}");
    }
    Ok(())
}

/// Run canonical scenarios.
pub fn scenario(name: &str, output_path: Option<&str>) -> CliResult {
    println!("Sylinder Scenarios");
    println!("══════════════════");
    println!();

    let kinds: Vec<ScenarioKind> = if name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        match ScenarioKind::from_name(name) {
            Some(kind) => vec![kind],
            None => {
                let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
                return Err(format!(
                    "Unknown scenario: '{name}'. Available: {}, all",
                    available.join(", ")
                )
                .into());
            }
        }
    };

    let mut all_metrics = Vec::new();
    for kind in kinds {
        let scenario = Scenario::from_kind(kind);
        println!(
            "Running: {} ({} particles, {} steps)",
            kind.name(),
            scenario.sylinders.len(),
            scenario.timesteps,
        );

        let metrics = ScenarioRunner::run(&scenario)
            .map_err(|e| format!("Scenario failed: {e}"))?;

        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg step:      {:.3}ms", metrics.avg_step_time * 1000.0);
        println!("  Avg iters:     {:.1}", metrics.avg_iterations);
        println!("  Max records:   {}", metrics.max_records);
        println!("  Stress trace:  {:.6e}", metrics.final_stress_trace);
        println!();

        all_metrics.push(metrics);
    }

    let csv = RunMetrics::to_csv(&all_metrics);
    if let Some(path) = output_path {
        std::fs::write(path, &csv)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        println!("{csv}");
    }
    Ok(())
}

/// Validate a config or particle file.
pub fn validate(path: &str) -> CliResult {
    println!("Sylinder Validator");
    println!("──────────────────");
    println!();

    if path.ends_with(".toml") {
        println!("Validating config: {path}");
        let config = SylinderConfig::load(path)?;
        println!(
            "✅ Config is valid ({} walls, periodic {:?}).",
            config.walls.len(),
            config.periodic
        );
    } else if path.ends_with(".json") {
        println!("Validating particles: {path}");
        let particles = read_particles(path)?;
        let failures: Vec<String> = particles
            .iter()
            .filter_map(|s| s.validate().err().map(|e| e.to_string()))
            .collect();
        if failures.is_empty() {
            println!("✅ {} particles are valid.", particles.len());
        } else {
            for f in &failures {
                println!("❌ {f}");
            }
            return Err(format!("{} invalid particles", failures.len()).into());
        }
    } else {
        println!("Unsupported file format. Use .toml (config) or .json (particles).");
    }
    Ok(())
}

/// Print the default config.
pub fn default_config() -> CliResult {
    print!("{}", SylinderConfig::default().to_toml_string()?);
    Ok(())
}
