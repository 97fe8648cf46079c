//! Sylinder CLI — simulation, scenario regression runs, and input validation.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sylinder")]
#[command(version, about = "Sylinder — hard-body rod suspensions in Stokes flow")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a config file.
    Simulate {
        /// Path to simulation config (TOML). Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<String>,

        /// Number of timesteps.
        #[arg(short, long, default_value_t = 100)]
        steps: u64,

        /// Initial particles (JSON array). Seeded from the config when omitted.
        #[arg(short, long)]
        particles: Option<String>,

        /// Write the final particles to this JSON file.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run canonical scenarios.
    Scenario {
        /// Which scenario to run (head_on, wall_contact, suspension, all).
        #[arg(default_value = "all")]
        name: String,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a config (.toml) or particle file (.json).
    Validate {
        /// Path to the file.
        path: String,
    },

    /// Print the default config as TOML.
    DefaultConfig,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            config,
            steps,
            particles,
            output,
        } => commands::simulate(
            config.as_deref(),
            steps,
            particles.as_deref(),
            output.as_deref(),
        ),
        Commands::Scenario { name, output } => commands::scenario(&name, output.as_deref()),
        Commands::Validate { path } => commands::validate(&path),
        Commands::DefaultConfig => commands::default_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
