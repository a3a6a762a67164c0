//! Headless playground runner.
//!
//! Steps the playground solver for a fixed number of ticks and reports
//! particle and block counts. Set `RUST_LOG=bparticles=debug` to see every
//! step.

use std::path::PathBuf;

use bparticles::{PlaygroundSolver, SimConfig, Solver, Vec3};
use clap::Parser;

/// Headless bparticles playground
#[derive(Parser, Debug)]
#[command(name = "bparticles")]
#[command(about = "Run the particle playground solver without a viewer")]
struct Args {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 500)]
    steps: u64,

    /// JSON simulation config (reference defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed, overrides the config's seed
    #[arg(long)]
    seed: Option<u64>,

    /// Log a progress line every N ticks (0 disables)
    #[arg(long, default_value_t = 100)]
    report_every: u64,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Write the final particle positions to this file as JSON
    #[arg(long)]
    positions: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let solver = PlaygroundSolver::new(config.to_description()?);
    let mut state = solver.init()?;
    tracing::info!(
        steps = args.steps,
        seed = state.seed(),
        rules = config.rules.len(),
        "starting playground"
    );

    for _ in 0..args.steps {
        solver.step(&mut state)?;
        if args.report_every > 0 && state.tick() % args.report_every == 0 {
            tracing::info!(
                tick = state.tick(),
                particles = solver.particle_amount(&state),
                blocks = state.particles().block_count(),
                "progress"
            );
        }
    }

    let mut positions = vec![Vec3::ZERO; solver.particle_amount(&state)];
    let written = solver.get_positions(&state, &mut positions)?;
    tracing::info!(
        tick = state.tick(),
        particles = written,
        blocks = state.particles().block_count(),
        "finished"
    );

    if let Some(path) = &args.positions {
        std::fs::write(path, serde_json::to_string(&positions)?)?;
        tracing::info!(path = %path.display(), "wrote positions");
    }

    Ok(())
}
