//! Quadruped MPC demo.
//!
//! Drops a 13-link quadruped onto a floor and runs the sampling MPC
//! controller for a fixed number of control steps, printing the rounds
//! completed and the final base height.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use morpho_app::scene::{TIME_STEP, quadruped_scene};
use morpho_core::config::ControllerConfig;
use morpho_core::error::MorphoError;
use morpho_mpc::MpcController;
use morpho_sim::backend::SimulationFactory;
use morpho_sim::objective::BaseHeightObjective;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Sampling MPC demo on a 13-link quadruped.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Number of control steps to run.
    #[arg(short = 'n', long, default_value_t = 2400)]
    steps: u64,

    /// Controller configuration file (TOML). Flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rollout horizon in simulation steps.
    #[arg(long)]
    horizon: Option<usize>,

    /// Control steps between plan recomputations.
    #[arg(long)]
    interval: Option<u32>,

    /// Rollout worker thread count.
    #[arg(short, long)]
    threads: Option<usize>,

    /// Candidate action sequences per round.
    #[arg(long)]
    samples: Option<usize>,

    /// Sampling seed.
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn controller_config(&self) -> Result<ControllerConfig, MorphoError> {
        let mut config = match &self.config {
            Some(path) => ControllerConfig::from_path(path)?,
            None => ControllerConfig::default(),
        };
        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(threads) = self.threads {
            config.thread_count = Some(threads);
        }
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<(), MorphoError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.controller_config()?;

    let (model, scene) = quadruped_scene(TIME_STEP);
    let factory: Arc<dyn SimulationFactory> = Arc::new(scene);
    let objective = Arc::new(BaseHeightObjective::new(Arc::clone(&model)));

    let mut sim = factory.create()?;
    let mut controller = MpcController::new(model, factory, objective, &config)?;

    tracing::info!(
        steps = cli.steps,
        horizon = config.horizon,
        interval = config.interval,
        samples = config.samples,
        threads = config.effective_thread_count(),
        "starting quadruped MPC run"
    );

    for _ in 0..cli.steps {
        controller.update(sim.as_mut())?;
        sim.step();
    }

    let base_height = sim
        .link_transform(0, 0)
        .map(|pose| pose.translation.y)
        .unwrap_or(f32::NAN);
    println!(
        "steps={} rounds={} base_height={base_height:.3}",
        controller.step_count(),
        controller.rounds_completed()
    );
    Ok(())
}
