//! Self-play training entry point.
//!
//! ```text
//! morris-train --episodes 2000 --checkpoint runs/ckpt.bin --output runs/final.bin
//! morris-train --config train.json --resume runs/ckpt.bin
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use morris_rl::nn::{MlpConfig, MlpNetwork};
use morris_rl::training::{SelfPlayTrainer, TrainerConfig, TrainingError};

#[derive(Parser)]
#[command(name = "morris-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a Nine Men's Morris policy by self-play")]
struct Cli {
    /// JSON trainer configuration; flags override its fields
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Total number of episodes
    #[arg(short, long)]
    episodes: Option<u64>,

    /// Episodes pooled per update
    #[arg(long)]
    episodes_per_update: Option<usize>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Probability of a uniformly random legal action
    #[arg(long)]
    epsilon: Option<f64>,

    /// Checkpoint every N episodes
    #[arg(long)]
    save_every: Option<u64>,

    /// Resumable checkpoint path
    #[arg(long, value_name = "FILE")]
    checkpoint: Option<PathBuf>,

    /// Final weights path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Truncate episodes after this many decisions (0 = unlimited)
    #[arg(long)]
    max_decisions: Option<usize>,

    /// Sampling and initialization seed
    #[arg(long)]
    seed: Option<u64>,

    /// Adam learning rate
    #[arg(long, default_value = "1e-4")]
    learning_rate: f32,

    /// Continue from a checkpoint written by an earlier run
    #[arg(long, value_name = "FILE")]
    resume: Option<PathBuf>,
}

impl Cli {
    fn trainer_config(&self) -> Result<TrainerConfig, TrainingError> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::from_json_file(path)?,
            None => TrainerConfig::default(),
        };
        if let Some(v) = self.episodes {
            config.num_episodes = v;
        }
        if let Some(v) = self.episodes_per_update {
            config.episodes_per_update = v;
        }
        if let Some(v) = self.temperature {
            config.temperature = v;
        }
        if let Some(v) = self.epsilon {
            config.epsilon = v;
        }
        if let Some(v) = self.save_every {
            config.save_every = v;
        }
        if let Some(v) = &self.checkpoint {
            config.checkpoint_path = v.clone();
        }
        if let Some(v) = &self.output {
            config.final_weights_path = v.clone();
        }
        if let Some(v) = self.max_decisions {
            config.max_decisions = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<(), TrainingError> {
    let config = cli.trainer_config()?;
    let network = MlpNetwork::new(
        MlpConfig::default()
            .with_learning_rate(cli.learning_rate)
            .with_seed(config.seed),
    );
    tracing::info!(parameters = network.parameter_count(), "initialized network");

    let mut trainer = SelfPlayTrainer::new(network, config);
    if let Some(path) = &cli.resume {
        trainer.resume(path)?;
    }

    let summary = trainer.train()?;
    tracing::info!(
        episodes = summary.episodes,
        updates = summary.updates,
        win_a = summary.outcomes.player_a,
        win_b = summary.outcomes.player_b,
        draws = summary.outcomes.draws,
        "training finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "training failed");
            ExitCode::FAILURE
        }
    }
}
