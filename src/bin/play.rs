//! Watch a trained policy play itself.
//!
//! ```text
//! morris-play checkpoints/policy_final.bin --max-turns 200
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use morris_rl::core::GameRng;
use morris_rl::display::render_state;
use morris_rl::nn::{MlpNetwork, PolicyValueNetwork, UniformPolicyZeroValue};
use morris_rl::rules::{GameResult, MillsEngine};
use morris_rl::training::{Sampling, SelfPlayAgent, TrainingError};

#[derive(Parser)]
#[command(name = "morris-play")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Play a greedy self-play game and print each position")]
struct Cli {
    /// Weights or checkpoint file; a uniform policy is used when omitted
    #[arg(value_name = "FILE")]
    weights: Option<PathBuf>,

    /// Stop after this many turns
    #[arg(long, default_value = "200")]
    max_turns: usize,

    /// Sample at this temperature instead of playing greedily
    #[arg(long)]
    temperature: Option<f32>,

    #[arg(long, default_value = "0")]
    seed: u64,
}

fn play(cli: &Cli, network: &dyn PolicyValueNetwork) -> Result<(), TrainingError> {
    let sampling = match cli.temperature {
        Some(temperature) => Sampling::Stochastic {
            temperature,
            epsilon: 0.0,
        },
        None => Sampling::Greedy,
    };
    let mut agent = SelfPlayAgent::new(GameRng::new(cli.seed));
    let mut engine = MillsEngine::new();

    println!("{}\n", render_state(engine.state()));
    for turn in 1..=cli.max_turns {
        if engine.is_terminal() {
            break;
        }
        let mover = engine.state().to_move();
        let Some(plan) = agent.resolve_full_turn(network, engine.state(), sampling)? else {
            println!("{mover} has no legal move");
            break;
        };
        if let Err(err) = engine.apply_turn(&plan) {
            tracing::warn!(error = %err, "engine rejected the policy's turn");
            break;
        }
        match plan.removal {
            Some(capture) => println!("Turn {turn}: {mover} plays {} and captures {capture}", plan.action),
            None => println!("Turn {turn}: {mover} plays {}", plan.action),
        }
        println!("{}\n", render_state(engine.state()));
    }

    match engine.result() {
        Some(GameResult::Winner(player)) => println!("{player} wins"),
        Some(GameResult::Draw) => println!("Truce"),
        None => println!("No result after {} turns", cli.max_turns),
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), TrainingError> {
    match &cli.weights {
        Some(path) => {
            let network = MlpNetwork::from_file(path)?;
            play(cli, &network)
        }
        None => play(cli, &UniformPolicyZeroValue),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "play failed");
            ExitCode::FAILURE
        }
    }
}
