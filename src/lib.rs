//! # morris-rl
//!
//! A Nine Men's Morris rules engine with a self-play reinforcement-learning
//! trainer.
//!
//! ## Design Principles
//!
//! 1. **Validated Mutation**: the live game state changes only through
//!    `MillsEngine::apply` and `apply_removal`, which validate fully before
//!    touching the board. A rejected move leaves no trace.
//!
//! 2. **Pure Queries**: every legality question (`is_mill`,
//!    `would_form_mill`, `is_legal`, `can_remove`) is a side-effect-free
//!    function of `&GameState`.
//!
//! 3. **Black-Box Model**: the trainer and agent only see the
//!    `PolicyValueNetwork` / `TrainableNetwork` contract; `MlpNetwork` is
//!    one implementation.
//!
//! ## Modules
//!
//! - `core`: players, cells, positions, moves, board, deterministic RNG
//! - `rules`: mill lines and adjacency, game state queries, `MillsEngine`
//! - `action_space`: flat 600-way action index and legal masks
//! - `nn`: model contract, observation encoder, burn MLP
//! - `training`: agent, rewards, GAE, loss, trainer
//! - `display`: ASCII board rendering
//! - `python`: pyo3 bindings (feature `python`)

pub mod action_space;
pub mod core;
pub mod display;
pub mod nn;
pub mod rules;
pub mod training;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use crate::core::{Action, Board, Cell, GameRng, Player, PlayerMap, Position, TurnPlan};

pub use crate::rules::{GameResult, GameState, MillsEngine, MoveOutcome, Phase, RuleError};

pub use crate::action_space::{ActionSpace, LegalMask, ACTION_SPACE_SIZE};

pub use crate::nn::{MlpConfig, MlpNetwork, ModelOutput, Observation, PolicyValueNetwork, TrainableNetwork};

pub use crate::training::{RewardConfig, Sampling, SelfPlayAgent, SelfPlayTrainer, TrainerConfig};
