//! Self-play reinforcement learning.
//!
//! ## Overview
//!
//! - **Agent**: `SelfPlayAgent` samples legal actions from a network and
//!   resolves full turns (move plus chained capture)
//! - **Trajectories**: `TrajectoryStep` per decision, `Episode` per game,
//!   `RolloutBuffer` pooling episodes between updates
//! - **Rewards**: `RewardConfig` shaping terms and the terminal bonus
//! - **Advantages**: backward GAE per episode, normalized across the pool
//! - **Loss**: masked policy gradient with value regression and an entropy
//!   bonus, with analytic output gradients
//! - **Trainer**: `SelfPlayTrainer` ties it together with checkpointing
//!
//! ## Usage
//!
//! ```no_run
//! use morris_rl::nn::{MlpConfig, MlpNetwork};
//! use morris_rl::training::{SelfPlayTrainer, TrainerConfig};
//!
//! let network = MlpNetwork::new(MlpConfig::default());
//! let config = TrainerConfig::default()
//!     .with_num_episodes(1_000)
//!     .with_checkpoint_path("runs/ckpt.bin");
//!
//! let mut trainer = SelfPlayTrainer::new(network, config);
//! let summary = trainer.train()?;
//! println!("{} updates", summary.updates);
//! # Ok::<(), morris_rl::training::TrainingError>(())
//! ```

pub mod advantage;
pub mod agent;
pub mod config;
pub mod loss;
pub mod reward;
pub mod stats;
pub mod trainer;
pub mod trajectory;

pub use advantage::{compute_gae, normalize_advantages, NORMALIZE_EPSILON};
pub use agent::{ActionChoice, AgentError, Sampling, SelfPlayAgent};
pub use config::TrainerConfig;
pub use loss::{masked_log_softmax, masked_logits, masked_softmax, policy_value_loss, LossBreakdown, MASKED_LOGIT};
pub use reward::RewardConfig;
pub use stats::{OutcomeRates, OutcomeWindow};
pub use trainer::{SelfPlayTrainer, TrainingError, TrainingSummary, UpdateStats};
pub use trajectory::{Episode, EpisodeEnd, PooledBatch, RolloutBuffer, TrajectoryStep};
