//! Trainer configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::reward::RewardConfig;
use super::trainer::TrainingError;

/// Configuration for self-play training.
///
/// Every field has a default, so a JSON file only needs the fields it
/// changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Total episodes to play, counting any resumed from a checkpoint.
    pub num_episodes: u64,

    /// Episodes pooled into each update.
    pub episodes_per_update: usize,

    /// Softmax temperature for sampling.
    pub temperature: f32,

    /// Probability of a uniformly random legal action.
    pub epsilon: f64,

    /// Write a resumable checkpoint every this many episodes (0 = never).
    pub save_every: u64,

    pub checkpoint_path: PathBuf,

    /// Weights-only file written when training ends.
    pub final_weights_path: PathBuf,

    /// Discount factor.
    pub gamma: f32,

    /// GAE lambda.
    pub gae_lambda: f32,

    pub entropy_coef: f32,

    pub value_coef: f32,

    /// Global gradient-norm clip (0 disables clipping).
    pub max_grad_norm: f32,

    /// Decisions after which an episode is truncated (0 = unlimited).
    pub max_decisions: usize,

    /// Seed for the sampling RNG.
    pub seed: u64,

    /// Episodes in the rolling outcome statistics.
    pub stats_window: usize,

    pub rewards: RewardConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_episodes: 50_000,
            episodes_per_update: 20,
            temperature: 1.0,
            epsilon: 0.2,
            save_every: 500,
            checkpoint_path: PathBuf::from("checkpoints/policy_checkpoint.bin"),
            final_weights_path: PathBuf::from("checkpoints/policy_final.bin"),
            gamma: 0.99,
            gae_lambda: 0.95,
            entropy_coef: 0.01,
            value_coef: 0.5,
            max_grad_norm: 0.5,
            max_decisions: 0,
            seed: 0,
            stats_window: 100,
            rewards: RewardConfig::default(),
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, TrainingError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_num_episodes(mut self, episodes: u64) -> Self {
        self.num_episodes = episodes;
        self
    }

    pub fn with_episodes_per_update(mut self, episodes: usize) -> Self {
        self.episodes_per_update = episodes;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_save_every(mut self, episodes: u64) -> Self {
        self.save_every = episodes;
        self
    }

    pub fn with_checkpoint_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = path.into();
        self
    }

    pub fn with_final_weights_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.final_weights_path = path.into();
        self
    }

    pub fn with_max_decisions(mut self, decisions: usize) -> Self {
        self.max_decisions = decisions;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_rewards(mut self, rewards: RewardConfig) -> Self {
        self.rewards = rewards;
        self
    }

    /// Reject values the trainer cannot run with.
    pub fn validate(&self) -> Result<(), TrainingError> {
        let fail = |msg: &str| Err(TrainingError::Config(msg.to_string()));
        if self.episodes_per_update == 0 {
            return fail("episodes_per_update must be at least 1");
        }
        if !(self.temperature.is_finite() && self.temperature >= 0.0) {
            return fail("temperature must be finite and non-negative");
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return fail("epsilon must lie in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.gamma) || !(0.0..=1.0).contains(&self.gae_lambda) {
            return fail("gamma and gae_lambda must lie in [0, 1]");
        }
        if self.value_coef < 0.0 || self.entropy_coef < 0.0 || self.max_grad_norm < 0.0 {
            return fail("loss coefficients and max_grad_norm must be non-negative");
        }
        Ok(())
    }
}
