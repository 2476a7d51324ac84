//! Self-play policy-gradient training loop.
//!
//! One episode is played at a time against a single live [`MillsEngine`],
//! with both sides sampled from the same network. Every
//! `episodes_per_update` episodes the buffered steps are pooled, advantages
//! are estimated and normalized, and the network takes one optimizer step.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::agent::{AgentError, SelfPlayAgent};
use super::config::TrainerConfig;
use super::loss::{policy_value_loss, LossBreakdown};
use super::stats::{OutcomeRates, OutcomeWindow};
use super::trajectory::{Episode, EpisodeEnd, RolloutBuffer, TrajectoryStep};
use crate::action_space::ActionSpace;
use crate::core::GameRng;
use crate::nn::{MillsEncoder, ModelError, StateEncoder, TrainableNetwork};
use crate::rules::{GameResult, MillsEngine};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Diagnostics from one optimizer step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateStats {
    pub loss: LossBreakdown,
    /// Global gradient norm before clipping.
    pub grad_norm: f32,
    /// Steps in the pooled batch.
    pub steps: usize,
    /// Episodes in the pooled batch.
    pub episodes: usize,
}

/// What a call to [`SelfPlayTrainer::train`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingSummary {
    /// Episode counter at the end, including resumed episodes.
    pub episodes: u64,
    pub updates: usize,
    pub last_update: Option<UpdateStats>,
    pub outcomes: OutcomeRates,
}

/// Drives self-play episodes and updates the network.
pub struct SelfPlayTrainer<N: TrainableNetwork, E: StateEncoder = MillsEncoder> {
    network: N,
    agent: SelfPlayAgent<E>,
    config: TrainerConfig,
    buffer: RolloutBuffer,
    outcomes: OutcomeWindow,
    episodes_completed: u64,
}

impl<N: TrainableNetwork> SelfPlayTrainer<N, MillsEncoder> {
    pub fn new(network: N, config: TrainerConfig) -> Self {
        Self::with_encoder(network, MillsEncoder, config)
    }
}

impl<N: TrainableNetwork, E: StateEncoder> SelfPlayTrainer<N, E> {
    pub fn with_encoder(network: N, encoder: E, config: TrainerConfig) -> Self {
        let agent = SelfPlayAgent::with_encoder(encoder, GameRng::new(config.seed));
        let outcomes = OutcomeWindow::new(config.stats_window);
        Self {
            network,
            agent,
            config,
            buffer: RolloutBuffer::new(),
            outcomes,
            episodes_completed: 0,
        }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn into_network(self) -> N {
        self.network
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn episodes_completed(&self) -> u64 {
        self.episodes_completed
    }

    pub fn outcomes(&self) -> &OutcomeWindow {
        &self.outcomes
    }

    /// Episodes waiting for the next update.
    pub fn buffered_episodes(&self) -> usize {
        self.buffer.len()
    }

    /// Play one self-play episode to its end.
    ///
    /// An empty mask forfeits the game to the opponent. An action the engine
    /// rejects costs the mover the illegal-move penalty and the game. Model
    /// contract violations abort the episode with an error.
    pub fn collect_episode(&mut self) -> Result<Episode, TrainingError> {
        let mut engine = MillsEngine::new();
        let mut steps: Vec<TrajectoryStep> = Vec::new();
        let rewards = self.config.rewards.clone();
        let (temperature, epsilon) = (self.config.temperature, self.config.epsilon);

        let (winner, end) = loop {
            let before = *engine.state();
            match before.result() {
                Some(GameResult::Winner(p)) => break (Some(p), EpisodeEnd::Terminal),
                Some(GameResult::Draw) => break (None, EpisodeEnd::Truce),
                None => {}
            }
            if self.config.max_decisions > 0 && steps.len() >= self.config.max_decisions {
                break (None, EpisodeEnd::Truncated);
            }

            let mover = before.to_move();
            let pending = before.removal_pending();
            let mask = ActionSpace::legal_mask(&before, mover, pending);
            if mask.is_empty() {
                break (Some(mover.opponent()), EpisodeEnd::Forfeit);
            }

            let observation = self.agent.observe(&before, mover, pending);
            let choice = match self.agent.select_action(
                &self.network,
                &observation,
                &mask,
                temperature,
                epsilon,
            ) {
                Ok(choice) => choice,
                Err(AgentError::NoLegalAction) => break (Some(mover.opponent()), EpisodeEnd::Forfeit),
                Err(err) => return Err(err.into()),
            };
            let action = ActionSpace::decode(choice.index).map_err(AgentError::from)?;

            let applied = if pending {
                engine
                    .apply_removal(action.target)
                    .map(|_| rewards.removal_reward(&before, action.target, mover))
            } else {
                engine
                    .apply(action.source, action.target)
                    .map(|_| rewards.move_reward(&before, engine.state(), action, mover))
            };

            let mut step = TrajectoryStep {
                player: mover,
                observation,
                action_index: choice.index,
                raw_logits: choice.logits,
                value: choice.value,
                reward: 0.0,
                legal_mask: mask,
            };
            match applied {
                Ok(reward) => {
                    step.reward = reward;
                    steps.push(step);
                }
                Err(err) => {
                    warn!(player = %mover, %action, error = %err, "engine rejected action; forfeiting");
                    step.reward = rewards.illegal_move;
                    steps.push(step);
                    break (Some(mover.opponent()), EpisodeEnd::IllegalMove);
                }
            }
        };

        if let (Some(winner), Some(last)) = (winner, steps.last_mut()) {
            last.reward += rewards.terminal_bonus(last.player, winner);
        }

        self.outcomes.record(winner);
        self.episodes_completed += 1;
        debug!(
            episode = self.episodes_completed,
            decisions = steps.len(),
            ?winner,
            ?end,
            "episode finished"
        );
        Ok(Episode { steps, winner, end })
    }

    /// Pool the buffered episodes and take one optimizer step.
    ///
    /// Returns `None` if nothing was buffered.
    pub fn update(&mut self) -> Result<Option<UpdateStats>, TrainingError> {
        let episodes = self.buffer.len();
        let batch = self.buffer.drain_pooled(self.config.gamma, self.config.gae_lambda);
        if batch.is_empty() {
            return Ok(None);
        }

        let outputs = self.network.forward_train(&batch.observations)?;
        for output in &outputs {
            output.validate()?;
        }
        let (loss, grads) = policy_value_loss(
            &outputs,
            &batch,
            self.config.value_coef,
            self.config.entropy_coef,
        );
        let grad_norm = self.network.backward_and_step(&grads, self.config.max_grad_norm)?;

        Ok(Some(UpdateStats {
            loss,
            grad_norm,
            steps: batch.len(),
            episodes,
        }))
    }

    /// Train until the episode counter reaches `num_episodes`.
    ///
    /// Episodes left over after the last full update batch are discarded.
    /// The final weights are written even when no episode was played.
    pub fn train(&mut self) -> Result<TrainingSummary, TrainingError> {
        self.config.validate()?;
        info!(
            start = self.episodes_completed,
            target = self.config.num_episodes,
            per_update = self.config.episodes_per_update,
            "starting self-play training"
        );

        let mut updates = 0;
        let mut last_update = None;

        while self.episodes_completed < self.config.num_episodes {
            let episode = self.collect_episode()?;
            self.buffer.push(episode);

            if self.buffer.len() >= self.config.episodes_per_update {
                if let Some(stats) = self.update()? {
                    updates += 1;
                    let rates = self.outcomes.rates();
                    info!(
                        episode = self.episodes_completed,
                        loss = stats.loss.total,
                        policy_loss = stats.loss.policy,
                        value_loss = stats.loss.value,
                        entropy = stats.loss.entropy,
                        approx_kl = stats.loss.approx_kl,
                        grad_norm = stats.grad_norm,
                        steps = stats.steps,
                        win_a = rates.player_a,
                        win_b = rates.player_b,
                        draws = rates.draws,
                        "update"
                    );
                    last_update = Some(stats);
                }
            }

            if self.config.save_every > 0 && self.episodes_completed % self.config.save_every == 0 {
                self.save_checkpoint()?;
            }
        }

        if !self.buffer.is_empty() {
            debug!(episodes = self.buffer.len(), "discarding partial update batch");
            self.buffer.clear();
        }

        self.network.save_weights(&self.config.final_weights_path)?;
        info!(path = %self.config.final_weights_path.display(), "saved final weights");

        Ok(TrainingSummary {
            episodes: self.episodes_completed,
            updates,
            last_update,
            outcomes: self.outcomes.rates(),
        })
    }

    /// Write model, optimizer and episode counter to the checkpoint path.
    pub fn save_checkpoint(&self) -> Result<(), TrainingError> {
        self.network
            .save_checkpoint(&self.config.checkpoint_path, self.episodes_completed)?;
        info!(
            episode = self.episodes_completed,
            path = %self.config.checkpoint_path.display(),
            "saved checkpoint"
        );
        Ok(())
    }

    /// Restore from a resumable checkpoint and continue after its episode.
    pub fn resume(&mut self, path: &Path) -> Result<u64, TrainingError> {
        let episode = self.network.load_checkpoint(path)?;
        self.episodes_completed = episode;
        self.buffer.clear();
        self.agent
            .reseed(GameRng::new(self.config.seed.wrapping_add(episode)));
        info!(episode, path = %path.display(), "resumed from checkpoint");
        Ok(episode)
    }
}
