//! Episode records and the rollout buffer pooled between updates.
//!
//! Every decision (primary move or capture) is one [`TrajectoryStep`]. Steps
//! keep the raw logits the model produced at sampling time; the loss masks
//! them again with each step's own legal mask.

use serde::{Deserialize, Serialize};

use super::advantage::{compute_gae, normalize_advantages};
use super::loss::masked_log_softmax;
use crate::action_space::LegalMask;
use crate::core::Player;
use crate::nn::Observation;

/// One decision point of an episode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrajectoryStep {
    /// The player who made this decision.
    pub player: Player,
    /// Observation from the deciding player's perspective.
    pub observation: Observation,
    /// Flat action index that was chosen.
    pub action_index: usize,
    /// Unmasked model logits at sampling time.
    pub raw_logits: Vec<f32>,
    /// Value estimate at sampling time.
    pub value: f32,
    /// Shaped reward, plus the terminal bonus on the last step.
    pub reward: f32,
    /// Mask the action was sampled under.
    pub legal_mask: LegalMask,
}

/// How an episode ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeEnd {
    /// A player lost by the rules.
    Terminal,
    /// Both players reached the flying phase.
    Truce,
    /// The mover had an empty legal mask.
    Forfeit,
    /// The engine rejected a chosen action.
    IllegalMove,
    /// The decision limit was reached.
    Truncated,
}

/// A finished episode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Episode {
    pub steps: Vec<TrajectoryStep>,
    pub winner: Option<Player>,
    pub end: EpisodeEnd,
}

impl Episode {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of the rewards credited to `player`.
    pub fn total_reward(&self, player: Player) -> f32 {
        self.steps
            .iter()
            .filter(|s| s.player == player)
            .map(|s| s.reward)
            .sum()
    }
}

/// Flattened training batch built from every buffered episode.
#[derive(Clone, Debug, Default)]
pub struct PooledBatch {
    pub observations: Vec<Observation>,
    pub actions: Vec<usize>,
    pub masks: Vec<LegalMask>,
    /// Normalized jointly across the whole batch.
    pub advantages: Vec<f32>,
    pub returns: Vec<f32>,
    /// Log-probability of each taken action under the sampling-time policy.
    pub old_log_probs: Vec<f32>,
}

impl PooledBatch {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Episodes collected since the last update.
#[derive(Clone, Debug, Default)]
pub struct RolloutBuffer {
    episodes: Vec<Episode>,
}

impl RolloutBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, episode: Episode) {
        self.episodes.push(episode);
    }

    /// Number of buffered episodes.
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Number of buffered steps across all episodes.
    pub fn total_steps(&self) -> usize {
        self.episodes.iter().map(Episode::len).sum()
    }

    pub fn clear(&mut self) {
        self.episodes.clear();
    }

    /// Empty the buffer into one pooled batch.
    ///
    /// GAE runs per episode (the value after each episode's last step is
    /// zero); the concatenated advantages are then normalized once.
    pub fn drain_pooled(&mut self, gamma: f32, lambda: f32) -> PooledBatch {
        let mut batch = PooledBatch::default();

        for episode in self.episodes.drain(..) {
            let rewards: Vec<f32> = episode.steps.iter().map(|s| s.reward).collect();
            let values: Vec<f32> = episode.steps.iter().map(|s| s.value).collect();
            let (advantages, returns) = compute_gae(&rewards, &values, gamma, lambda);
            batch.advantages.extend(advantages);
            batch.returns.extend(returns);

            for step in episode.steps {
                let log_probs = masked_log_softmax(&step.raw_logits, &step.legal_mask);
                batch.old_log_probs.push(log_probs[step.action_index]);
                batch.actions.push(step.action_index);
                batch.observations.push(step.observation);
                batch.masks.push(step.legal_mask);
            }
        }

        normalize_advantages(&mut batch.advantages);
        batch
    }
}
