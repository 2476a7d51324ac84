//! Reward shaping for self-play.
//!
//! Shaping terms are credited to the step that triggers them. The terminal
//! bonus goes to the last recorded step once the episode's winner is known.

use serde::{Deserialize, Serialize};

use crate::core::{Action, Player, Position};
use crate::rules::GameState;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Completing a capture.
    pub capture: f32,
    /// Extra when the captured piece was part of an opponent two-in-a-row.
    pub break_almost_mill: f32,
    /// Occupying the open cell of an opponent two-in-a-row.
    pub block: f32,
    /// A non-mill move that raises the mover's two-in-a-row count.
    pub almost_mill: f32,
    /// A move that closes a mill.
    pub mill: f32,
    /// Applied when the engine rejects a chosen action.
    pub illegal_move: f32,
    /// Magnitude of the win/loss bonus on the last step.
    pub terminal: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            capture: 2.0,
            break_almost_mill: 0.5,
            block: 0.7,
            almost_mill: 0.5,
            mill: 1.0,
            illegal_move: -5.0,
            terminal: 10.0,
        }
    }
}

impl RewardConfig {
    /// Reward for a primary move, given the states before and after it.
    #[must_use]
    pub fn move_reward(&self, before: &GameState, after: &GameState, action: Action, mover: Player) -> f32 {
        let mut reward = 0.0;
        if before.blocks_almost_mill(action.target, mover) {
            reward += self.block;
        }
        if after.is_mill(action.target, mover) {
            reward += self.mill;
        } else if after.almost_mills(mover) > before.almost_mills(mover) {
            reward += self.almost_mill;
        }
        reward
    }

    /// Reward for capturing on `position`, judged on the state before removal.
    #[must_use]
    pub fn removal_reward(&self, before: &GameState, position: Position, remover: Player) -> f32 {
        let mut reward = self.capture;
        if before.in_almost_mill(position, remover.opponent()) {
            reward += self.break_almost_mill;
        }
        reward
    }

    /// Terminal bonus for a step played by `player` in a game `winner` won.
    #[must_use]
    pub fn terminal_bonus(&self, player: Player, winner: Player) -> f32 {
        if player == winner {
            self.terminal
        } else {
            -self.terminal
        }
    }
}
