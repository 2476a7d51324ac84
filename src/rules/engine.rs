//! The live game engine.
//!
//! `MillsEngine` exclusively owns the current [`GameState`]. Outside layers
//! (trainer, vision-based move inference, actuation) read snapshots through
//! [`MillsEngine::state`] / [`MillsEngine::board`] and change the position
//! only through `apply`, `apply_removal` and `apply_turn`. Every call
//! validates first and commits a whole successor state, so a rejected call
//! leaves the engine untouched.
//!
//! ## Example
//!
//! ```
//! use morris_rl::core::{Player, Position};
//! use morris_rl::rules::{MillsEngine, MoveOutcome};
//!
//! let mut engine = MillsEngine::new();
//! engine.apply(None, Position::new(0)).unwrap();
//! engine.apply(None, Position::new(9)).unwrap();
//! engine.apply(None, Position::new(1)).unwrap();
//! engine.apply(None, Position::new(10)).unwrap();
//! let outcome = engine.apply(None, Position::new(2)).unwrap();
//! assert_eq!(outcome, MoveOutcome::MustRemove);
//!
//! engine.apply_removal(Position::new(9)).unwrap();
//! assert_eq!(engine.state().to_move(), Player::B);
//! ```

use tracing::trace;

use super::error::RuleError;
use super::state::{GameResult, GameState, MoveOutcome, Phase};
use crate::core::{Action, Board, Player, Position, TurnPlan};

/// Owner of the live game state.
#[derive(Clone, Debug, Default)]
pub struct MillsEngine {
    state: GameState,
}

impl MillsEngine {
    /// Fresh game: empty board, nine pieces each, Player A to move.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing position.
    #[must_use]
    pub fn from_state(state: GameState) -> Self {
        Self { state }
    }

    /// Discard the current game and start a fresh one.
    pub fn reset(&mut self) -> &GameState {
        self.state = GameState::new();
        &self.state
    }

    /// Read-only snapshot of the live state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Read-only snapshot of the board.
    #[must_use]
    pub fn board(&self) -> &Board {
        self.state.board()
    }

    #[must_use]
    pub fn phase(&self, player: Player) -> Phase {
        self.state.phase(player)
    }

    /// Moves available to `player` in their current phase.
    #[must_use]
    pub fn legal_targets(&self, player: Player) -> Vec<Action> {
        self.state.legal_targets(player)
    }

    /// Play a primary move for the player to move.
    ///
    /// `source` is `None` while placing. On [`MoveOutcome::MustRemove`] the
    /// mover keeps the turn until [`MillsEngine::apply_removal`] succeeds.
    /// A mill closed while the opponent has no piece on the board returns
    /// [`MoveOutcome::Ok`] and passes the turn, since there is nothing to
    /// capture.
    pub fn apply(
        &mut self,
        source: Option<Position>,
        target: Position,
    ) -> Result<MoveOutcome, RuleError> {
        let action = Action { source, target };
        let (next, outcome) = self.state.after_move(action)?;
        trace!(player = %self.state.to_move(), %action, ?outcome, "move applied");
        self.state = next;
        Ok(outcome)
    }

    /// Capture the opponent piece on `position` and pass the turn.
    ///
    /// Returns the winner if the capture ended the game.
    pub fn apply_removal(&mut self, position: Position) -> Result<Option<Player>, RuleError> {
        let next = self.state.after_removal(position)?;
        trace!(player = %self.state.to_move(), %position, "piece removed");
        self.state = next;
        Ok(self.state.winner())
    }

    /// Play a full turn: the primary move and, if it closes a mill, the capture.
    ///
    /// When the move requires a capture but the plan has none, the engine is
    /// left waiting for [`MillsEngine::apply_removal`]. If the capture is
    /// rejected the primary move stays committed and the error is returned.
    pub fn apply_turn(&mut self, plan: &TurnPlan) -> Result<MoveOutcome, RuleError> {
        let outcome = self.apply(plan.action.source, plan.action.target)?;
        if let (MoveOutcome::MustRemove, Some(pos)) = (outcome, plan.removal) {
            self.apply_removal(pos)?;
        }
        Ok(outcome)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The winner, or `None` while playing or after a truce.
    #[must_use]
    pub fn winner(&self) -> Option<Player> {
        self.state.winner()
    }

    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        self.state.result()
    }
}
