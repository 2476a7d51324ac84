//! Flat action-index encoding and legality masks.
//!
//! Every decision (placement, slide, flight or capture) is a `(source,
//! target)` pair mapped onto `0..600` as `source * 24 + target`, where
//! `source == 24` means "no source" (placement or capture).
//!
//! ```
//! use morris_rl::action_space::{ActionSpace, NO_SOURCE};
//!
//! let idx = ActionSpace::to_index(NO_SOURCE, 5).unwrap();
//! assert_eq!(idx, 581);
//! assert_eq!(ActionSpace::from_index(idx).unwrap(), (NO_SOURCE, 5));
//! ```

mod mask;

pub use mask::LegalMask;

use thiserror::Error;

use crate::core::{Action, Player, Position, BOARD_SIZE};
use crate::rules::{GameState, Phase, Topology};

/// Source slot meaning "no source piece".
pub const NO_SOURCE: usize = BOARD_SIZE;

/// Number of source slots (24 positions plus [`NO_SOURCE`]).
pub const NUM_SOURCES: usize = BOARD_SIZE + 1;

/// Size of the flat action space.
pub const ACTION_SPACE_SIZE: usize = NUM_SOURCES * BOARD_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ActionSpaceError {
    #[error("source {0} outside 0..=24")]
    SourceOutOfRange(usize),

    #[error("target {0} outside 0..24")]
    TargetOutOfRange(usize),

    #[error("action index {0} outside 0..600")]
    IndexOutOfRange(usize),
}

/// Bijection between moves and action indices.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActionSpace;

impl ActionSpace {
    /// `source * 24 + target`.
    pub fn to_index(source: usize, target: usize) -> Result<usize, ActionSpaceError> {
        if source > NO_SOURCE {
            return Err(ActionSpaceError::SourceOutOfRange(source));
        }
        if target >= BOARD_SIZE {
            return Err(ActionSpaceError::TargetOutOfRange(target));
        }
        Ok(source * BOARD_SIZE + target)
    }

    /// Inverse of [`ActionSpace::to_index`].
    pub fn from_index(index: usize) -> Result<(usize, usize), ActionSpaceError> {
        if index >= ACTION_SPACE_SIZE {
            return Err(ActionSpaceError::IndexOutOfRange(index));
        }
        Ok((index / BOARD_SIZE, index % BOARD_SIZE))
    }

    /// Index of a typed action. Infallible since `Position` is always valid.
    #[must_use]
    pub fn encode(action: Action) -> usize {
        let source = action.source.map_or(NO_SOURCE, Position::index);
        source * BOARD_SIZE + action.target.index()
    }

    /// Typed action for an index.
    pub fn decode(index: usize) -> Result<Action, ActionSpaceError> {
        let (source, target) = Self::from_index(index)?;
        let target = Position::try_new(target).ok_or(ActionSpaceError::TargetOutOfRange(target))?;
        Ok(Action {
            source: Position::try_new(source),
            target,
        })
    }

    /// Legal decisions for `player`.
    ///
    /// With `removal_pending` only eligible captures are set; otherwise the
    /// moves of the player's phase.
    #[must_use]
    pub fn legal_mask(state: &GameState, player: Player, removal_pending: bool) -> LegalMask {
        let mut mask = LegalMask::none();
        let board = state.board();

        if removal_pending {
            for pos in state.removable(player) {
                mask.allow(NO_SOURCE, pos.index());
            }
            return mask;
        }

        match state.phase(player) {
            Phase::Placing => {
                for t in board.empty_positions() {
                    mask.allow(NO_SOURCE, t.index());
                }
            }
            Phase::Moving => {
                let topo = Topology::get();
                for s in board.pieces(player) {
                    for &t in topo.neighbours(s) {
                        if board.is_empty_at(t) {
                            mask.allow(s.index(), t.index());
                        }
                    }
                }
            }
            Phase::Flying => {
                for s in board.pieces(player) {
                    for t in board.empty_positions() {
                        mask.allow(s.index(), t.index());
                    }
                }
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Board, PlayerMap};

    #[test]
    fn test_index_bounds() {
        assert_eq!(ActionSpace::to_index(0, 0), Ok(0));
        assert_eq!(ActionSpace::to_index(NO_SOURCE, 23), Ok(ACTION_SPACE_SIZE - 1));
        assert_eq!(
            ActionSpace::to_index(25, 0),
            Err(ActionSpaceError::SourceOutOfRange(25))
        );
        assert_eq!(
            ActionSpace::to_index(0, 24),
            Err(ActionSpaceError::TargetOutOfRange(24))
        );
        assert_eq!(
            ActionSpace::from_index(600),
            Err(ActionSpaceError::IndexOutOfRange(600))
        );
    }

    #[test]
    fn test_encode_decode_typed() {
        let slide = Action::relocate(Position::new(4), Position::new(7));
        let idx = ActionSpace::encode(slide);
        assert_eq!(idx, 4 * 24 + 7);
        assert_eq!(ActionSpace::decode(idx), Ok(slide));

        let place = Action::place(Position::new(0));
        assert_eq!(ActionSpace::decode(ActionSpace::encode(place)), Ok(place));
    }

    #[test]
    fn test_initial_mask_is_all_placements() {
        let mask = ActionSpace::legal_mask(&GameState::new(), Player::A, false);
        assert_eq!(mask.count(), 24);
        assert!(mask.indices().all(|i| i >= NO_SOURCE * BOARD_SIZE));
    }

    #[test]
    fn test_moving_mask_uses_adjacency() {
        let board = Board::with_pieces(
            &[Position::new(0), Position::new(4), Position::new(12), Position::new(22)],
            &[Position::new(1), Position::new(9)],
        );
        let state = GameState::from_position(board, PlayerMap::with_value(0), Player::A, false)
            .unwrap();
        let mask = ActionSpace::legal_mask(&state, Player::A, false);

        // 0 is walled in by 1 and 9
        assert!(!(0..BOARD_SIZE).any(|t| mask.is_legal(ActionSpace::to_index(0, t).unwrap())));
        assert!(mask.is_legal(ActionSpace::to_index(4, 3).unwrap()));
        assert!(mask.is_legal(ActionSpace::to_index(4, 7).unwrap()));
        assert!(!mask.is_legal(ActionSpace::to_index(4, 1).unwrap()));
        assert!(!mask.is_legal(ActionSpace::to_index(4, 6).unwrap()));
    }
}
