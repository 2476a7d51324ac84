//! State encoding for network input.
//!
//! ## Board encoding (`[3, 24]`)
//!
//! Channel 0 marks the perspective player's pieces, channel 1 the
//! opponent's, channel 2 the empty cells.
//!
//! ## Global features (`[11]`)
//!
//! | idx | feature                                   |
//! |-----|-------------------------------------------|
//! | 0   | own stock / 9                             |
//! | 1   | opponent stock / 9                        |
//! | 2   | own pieces on board / 9                   |
//! | 3   | opponent pieces on board / 9              |
//! | 4-6 | own phase one-hot (placing, moving, flying)|
//! | 7   | opponent is flying                        |
//! | 8   | perspective is Player A                   |
//! | 9   | removal pending                           |
//! | 10  | own two-in-a-row lines / 16               |

use super::traits::{EncodedState, Observation, BOARD_CHANNELS, GLOBAL_FEATURES};
use crate::action_space::ACTION_SPACE_SIZE;
use crate::core::{Cell, Player, BOARD_SIZE};
use crate::rules::{GameState, Phase, MILLS, PIECES_PER_PLAYER};

/// Encodes a game state from one player's perspective.
pub trait StateEncoder: Send + Sync {
    fn encode(&self, state: &GameState, perspective: Player, removal_pending: bool) -> Observation;

    /// Size of the policy output the encoding is paired with.
    fn action_space_size(&self) -> usize {
        ACTION_SPACE_SIZE
    }
}

/// The standard own/opponent/empty encoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct MillsEncoder;

impl StateEncoder for MillsEncoder {
    fn encode(&self, state: &GameState, perspective: Player, removal_pending: bool) -> Observation {
        let opponent = perspective.opponent();
        let mut board = EncodedState::zeros(vec![BOARD_CHANNELS, BOARD_SIZE]);

        for (i, &cell) in state.board().cells().iter().enumerate() {
            let channel = match cell {
                Cell::Empty => 2,
                c if c.is_owned_by(perspective) => 0,
                _ => 1,
            };
            board.set(channel * BOARD_SIZE + i, 1.0);
        }

        let stock = f32::from(PIECES_PER_PLAYER);
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let own_phase = state.phase(perspective);

        let globals = vec![
            f32::from(state.to_place(perspective)) / stock,
            f32::from(state.to_place(opponent)) / stock,
            state.pieces_on_board(perspective) as f32 / stock,
            state.pieces_on_board(opponent) as f32 / stock,
            flag(own_phase == Phase::Placing),
            flag(own_phase == Phase::Moving),
            flag(own_phase == Phase::Flying),
            flag(state.phase(opponent) == Phase::Flying),
            flag(perspective == Player::A),
            flag(removal_pending),
            state.almost_mills(perspective) as f32 / MILLS.len() as f32,
        ];

        Observation {
            board,
            globals: EncodedState::new(globals, vec![GLOBAL_FEATURES]),
        }
    }
}
