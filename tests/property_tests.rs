//! Property tests over random boards and random legal play.

use proptest::prelude::*;

use morris_rl::action_space::{ActionSpace, ACTION_SPACE_SIZE};
use morris_rl::core::{Board, Cell, GameRng, Player, PlayerMap, Position};
use morris_rl::rules::{GameState, MoveOutcome, Phase, MILLS, PIECES_PER_PLAYER};

fn phase_rank(phase: Phase) -> u8 {
    match phase {
        Phase::Placing => 0,
        Phase::Moving => 1,
        Phase::Flying => 2,
    }
}

fn board_strategy() -> impl Strategy<Value = Board> {
    prop::array::uniform24(0u8..3).prop_map(|cells| {
        Board::from_cells(cells.map(|c| match c {
            1 => Cell::PlayerA,
            2 => Cell::PlayerB,
            _ => Cell::Empty,
        }))
    })
}

// ============================================================================
// Mill Detection
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn is_mill_matches_brute_force(board in board_strategy()) {
        let counts = [board.count(Player::A), board.count(Player::B)];
        prop_assume!(counts.iter().all(|&n| n <= PIECES_PER_PLAYER as usize));
        let state = GameState::from_position(board, PlayerMap::with_value(0), Player::A, false).unwrap();

        for pos in Position::all() {
            for player in Player::ALL {
                let expected = MILLS
                    .iter()
                    .filter(|line| line.contains(&pos))
                    .any(|line| line.iter().all(|&p| board[p] == Cell::of(player)));
                prop_assert_eq!(state.is_mill(pos, player), expected);
            }
        }
    }
}

// ============================================================================
// Random Legal Play
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_play_keeps_invariants(seed in any::<u64>(), decisions in 1usize..400) {
        let mut rng = GameRng::new(seed);
        let mut state = GameState::new();
        let mut phases = PlayerMap::with_value(0u8);

        for _ in 0..decisions {
            for player in Player::ALL {
                let on_board = state.pieces_on_board(player);
                prop_assert!(on_board <= usize::from(PIECES_PER_PLAYER - state.to_place(player)));
            }
            if state.is_terminal() {
                break;
            }
            for player in Player::ALL {
                let rank = phase_rank(state.phase(player));
                prop_assert!(rank >= phases[player]);
                phases[player] = rank;
            }

            let mover = state.to_move();
            let pending = state.removal_pending();
            let mask = ActionSpace::legal_mask(&state, mover, pending);
            if mask.is_empty() {
                prop_assert!(!pending);
                prop_assert!(state.has_lost(mover));
                break;
            }

            let legal: Vec<usize> = mask.indices().collect();
            let index = *rng.choose(&legal).unwrap();
            let action = ActionSpace::decode(index).unwrap();

            state = if pending {
                state.after_removal(action.target).unwrap()
            } else {
                let predicted = state.would_form_mill(action.source, action.target, mover);
                let (next, outcome) = state.after_move(action).unwrap();
                prop_assert_eq!(next.is_mill(action.target, mover), predicted);
                if outcome == MoveOutcome::MustRemove {
                    prop_assert!(predicted);
                    prop_assert_eq!(next.to_move(), mover);
                } else {
                    prop_assert_eq!(next.to_move(), mover.opponent());
                }
                next
            };
        }
    }

    #[test]
    fn every_masked_index_is_accepted(seed in any::<u64>(), warmup in 0usize..60) {
        let mut rng = GameRng::new(seed);
        let mut state = GameState::new();
        for _ in 0..warmup {
            if state.is_terminal() {
                break;
            }
            let mask = ActionSpace::legal_mask(&state, state.to_move(), state.removal_pending());
            let legal: Vec<usize> = mask.indices().collect();
            let Some(&index) = rng.choose(&legal) else { break };
            let action = ActionSpace::decode(index).unwrap();
            state = if state.removal_pending() {
                state.after_removal(action.target).unwrap()
            } else {
                state.after_move(action).unwrap().0
            };
        }
        prop_assume!(!state.is_terminal());

        let mover = state.to_move();
        let pending = state.removal_pending();
        let mask = ActionSpace::legal_mask(&state, mover, pending);
        for index in 0..ACTION_SPACE_SIZE {
            let action = ActionSpace::decode(index).unwrap();
            let accepted = if pending {
                action.source.is_none() && state.after_removal(action.target).is_ok()
            } else {
                state.is_legal(action)
            };
            prop_assert_eq!(mask.is_legal(index), accepted, "index {}", index);
        }
    }
}
