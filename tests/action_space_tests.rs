//! Integration tests for the flat action space.

use morris_rl::action_space::{ActionSpace, ActionSpaceError, ACTION_SPACE_SIZE, NO_SOURCE, NUM_SOURCES};
use morris_rl::core::{Action, Board, Player, PlayerMap, Position, BOARD_SIZE};
use morris_rl::rules::{neighbours, GameState};

// =============================================================================
// Index Bijection
// =============================================================================

#[test]
fn test_index_round_trip_over_domain() {
    let mut seen = vec![false; ACTION_SPACE_SIZE];
    for source in 0..NUM_SOURCES {
        for target in 0..BOARD_SIZE {
            let index = ActionSpace::to_index(source, target).unwrap();
            assert_eq!(index, source * 24 + target);
            assert!(!seen[index], "index {index} produced twice");
            seen[index] = true;
            assert_eq!(ActionSpace::from_index(index).unwrap(), (source, target));
        }
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn test_out_of_domain_fails() {
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
    assert!(ActionSpace::decode(usize::MAX).is_err());
}

#[test]
fn test_encode_decode_actions() {
    let place = Action::place(Position::new(7));
    assert_eq!(ActionSpace::encode(place), NO_SOURCE * 24 + 7);
    assert_eq!(ActionSpace::decode(NO_SOURCE * 24 + 7).unwrap(), place);

    let slide = Action::relocate(Position::new(4), Position::new(5));
    assert_eq!(ActionSpace::encode(slide), 4 * 24 + 5);
    assert_eq!(ActionSpace::decode(4 * 24 + 5).unwrap(), slide);
}

// =============================================================================
// Legal Masks
// =============================================================================

#[test]
fn test_placing_mask_covers_empty_cells() {
    let board = Board::with_pieces(&[Position::new(0)], &[Position::new(9)]);
    let state = GameState::from_position(board, PlayerMap::with_value(8), Player::A, false).unwrap();
    let mask = ActionSpace::legal_mask(&state, Player::A, false);

    assert_eq!(mask.count(), 22);
    assert!(!mask.is_legal(NO_SOURCE * 24));
    assert!(!mask.is_legal(NO_SOURCE * 24 + 9));
    assert!(mask.is_legal(NO_SOURCE * 24 + 1));
    assert!(mask.indices().all(|i| i / 24 == NO_SOURCE));
}

#[test]
fn test_moving_mask_follows_adjacency() {
    let a: Vec<Position> = [0u8, 4, 10, 16].iter().map(|&i| Position::new(i)).collect();
    let b: Vec<Position> = [1u8, 9, 19, 22].iter().map(|&i| Position::new(i)).collect();
    let state = GameState::from_position(Board::with_pieces(&a, &b), PlayerMap::with_value(0), Player::A, false)
        .unwrap();
    let mask = ActionSpace::legal_mask(&state, Player::A, false);

    let mut expected = Vec::new();
    for &s in &a {
        for &t in neighbours(s) {
            if state.board().is_empty_at(t) {
                expected.push(ActionSpace::encode(Action::relocate(s, t)));
            }
        }
    }
    expected.sort_unstable();
    assert_eq!(mask.indices().collect::<Vec<_>>(), expected);
}

#[test]
fn test_mask_matches_legal_targets() {
    let a: Vec<Position> = [0u8, 4, 22].iter().map(|&i| Position::new(i)).collect();
    let b: Vec<Position> = [5u8, 6, 7, 8].iter().map(|&i| Position::new(i)).collect();
    let state = GameState::from_position(Board::with_pieces(&a, &b), PlayerMap::with_value(0), Player::A, false)
        .unwrap();

    let mask = ActionSpace::legal_mask(&state, Player::A, false);
    let mut from_targets: Vec<usize> = state
        .legal_targets(Player::A)
        .into_iter()
        .map(ActionSpace::encode)
        .collect();
    from_targets.sort_unstable();
    assert_eq!(mask.indices().collect::<Vec<_>>(), from_targets);
    assert_eq!(mask.count(), 3 * 17);
}
