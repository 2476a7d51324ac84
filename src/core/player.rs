//! Players, board cells and per-player data storage.
//!
//! ## Player
//!
//! Nine Men's Morris is strictly two-player. `Player::A` always moves first.
//!
//! ## Cell
//!
//! Tri-state board cell: empty or holding one player's piece.
//!
//! ## PlayerMap
//!
//! Fixed-size per-player storage indexed by `Player`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    /// First player, moves at reset.
    A,
    /// Second player.
    B,
}

impl Player {
    /// Both players in turn order.
    pub const ALL: [Player; 2] = [Player::A, Player::B];

    /// The other player.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    /// 0-based index (A = 0, B = 1).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Player::A => 0,
            Player::B => 1,
        }
    }

    /// Signed board value used by outside layers (A = 1, B = -1).
    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Player::A => 1,
            Player::B => -1,
        }
    }

    /// Inverse of [`Player::sign`].
    #[must_use]
    pub const fn from_sign(sign: i8) -> Option<Self> {
        match sign {
            1 => Some(Player::A),
            -1 => Some(Player::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::A => write!(f, "Player A"),
            Player::B => write!(f, "Player B"),
        }
    }
}

/// Contents of a single board position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    PlayerA,
    PlayerB,
}

impl Cell {
    /// The cell occupied by `player`.
    #[must_use]
    pub const fn of(player: Player) -> Self {
        match player {
            Player::A => Cell::PlayerA,
            Player::B => Cell::PlayerB,
        }
    }

    /// Owner of the piece in this cell, if any.
    #[must_use]
    pub const fn owner(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::PlayerA => Some(Player::A),
            Cell::PlayerB => Some(Player::B),
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// True if this cell holds a piece of `player`.
    #[must_use]
    pub fn is_owned_by(self, player: Player) -> bool {
        self.owner() == Some(player)
    }

    /// Signed value (A = 1, B = -1, empty = 0).
    #[must_use]
    pub fn sign(self) -> i8 {
        self.owner().map_or(0, Player::sign)
    }
}

/// Per-player data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use morris_rl::core::{Player, PlayerMap};
///
/// let mut stock: PlayerMap<u8> = PlayerMap::with_value(9);
/// stock[Player::B] -= 1;
/// assert_eq!(stock[Player::A], 9);
/// assert_eq!(stock[Player::B], 8);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: [T; 2],
}

impl<T> PlayerMap<T> {
    /// Create a PlayerMap with values from a factory function.
    pub fn new(factory: impl Fn(Player) -> T) -> Self {
        Self {
            data: [factory(Player::A), factory(Player::B)],
        }
    }

    /// Create a PlayerMap with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(|_| value.clone())
    }

    #[must_use]
    pub fn get(&self, player: Player) -> &T {
        &self.data[player.index()]
    }

    pub fn get_mut(&mut self, player: Player) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over (Player, &T) pairs in turn order.
    pub fn iter(&self) -> impl Iterator<Item = (Player, &T)> {
        Player::ALL.into_iter().zip(self.data.iter())
    }
}

impl<T> Index<Player> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: Player) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<Player> for PlayerMap<T> {
    fn index_mut(&mut self, player: Player) -> &mut Self::Output {
        self.get_mut(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_is_involution() {
        for player in Player::ALL {
            assert_ne!(player.opponent(), player);
            assert_eq!(player.opponent().opponent(), player);
        }
    }

    #[test]
    fn test_sign_round_trip() {
        assert_eq!(Player::from_sign(Player::A.sign()), Some(Player::A));
        assert_eq!(Player::from_sign(Player::B.sign()), Some(Player::B));
        assert_eq!(Player::from_sign(0), None);
    }

    #[test]
    fn test_cell_owner() {
        assert_eq!(Cell::Empty.owner(), None);
        assert_eq!(Cell::of(Player::A).owner(), Some(Player::A));
        assert!(Cell::PlayerB.is_owned_by(Player::B));
        assert!(!Cell::PlayerB.is_owned_by(Player::A));
        assert_eq!(Cell::PlayerB.sign(), -1);
    }

    #[test]
    fn test_player_map_indexing() {
        let mut map = PlayerMap::new(|p| p.index() * 10);
        assert_eq!(map[Player::A], 0);
        assert_eq!(map[Player::B], 10);

        map[Player::A] = 5;
        let collected: Vec<_> = map.iter().map(|(p, v)| (p, *v)).collect();
        assert_eq!(collected, vec![(Player::A, 5), (Player::B, 10)]);
    }
}
