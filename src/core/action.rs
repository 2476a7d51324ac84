//! Board positions, moves and composite turns.
//!
//! ## Position
//!
//! One of the 24 intersections of the board, numbered row by row from the
//! outer top-left corner:
//!
//! ```text
//! 0 --------- 1 --------- 2
//! |   3 ----- 4 ----- 5   |
//! |   |   6 - 7 - 8   |   |
//! 9 - 10- 11      12- 13- 14
//! |   |   15- 16- 17  |   |
//! |   18 ---- 19 ---- 20  |
//! 21 -------- 22 -------- 23
//! ```
//!
//! ## Action
//!
//! A `(source, target)` pair. `source` is `None` for placements and for the
//! removal sub-decision that follows a mill.
//!
//! ## TurnPlan
//!
//! A full turn as produced by an agent: the primary move plus the chained
//! removal target when the move closes a mill.

use serde::{Deserialize, Serialize};

/// Number of board positions.
pub const BOARD_SIZE: usize = 24;

/// A validated board position in `0..24`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position(u8);

impl Position {
    /// Create a position.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 24`. Use [`Position::try_new`] for untrusted input.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        assert!((index as usize) < BOARD_SIZE, "position out of range");
        Self(index)
    }

    /// Create a position from an untrusted index.
    #[must_use]
    pub fn try_new(index: usize) -> Option<Self> {
        (index < BOARD_SIZE).then(|| Self(index as u8))
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// All 24 positions in index order.
    pub fn all() -> impl Iterator<Item = Position> + Clone {
        (0..BOARD_SIZE as u8).map(Self)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single move or removal choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub source: Option<Position>,
    pub target: Position,
}

impl Action {
    /// Place a piece from stock (also used for removal choices).
    #[must_use]
    pub const fn place(target: Position) -> Self {
        Self { source: None, target }
    }

    /// Move (or fly) the piece on `source` to `target`.
    #[must_use]
    pub const fn relocate(source: Position, target: Position) -> Self {
        Self {
            source: Some(source),
            target,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.source {
            Some(source) => write!(f, "{source}->{}", self.target),
            None => write!(f, "@{}", self.target),
        }
    }
}

/// A complete turn: primary move plus optional capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnPlan {
    pub action: Action,
    pub removal: Option<Position>,
}

impl TurnPlan {
    #[must_use]
    pub const fn new(action: Action, removal: Option<Position>) -> Self {
        Self { action, removal }
    }
}
