//! The 24-cell board.

use serde::{Deserialize, Serialize};
use std::ops::Index;

use super::action::{Position, BOARD_SIZE};
use super::player::{Cell, Player};

/// Fixed array of 24 tri-state cells.
///
/// Mutation is crate-private; outside layers read snapshots through
/// `MillsEngine::board()` and change the position only via engine calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a board from raw cells.
    #[must_use]
    pub const fn from_cells(cells: [Cell; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    /// Build a board from the pieces each player holds.
    ///
    /// Later entries overwrite earlier ones if a position is listed twice.
    #[must_use]
    pub fn with_pieces(a: &[Position], b: &[Position]) -> Self {
        let mut board = Self::empty();
        for &pos in a {
            board.set(pos, Cell::PlayerA);
        }
        for &pos in b {
            board.set(pos, Cell::PlayerB);
        }
        board
    }

    #[must_use]
    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.index()]
    }

    pub(crate) fn set(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.index()] = cell;
    }

    #[must_use]
    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.get(pos).is_empty()
    }

    /// Number of pieces `player` has on the board.
    #[must_use]
    pub fn count(&self, player: Player) -> usize {
        self.cells.iter().filter(|c| c.is_owned_by(player)).count()
    }

    /// Positions holding a piece of `player`.
    pub fn pieces(&self, player: Player) -> impl Iterator<Item = Position> + '_ {
        Position::all().filter(move |&p| self.get(p).is_owned_by(player))
    }

    /// Empty positions.
    pub fn empty_positions(&self) -> impl Iterator<Item = Position> + '_ {
        Position::all().filter(move |&p| self.is_empty_at(p))
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    /// Signed encoding used by outside layers (A = 1, B = -1, empty = 0).
    #[must_use]
    pub fn to_signed(&self) -> [i8; BOARD_SIZE] {
        self.cells.map(Cell::sign)
    }
}

impl Index<Position> for Board {
    type Output = Cell;

    fn index(&self, pos: Position) -> &Self::Output {
        &self.cells[pos.index()]
    }
}
