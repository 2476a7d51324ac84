//! ASCII rendering of the board.
//!
//! ```text
//! X-----------.-----------.
//! |           |           |
//! |   .-------.-------.   |
//! ...
//! ```
//!
//! `X` is Player A, `O` is Player B, `.` an empty point.

use std::fmt;

use crate::core::{Board, Cell, Player, Position, BOARD_SIZE};
use crate::rules::{GameState, Topology};

const ROWS: usize = 13;
const COLS: usize = 25;

/// Grid coordinates `(row, col)` of each position.
const COORDS: [(usize, usize); BOARD_SIZE] = [
    (0, 0),
    (0, 12),
    (0, 24),
    (2, 4),
    (2, 12),
    (2, 20),
    (4, 8),
    (4, 12),
    (4, 16),
    (6, 0),
    (6, 4),
    (6, 8),
    (6, 16),
    (6, 20),
    (6, 24),
    (8, 8),
    (8, 12),
    (8, 16),
    (10, 4),
    (10, 12),
    (10, 20),
    (12, 0),
    (12, 12),
    (12, 24),
];

fn symbol(cell: Cell) -> char {
    match cell {
        Cell::Empty => '.',
        Cell::PlayerA => 'X',
        Cell::PlayerB => 'O',
    }
}

/// Displays a [`Board`] as a 13-line diagram.
pub struct BoardDisplay<'a>(pub &'a Board);

impl fmt::Display for BoardDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grid = [[' '; COLS]; ROWS];
        let topo = Topology::get();

        for a in Position::all() {
            for &b in topo.neighbours(a) {
                if b <= a {
                    continue;
                }
                let (ra, ca) = COORDS[a.index()];
                let (rb, cb) = COORDS[b.index()];
                if ra == rb {
                    for cell in &mut grid[ra][ca.min(cb) + 1..ca.max(cb)] {
                        *cell = '-';
                    }
                } else {
                    for row in &mut grid[ra.min(rb) + 1..ra.max(rb)] {
                        row[ca] = '|';
                    }
                }
            }
        }
        for pos in Position::all() {
            let (r, c) = COORDS[pos.index()];
            grid[r][c] = symbol(self.0[pos]);
        }

        for (i, row) in grid.iter().enumerate() {
            let line: String = row.iter().collect();
            if i + 1 < ROWS {
                writeln!(f, "{}", line.trim_end())?;
            } else {
                write!(f, "{}", line.trim_end())?;
            }
        }
        Ok(())
    }
}

/// The board followed by stock, phase and turn lines.
#[must_use]
pub fn render_state(state: &GameState) -> String {
    let mut out = BoardDisplay(state.board()).to_string();
    for player in Player::ALL {
        out.push_str(&format!(
            "\n{} ({}): {} on board, {} to place, {:?}",
            player,
            symbol(Cell::of(player)),
            state.pieces_on_board(player),
            state.to_place(player),
            state.phase(player),
        ));
    }
    out.push_str(&format!("\nTo move: {}", state.to_move()));
    if state.removal_pending() {
        out.push_str(" (capture pending)");
    }
    out
}
