//! Static board topology: the 16 mill lines and the adjacency graph.
//!
//! Adjacency is derived from the mill lines: two positions are neighbours
//! exactly when they are consecutive entries of some line. This is the
//! standard Nine Men's Morris graph (each position has 2 to 4 neighbours)
//! and keeps both tables consistent by construction.

use smallvec::SmallVec;
use std::sync::OnceLock;

use crate::core::{Position, BOARD_SIZE};

/// A mill line, listed in board order.
pub type Line = [Position; 3];

const fn line(a: u8, b: u8, c: u8) -> Line {
    [Position::new(a), Position::new(b), Position::new(c)]
}

/// The 16 fixed mill lines: 8 horizontal then 8 vertical.
pub const MILLS: [Line; 16] = [
    line(0, 1, 2),
    line(3, 4, 5),
    line(6, 7, 8),
    line(9, 10, 11),
    line(12, 13, 14),
    line(15, 16, 17),
    line(18, 19, 20),
    line(21, 22, 23),
    line(0, 9, 21),
    line(3, 10, 18),
    line(6, 11, 15),
    line(1, 4, 7),
    line(16, 19, 22),
    line(8, 12, 17),
    line(5, 13, 20),
    line(2, 14, 23),
];

/// Precomputed per-position lookup tables.
#[derive(Debug)]
pub struct Topology {
    neighbours: [SmallVec<[Position; 4]>; BOARD_SIZE],
    lines: [SmallVec<[usize; 2]>; BOARD_SIZE],
}

impl Topology {
    fn build() -> Self {
        let mut neighbours: [SmallVec<[Position; 4]>; BOARD_SIZE] = Default::default();
        let mut lines: [SmallVec<[usize; 2]>; BOARD_SIZE] = Default::default();

        for (id, mill) in MILLS.iter().enumerate() {
            for pos in mill {
                lines[pos.index()].push(id);
            }
            for pair in mill.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                neighbours[a.index()].push(b);
                neighbours[b.index()].push(a);
            }
        }
        for list in &mut neighbours {
            list.sort_unstable();
        }

        Self { neighbours, lines }
    }

    /// The process-wide topology, built on first use.
    pub fn get() -> &'static Topology {
        static TOPOLOGY: OnceLock<Topology> = OnceLock::new();
        TOPOLOGY.get_or_init(Topology::build)
    }

    /// Orthogonal neighbours of `pos`, ascending.
    #[must_use]
    pub fn neighbours(&self, pos: Position) -> &[Position] {
        &self.neighbours[pos.index()]
    }

    #[must_use]
    pub fn are_adjacent(&self, a: Position, b: Position) -> bool {
        self.neighbours(a).contains(&b)
    }

    /// The mill lines through `pos` (always exactly two).
    pub fn lines_through(&self, pos: Position) -> impl Iterator<Item = &'static Line> + '_ {
        self.lines[pos.index()].iter().map(|&id| &MILLS[id])
    }
}

/// Shorthand for `Topology::get().neighbours(pos)`.
#[must_use]
pub fn neighbours(pos: Position) -> &'static [Position] {
    Topology::get().neighbours(pos)
}
