//! Core value types: players, cells, positions, moves, the board and RNG.
//!
//! Nothing in here knows the rules of the game; `rules` builds on these.

pub mod action;
pub mod board;
pub mod player;
pub mod rng;

pub use action::{Action, Position, TurnPlan, BOARD_SIZE};
pub use board::Board;
pub use player::{Cell, Player, PlayerMap};
pub use rng::{GameRng, GameRngState};
