//! Nine Men's Morris rules.
//!
//! - `topology`: the 16 mill lines and the adjacency graph derived from them
//! - `state`: `GameState` with every legality query as a pure method
//! - `engine`: `MillsEngine`, the single owner that commits state changes
//! - `error`: `RuleError` with the reason each move or removal was refused
//!
//! ## Turn structure
//!
//! A move that does not close a mill passes the turn immediately. A move that
//! closes a mill (with at least one opponent piece on the board) leaves the
//! mover on turn with a pending removal; the turn passes once the removal
//! succeeds.

pub mod engine;
pub mod error;
pub mod state;
pub mod topology;

pub use engine::MillsEngine;
pub use error::{MoveViolation, RemovalViolation, RuleError};
pub use state::{GameResult, GameState, MoveOutcome, Phase, MIN_PIECES, PIECES_PER_PLAYER};
pub use topology::{neighbours, Line, Topology, MILLS};
