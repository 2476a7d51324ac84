//! Rule violations reported by the engine.

use thiserror::Error;

use crate::core::{Action, Player, Position};

/// Why a move was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveViolation {
    GameOver,
    /// The mover still owes a capture.
    RemovalPending,
    TargetOccupied,
    /// A source was given while the mover is still placing.
    UnexpectedSource,
    /// No source was given after the mover's stock ran out.
    MissingSource,
    SourceNotOwned,
    NotAdjacent,
}

impl std::fmt::Display for MoveViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            MoveViolation::GameOver => "the game is over",
            MoveViolation::RemovalPending => "a removal is pending",
            MoveViolation::TargetOccupied => "target is occupied",
            MoveViolation::UnexpectedSource => "source given during placement",
            MoveViolation::MissingSource => "source required outside placement",
            MoveViolation::SourceNotOwned => "source is not owned by the mover",
            MoveViolation::NotAdjacent => "target is not adjacent to source",
        };
        f.write_str(text)
    }
}

/// Why a removal was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalViolation {
    NotPending,
    NotOpponentPiece,
    /// The piece sits in a mill while unprotected pieces exist.
    ProtectedByMill,
}

impl std::fmt::Display for RemovalViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RemovalViolation::NotPending => "no removal is pending",
            RemovalViolation::NotOpponentPiece => "position does not hold an opponent piece",
            RemovalViolation::ProtectedByMill => "piece is protected by a mill",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("invalid move {action} by {player}: {reason}")]
    InvalidMove {
        player: Player,
        action: Action,
        reason: MoveViolation,
    },

    #[error("invalid removal at {position} by {player}: {reason}")]
    InvalidRemoval {
        player: Player,
        position: Position,
        reason: RemovalViolation,
    },

    #[error("{player} has {on_board} pieces on board with {to_place} still in stock")]
    InconsistentState {
        player: Player,
        on_board: usize,
        to_place: u8,
    },

    #[error("{player} owes a removal but the opponent has no pieces")]
    NothingToRemove { player: Player },
}
