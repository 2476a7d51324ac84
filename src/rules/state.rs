//! Game state and the pure rule queries over it.
//!
//! `GameState` is a small `Copy` value. Every legality question (is this a
//! mill, would this move close one, may this piece be captured, who has
//! lost) is answered by a side-effect-free method, and the two transitions
//! `after_move` / `after_removal` return a fresh successor state instead of
//! mutating. `MillsEngine` is the only owner that commits successors.

use serde::{Deserialize, Serialize};

use super::error::{MoveViolation, RemovalViolation, RuleError};
use super::topology::{Line, Topology, MILLS};
use crate::core::{Action, Board, Cell, Player, PlayerMap, Position};

/// Pieces each player starts with in stock.
pub const PIECES_PER_PLAYER: u8 = 9;

/// A player drops out once fewer than this many pieces remain after placing.
pub const MIN_PIECES: usize = 3;

/// Per-player phase, derived from stock and pieces on board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Placing,
    Moving,
    Flying,
}

/// Result of a successful primary move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// Turn passed to the opponent.
    Ok,
    /// The move closed a mill; the mover must now capture.
    MustRemove,
}

/// Final result of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    Winner(Player),
    /// Both players reduced to flying.
    Draw,
}

impl GameResult {
    #[must_use]
    pub fn is_winner(&self, player: Player) -> bool {
        matches!(self, GameResult::Winner(p) if *p == player)
    }

    #[must_use]
    pub fn winner(&self) -> Option<Player> {
        match self {
            GameResult::Winner(p) => Some(*p),
            GameResult::Draw => None,
        }
    }
}

/// Board, stock counters, side to move and the pending-removal flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    board: Board,
    to_place: PlayerMap<u8>,
    to_move: Player,
    removal_pending: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Empty board, nine pieces in stock each, Player A to move.
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: Board::empty(),
            to_place: PlayerMap::with_value(PIECES_PER_PLAYER),
            to_move: Player::A,
            removal_pending: false,
        }
    }

    /// Build an arbitrary position.
    ///
    /// Rejects stock above nine, more pieces on board than the stock spent
    /// allows, or a pending removal with nothing to capture.
    pub fn from_position(
        board: Board,
        to_place: PlayerMap<u8>,
        to_move: Player,
        removal_pending: bool,
    ) -> Result<Self, RuleError> {
        for player in Player::ALL {
            let stock = to_place[player];
            let on_board = board.count(player);
            if stock > PIECES_PER_PLAYER || on_board > usize::from(PIECES_PER_PLAYER - stock) {
                return Err(RuleError::InconsistentState {
                    player,
                    on_board,
                    to_place: stock,
                });
            }
        }
        if removal_pending && board.count(to_move.opponent()) == 0 {
            return Err(RuleError::NothingToRemove { player: to_move });
        }

        Ok(Self {
            board,
            to_place,
            to_move,
            removal_pending,
        })
    }

    // === Accessors ===

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn to_place(&self, player: Player) -> u8 {
        self.to_place[player]
    }

    /// Player on the move (also the capturer while a removal is pending).
    #[must_use]
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    #[must_use]
    pub fn removal_pending(&self) -> bool {
        self.removal_pending
    }

    #[must_use]
    pub fn pieces_on_board(&self, player: Player) -> usize {
        self.board.count(player)
    }

    #[must_use]
    pub fn phase(&self, player: Player) -> Phase {
        if self.to_place[player] > 0 {
            Phase::Placing
        } else if self.pieces_on_board(player) == MIN_PIECES {
            Phase::Flying
        } else {
            Phase::Moving
        }
    }

    // === Mills ===

    fn line_holds(&self, line: &Line, player: Player) -> bool {
        line.iter().all(|&p| self.board[p].is_owned_by(player))
    }

    /// (pieces of `player`, empty cells) on `line`.
    fn line_counts(&self, line: &Line, player: Player) -> (usize, usize) {
        line.iter().fold((0, 0), |(own, empty), &p| match self.board[p] {
            Cell::Empty => (own, empty + 1),
            cell if cell.is_owned_by(player) => (own + 1, empty),
            _ => (own, empty),
        })
    }

    /// True if `pos` is part of a completed mill of `player`.
    #[must_use]
    pub fn is_mill(&self, pos: Position, player: Player) -> bool {
        Topology::get()
            .lines_through(pos)
            .any(|line| self.line_holds(line, player))
    }

    /// True if `player` moving `source -> target` (or placing on `target`)
    /// would complete a mill through `target`.
    #[must_use]
    pub fn would_form_mill(&self, source: Option<Position>, target: Position, player: Player) -> bool {
        Topology::get().lines_through(target).any(|line| {
            line.iter()
                .filter(|&&p| p != target)
                .all(|&p| Some(p) != source && self.board[p].is_owned_by(player))
        })
    }

    /// Lines where `player` has two pieces and the third cell is empty.
    #[must_use]
    pub fn almost_mills(&self, player: Player) -> usize {
        MILLS
            .iter()
            .filter(|line| self.line_counts(line, player) == (2, 1))
            .count()
    }

    /// True if the piece on `pos` belongs to a two-plus-empty line of `owner`.
    #[must_use]
    pub fn in_almost_mill(&self, pos: Position, owner: Player) -> bool {
        self.board[pos].is_owned_by(owner)
            && Topology::get()
                .lines_through(pos)
                .any(|line| self.line_counts(line, owner) == (2, 1))
    }

    /// True if `target` is the empty cell of a line holding two opponent pieces.
    #[must_use]
    pub fn blocks_almost_mill(&self, target: Position, mover: Player) -> bool {
        let opponent = mover.opponent();
        self.board.is_empty_at(target)
            && Topology::get()
                .lines_through(target)
                .any(|line| self.line_counts(line, opponent) == (2, 1))
    }

    // === Removal ===

    /// Removal eligibility for a capture by `remover`.
    ///
    /// The piece must belong to the opponent, and must not sit in a mill
    /// unless every opponent piece does.
    #[must_use]
    pub fn can_remove(&self, pos: Position, remover: Player) -> bool {
        let opponent = remover.opponent();
        if !self.board[pos].is_owned_by(opponent) {
            return false;
        }
        !self.is_mill(pos, opponent) || self.all_in_mills(opponent)
    }

    fn all_in_mills(&self, player: Player) -> bool {
        self.board.pieces(player).all(|p| self.is_mill(p, player))
    }

    /// Every position `remover` may capture, ascending.
    #[must_use]
    pub fn removable(&self, remover: Player) -> Vec<Position> {
        let opponent = remover.opponent();
        let pieces: Vec<Position> = self.board.pieces(opponent).collect();
        let free: Vec<Position> = pieces
            .iter()
            .copied()
            .filter(|&p| !self.is_mill(p, opponent))
            .collect();
        if free.is_empty() {
            pieces
        } else {
            free
        }
    }

    // === Moves ===

    /// All moves available to `player` in their current phase.
    ///
    /// Ignores whose turn it is and any pending removal.
    #[must_use]
    pub fn legal_targets(&self, player: Player) -> Vec<Action> {
        match self.phase(player) {
            Phase::Placing => self.board.empty_positions().map(Action::place).collect(),
            Phase::Moving => {
                let topo = Topology::get();
                self.board
                    .pieces(player)
                    .flat_map(|s| {
                        topo.neighbours(s)
                            .iter()
                            .filter(|&&t| self.board.is_empty_at(t))
                            .map(move |&t| Action::relocate(s, t))
                    })
                    .collect()
            }
            Phase::Flying => {
                let empty: Vec<Position> = self.board.empty_positions().collect();
                self.board
                    .pieces(player)
                    .flat_map(|s| empty.iter().map(move |&t| Action::relocate(s, t)))
                    .collect()
            }
        }
    }

    /// True if `player` has at least one move in their current phase.
    #[must_use]
    pub fn has_legal_move(&self, player: Player) -> bool {
        match self.phase(player) {
            Phase::Placing | Phase::Flying => self.board.empty_positions().next().is_some(),
            Phase::Moving => {
                let topo = Topology::get();
                self.board.pieces(player).any(|s| {
                    topo.neighbours(s).iter().any(|&t| self.board.is_empty_at(t))
                })
            }
        }
    }

    /// Validate a primary move for the player to move.
    pub fn check_move(&self, action: Action) -> Result<(), RuleError> {
        let player = self.to_move;
        let reject = |reason| RuleError::InvalidMove {
            player,
            action,
            reason,
        };

        if self.is_terminal() {
            return Err(reject(MoveViolation::GameOver));
        }
        if self.removal_pending {
            return Err(reject(MoveViolation::RemovalPending));
        }
        if !self.board.is_empty_at(action.target) {
            return Err(reject(MoveViolation::TargetOccupied));
        }

        match (self.phase(player), action.source) {
            (Phase::Placing, Some(_)) => Err(reject(MoveViolation::UnexpectedSource)),
            (Phase::Placing, None) => Ok(()),
            (_, None) => Err(reject(MoveViolation::MissingSource)),
            (phase, Some(source)) => {
                if !self.board[source].is_owned_by(player) {
                    Err(reject(MoveViolation::SourceNotOwned))
                } else if phase == Phase::Moving
                    && !Topology::get().are_adjacent(source, action.target)
                {
                    Err(reject(MoveViolation::NotAdjacent))
                } else {
                    Ok(())
                }
            }
        }
    }

    #[must_use]
    pub fn is_legal(&self, action: Action) -> bool {
        self.check_move(action).is_ok()
    }

    /// Successor state after the player to move plays `action`.
    pub fn after_move(&self, action: Action) -> Result<(GameState, MoveOutcome), RuleError> {
        self.check_move(action)?;

        let player = self.to_move;
        let opponent = player.opponent();
        let mut next = *self;

        match action.source {
            Some(source) => next.board.set(source, Cell::Empty),
            None => next.to_place[player] -= 1,
        }
        next.board.set(action.target, Cell::of(player));

        if next.is_mill(action.target, player) && next.pieces_on_board(opponent) > 0 {
            next.removal_pending = true;
            Ok((next, MoveOutcome::MustRemove))
        } else {
            next.to_move = opponent;
            Ok((next, MoveOutcome::Ok))
        }
    }

    /// Successor state after the player to move captures on `pos`.
    pub fn after_removal(&self, pos: Position) -> Result<GameState, RuleError> {
        let player = self.to_move;
        let reject = |reason| RuleError::InvalidRemoval {
            player,
            position: pos,
            reason,
        };

        if !self.removal_pending {
            return Err(reject(RemovalViolation::NotPending));
        }
        if !self.board[pos].is_owned_by(player.opponent()) {
            return Err(reject(RemovalViolation::NotOpponentPiece));
        }
        if !self.can_remove(pos, player) {
            return Err(reject(RemovalViolation::ProtectedByMill));
        }

        let mut next = *self;
        next.board.set(pos, Cell::Empty);
        next.removal_pending = false;
        next.to_move = player.opponent();
        Ok(next)
    }

    // === Termination ===

    /// Loss conditions for `player`.
    ///
    /// Fewer than three pieces once placing is over, or (for the player to
    /// move, with no capture owed) no legal destination for any piece.
    #[must_use]
    pub fn has_lost(&self, player: Player) -> bool {
        if self.to_place[player] == 0 && self.pieces_on_board(player) < MIN_PIECES {
            return true;
        }
        player == self.to_move
            && !self.removal_pending
            && self.phase(player) != Phase::Placing
            && !self.has_legal_move(player)
    }

    /// Both players flying with no capture owed.
    #[must_use]
    pub fn is_truce(&self) -> bool {
        !self.removal_pending
            && Player::ALL.iter().all(|&p| self.phase(p) == Phase::Flying)
    }

    /// The game result, if the game is over. Losses take precedence over truce.
    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        let order = [self.to_move, self.to_move.opponent()];
        if let Some(loser) = order.into_iter().find(|&p| self.has_lost(p)) {
            return Some(GameResult::Winner(loser.opponent()));
        }
        self.is_truce().then_some(GameResult::Draw)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.result().is_some()
    }

    /// The winner, if the game ended decisively.
    #[must_use]
    pub fn winner(&self) -> Option<Player> {
        self.result().and_then(|r| r.winner())
    }
}
