//! Value-type bindings and conversions shared by the Python classes.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::action_space::{ActionSpace, NO_SOURCE};
use crate::core::{Action, Player, Position};

/// Python wrapper for Player.
///
/// Python code also accepts the board signs `1` (A) and `-1` (B).
#[pyclass(name = "Player", eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PyPlayer {
    A,
    B,
}

impl From<Player> for PyPlayer {
    fn from(player: Player) -> Self {
        match player {
            Player::A => PyPlayer::A,
            Player::B => PyPlayer::B,
        }
    }
}

impl From<PyPlayer> for Player {
    fn from(player: PyPlayer) -> Self {
        match player {
            PyPlayer::A => Player::A,
            PyPlayer::B => Player::B,
        }
    }
}

#[pymethods]
impl PyPlayer {
    /// Board sign: 1 for A, -1 for B.
    #[getter]
    fn sign(&self) -> i8 {
        Player::from(*self).sign()
    }

    fn opponent(&self) -> Self {
        Player::from(*self).opponent().into()
    }

    #[staticmethod]
    fn from_sign(sign: i8) -> PyResult<Self> {
        player_from_sign(sign).map(Self::from)
    }

    fn __repr__(&self) -> String {
        format!("Player.{self:?}")
    }
}

pub(crate) fn player_from_sign(sign: i8) -> PyResult<Player> {
    Player::from_sign(sign).ok_or_else(|| PyValueError::new_err(format!("invalid player sign {sign}")))
}

pub(crate) fn position(index: usize) -> PyResult<Position> {
    Position::try_new(index).ok_or_else(|| PyValueError::new_err(format!("position {index} out of range")))
}

pub(crate) fn action(source: Option<usize>, target: usize) -> PyResult<Action> {
    Ok(Action {
        source: source.map(position).transpose()?,
        target: position(target)?,
    })
}

pub(crate) fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Flat index of `(source, target)`; source 24 means no source.
#[pyfunction]
pub fn to_index(source: usize, target: usize) -> PyResult<usize> {
    ActionSpace::to_index(source, target).map_err(value_error)
}

/// `(source, target)` of a flat index.
#[pyfunction]
pub fn from_index(index: usize) -> PyResult<(usize, usize)> {
    ActionSpace::from_index(index).map_err(value_error)
}

/// Decode a flat index into `(source or None, target)`.
#[pyfunction]
pub fn decode_action(index: usize) -> PyResult<(Option<usize>, usize)> {
    let (source, target) = from_index(index)?;
    Ok(((source != NO_SOURCE).then_some(source), target))
}
