//! Game engine bindings for Python.

use numpy::PyArray1;
use pyo3::prelude::*;

use crate::action_space::ActionSpace;
use crate::display::render_state;
use crate::rules::{MillsEngine, MoveOutcome, Phase};

use super::py_core::{action, position, value_error, PyPlayer};

/// Python wrapper for MillsEngine.
///
/// The only way for an outside layer (vision, actuation) to change the
/// board; every call is validated by the rules.
#[pyclass(name = "MillsGame")]
#[derive(Clone)]
pub struct PyMillsGame {
    pub(crate) engine: MillsEngine,
}

#[pymethods]
impl PyMillsGame {
    #[new]
    fn new() -> Self {
        Self {
            engine: MillsEngine::new(),
        }
    }

    /// Start a fresh game.
    fn reset(&mut self) {
        self.engine.reset();
    }

    /// Board snapshot as 24 signs: 1 for A, -1 for B, 0 for empty.
    fn board<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<i8>> {
        PyArray1::from_slice_bound(py, &self.engine.board().to_signed())
    }

    #[getter]
    fn to_move(&self) -> PyPlayer {
        self.engine.state().to_move().into()
    }

    #[getter]
    fn removal_pending(&self) -> bool {
        self.engine.state().removal_pending()
    }

    /// "placing", "moving" or "flying".
    fn phase(&self, player: PyPlayer) -> &'static str {
        match self.engine.phase(player.into()) {
            Phase::Placing => "placing",
            Phase::Moving => "moving",
            Phase::Flying => "flying",
        }
    }

    fn to_place(&self, player: PyPlayer) -> u8 {
        self.engine.state().to_place(player.into())
    }

    /// Legal `(source or None, target)` moves for `player`.
    fn legal_targets(&self, player: PyPlayer) -> Vec<(Option<usize>, usize)> {
        self.engine
            .legal_targets(player.into())
            .into_iter()
            .map(|a| (a.source.map(|s| s.index()), a.target.index()))
            .collect()
    }

    /// Legal mask of length 600 for the player to move.
    fn legal_mask<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<bool>> {
        let state = self.engine.state();
        let mask = ActionSpace::legal_mask(state, state.to_move(), state.removal_pending());
        PyArray1::from_slice_bound(py, mask.as_slice())
    }

    /// Play a move. Returns True if the mover must now capture.
    #[pyo3(signature = (source, target))]
    fn apply(&mut self, source: Option<usize>, target: usize) -> PyResult<bool> {
        let action = action(source, target)?;
        let outcome = self
            .engine
            .apply(action.source, action.target)
            .map_err(value_error)?;
        Ok(outcome == MoveOutcome::MustRemove)
    }

    /// Capture on `position`. Returns the winner if the game ended.
    fn apply_removal(&mut self, pos: usize) -> PyResult<Option<PyPlayer>> {
        let winner = self
            .engine
            .apply_removal(position(pos)?)
            .map_err(value_error)?;
        Ok(winner.map(PyPlayer::from))
    }

    fn is_terminal(&self) -> bool {
        self.engine.is_terminal()
    }

    /// The winner, or None while playing or after a truce.
    fn winner(&self) -> Option<PyPlayer> {
        self.engine.winner().map(PyPlayer::from)
    }

    fn is_mill(&self, pos: usize, player: PyPlayer) -> PyResult<bool> {
        Ok(self.engine.state().is_mill(position(pos)?, player.into()))
    }

    fn render(&self) -> String {
        render_state(self.engine.state())
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn __repr__(&self) -> String {
        let state = self.engine.state();
        format!(
            "MillsGame(to_move={}, removal_pending={}, terminal={})",
            state.to_move(),
            state.removal_pending(),
            state.is_terminal()
        )
    }
}
