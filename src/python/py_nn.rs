//! Trained-policy bindings for Python.

use numpy::PyArray1;
use pyo3::prelude::*;

use crate::core::GameRng;
use crate::nn::{MlpNetwork, PolicyValueNetwork};
use crate::training::{Sampling, SelfPlayAgent};

use super::py_core::value_error;
use super::py_game::PyMillsGame;

/// A trained MLP policy for choosing moves in a live game.
#[pyclass(name = "MlpPolicy")]
pub struct PyMlpPolicy {
    network: MlpNetwork,
    agent: SelfPlayAgent,
}

#[pymethods]
impl PyMlpPolicy {
    /// Load weights or a checkpoint written by the trainer.
    #[staticmethod]
    #[pyo3(signature = (path, seed = 0))]
    fn load(path: std::path::PathBuf, seed: u64) -> PyResult<Self> {
        let network = MlpNetwork::from_file(&path).map_err(value_error)?;
        Ok(Self {
            network,
            agent: SelfPlayAgent::new(GameRng::new(seed)),
        })
    }

    /// Greedy full turn for the player to move as `(source, target, removal)`.
    ///
    /// Returns None if the mover has no legal move.
    fn choose_turn(&mut self, game: &PyMillsGame) -> PyResult<Option<(Option<usize>, usize, Option<usize>)>> {
        let plan = self
            .agent
            .resolve_full_turn(&self.network, game.engine.state(), Sampling::Greedy)
            .map_err(value_error)?;
        Ok(plan.map(|p| {
            (
                p.action.source.map(|s| s.index()),
                p.action.target.index(),
                p.removal.map(|r| r.index()),
            )
        }))
    }

    /// Greedy capture while a removal is pending.
    fn choose_removal(&mut self, game: &PyMillsGame) -> PyResult<Option<usize>> {
        let capture = self
            .agent
            .decide_removal(&self.network, game.engine.state(), Sampling::Greedy)
            .map_err(value_error)?;
        Ok(capture.map(|p| p.index()))
    }

    /// Raw `(logits, value)` for the player to move.
    fn evaluate<'py>(&self, py: Python<'py>, game: &PyMillsGame) -> PyResult<(Bound<'py, PyArray1<f32>>, f32)> {
        let state = game.engine.state();
        let observation = self
            .agent
            .observe(state, state.to_move(), state.removal_pending());
        let output = self.network.forward(&observation).map_err(value_error)?;
        Ok((PyArray1::from_vec_bound(py, output.logits), output.value))
    }

    #[getter]
    fn parameter_count(&self) -> usize {
        self.network.parameter_count()
    }
}
