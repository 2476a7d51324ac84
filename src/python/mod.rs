//! Python bindings for the morris-rl engine and trained policies.
//!
//! These serve the layers that live in Python (board vision, robot
//! actuation): they read the board and push validated moves through the
//! engine.
//!
//! # Quick Start
//!
//! ```python
//! import morris_rl as mr
//!
//! game = mr.MillsGame()
//! policy = mr.MlpPolicy.load("checkpoints/policy_final.bin")
//!
//! source, target, removal = policy.choose_turn(game)
//! if game.apply(source, target):
//!     game.apply_removal(removal)
//! print(game.render())
//! ```

use pyo3::prelude::*;

mod py_core;
mod py_game;
mod py_nn;

pub use py_core::*;
pub use py_game::*;
pub use py_nn::*;

/// morris_rl: Nine Men's Morris engine and self-play policies.
#[pymodule]
fn morris_rl(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyPlayer>()?;
    m.add_class::<PyMillsGame>()?;
    m.add_class::<PyMlpPolicy>()?;

    m.add_function(wrap_pyfunction!(to_index, m)?)?;
    m.add_function(wrap_pyfunction!(from_index, m)?)?;
    m.add_function(wrap_pyfunction!(decode_action, m)?)?;
    m.add("ACTION_SPACE_SIZE", crate::action_space::ACTION_SPACE_SIZE)?;

    Ok(())
}
