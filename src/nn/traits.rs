//! Model contract between the self-play loop and a policy/value network.
//!
//! The trainer and agent only ever see [`PolicyValueNetwork`] (inference)
//! and [`TrainableNetwork`] (batched update). Any architecture that maps an
//! [`Observation`] to 600 logits and a value in `[-1, 1]` is acceptable.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::action_space::ACTION_SPACE_SIZE;

/// Board channels: own, opponent, empty.
pub const BOARD_CHANNELS: usize = 3;

/// Length of the global feature vector.
pub const GLOBAL_FEATURES: usize = 11;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model contract violation: {0}")]
    ContractViolation(String),

    #[error("checkpoint i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint encoding failed: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("burn record failed: {0}")]
    Record(String),

    #[error("checkpoint does not match this network: {0}")]
    IncompatibleCheckpoint(String),
}

/// Encoded tensor as a flat buffer plus shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedState {
    /// Flattened tensor data (row-major order).
    pub tensor: Vec<f32>,
    pub shape: Vec<usize>,
}

impl EncodedState {
    pub fn new(tensor: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(
            tensor.len(),
            shape.iter().product::<usize>(),
            "Tensor length must match shape product"
        );
        Self { tensor, shape }
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self {
            tensor: vec![0.0; size],
            shape,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.tensor.get(index).copied()
    }

    /// Set element at a flat index; out-of-range writes are ignored.
    pub fn set(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.tensor.get_mut(index) {
            *slot = value;
        }
    }
}

/// Network input: per-position board encoding plus global features.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Shape `[3, 24]`.
    pub board: EncodedState,
    /// Shape `[11]`.
    pub globals: EncodedState,
}

impl Observation {
    /// Check tensor sizes against the fixed input contract.
    pub fn validate(&self) -> Result<(), ModelError> {
        let board_len = BOARD_CHANNELS * crate::core::BOARD_SIZE;
        if self.board.len() != board_len || self.globals.len() != GLOBAL_FEATURES {
            return Err(ModelError::ContractViolation(format!(
                "observation has {} board / {} global values, expected {board_len} / {GLOBAL_FEATURES}",
                self.board.len(),
                self.globals.len()
            )));
        }
        Ok(())
    }
}

/// Raw network output for one observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// One unmasked logit per action index.
    pub logits: Vec<f32>,
    /// State value from the mover's perspective, in `[-1, 1]`.
    pub value: f32,
}

impl ModelOutput {
    /// Reject malformed shapes or ranges.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.logits.len() != ACTION_SPACE_SIZE {
            return Err(ModelError::ContractViolation(format!(
                "expected {ACTION_SPACE_SIZE} logits, got {}",
                self.logits.len()
            )));
        }
        if let Some(i) = self.logits.iter().position(|l| !l.is_finite()) {
            return Err(ModelError::ContractViolation(format!(
                "logit {i} is not finite"
            )));
        }
        if !self.value.is_finite() || !(-1.0..=1.0).contains(&self.value) {
            return Err(ModelError::ContractViolation(format!(
                "value {} outside [-1, 1]",
                self.value
            )));
        }
        Ok(())
    }
}

/// Loss gradient with respect to one [`ModelOutput`].
#[derive(Clone, Debug, PartialEq)]
pub struct OutputGrad {
    pub logits: Vec<f32>,
    pub value: f32,
}

/// Inference-only policy/value network.
///
/// `forward` takes `&self`: inference never mutates parameters.
pub trait PolicyValueNetwork: Send + Sync {
    fn forward(&self, observation: &Observation) -> Result<ModelOutput, ModelError>;

    /// Batch inference (optional optimization).
    fn forward_batch(&self, observations: &[Observation]) -> Result<Vec<ModelOutput>, ModelError> {
        observations.iter().map(|o| self.forward(o)).collect()
    }
}

/// A network the trainer can update.
///
/// An update is `forward_train` followed by `backward_and_step`, both under
/// `&mut self`, so no inference can interleave with a partial update.
pub trait TrainableNetwork: PolicyValueNetwork {
    /// Training-mode forward pass; caches whatever `backward_and_step` needs.
    fn forward_train(&mut self, batch: &[Observation]) -> Result<Vec<ModelOutput>, ModelError>;

    /// Back-propagate output gradients for the cached batch, clip the global
    /// gradient norm to `max_grad_norm`, and take one optimizer step.
    ///
    /// Returns the gradient norm before clipping.
    fn backward_and_step(
        &mut self,
        grads: &[OutputGrad],
        max_grad_norm: f32,
    ) -> Result<f32, ModelError>;

    /// Persist parameters, optimizer state and the episode counter.
    fn save_checkpoint(&self, path: &Path, episode: u64) -> Result<(), ModelError>;

    /// Restore a checkpoint, returning its episode counter.
    fn load_checkpoint(&mut self, path: &Path) -> Result<u64, ModelError>;

    /// Persist parameters only.
    fn save_weights(&self, path: &Path) -> Result<(), ModelError>;

    fn load_weights(&mut self, path: &Path) -> Result<(), ModelError>;
}

/// Zero logits and zero value (baseline for testing).
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformPolicyZeroValue;

impl PolicyValueNetwork for UniformPolicyZeroValue {
    fn forward(&self, _observation: &Observation) -> Result<ModelOutput, ModelError> {
        Ok(ModelOutput {
            logits: vec![0.0; ACTION_SPACE_SIZE],
            value: 0.0,
        })
    }
}
