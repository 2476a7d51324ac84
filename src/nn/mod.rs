//! Policy/value network integration.
//!
//! ## Overview
//!
//! - **Contract**: `PolicyValueNetwork` (inference) and `TrainableNetwork`
//!   (batched update plus persistence), operating on `Observation` and
//!   returning `ModelOutput`
//! - **Encoding**: `StateEncoder` trait and the `MillsEncoder` implementation
//! - **Model**: `MlpNetwork`, a burn MLP trained with Adam on the
//!   `Autodiff<NdArray>` backend
//! - **Baseline**: `UniformPolicyZeroValue` for testing
//!
//! ## Usage
//!
//! ```
//! use morris_rl::core::Player;
//! use morris_rl::nn::{MillsEncoder, MlpConfig, MlpNetwork, PolicyValueNetwork, StateEncoder};
//! use morris_rl::rules::GameState;
//!
//! let network = MlpNetwork::new(MlpConfig::default().with_hidden_sizes(16, 8, 16, 8));
//! let observation = MillsEncoder.encode(&GameState::new(), Player::A, false);
//! let output = network.forward(&observation).unwrap();
//! assert_eq!(output.logits.len(), 600);
//! ```

pub mod encoder;
pub mod mlp;
pub mod traits;

pub use encoder::{MillsEncoder, StateEncoder};
pub use mlp::{MlpConfig, MlpNetwork, OptimizerConfig};
pub use traits::{
    EncodedState, ModelError, ModelOutput, Observation, OutputGrad, PolicyValueNetwork,
    TrainableNetwork, UniformPolicyZeroValue, BOARD_CHANNELS, GLOBAL_FEATURES,
};
