//! Policy/value MLP built on `burn`.
//!
//! ## Architecture
//!
//! ```text
//! board [3*24] --fc--relu--> [128] --+
//!                                    +--concat [160]--fc--relu--> [256] --fc--relu--> [256]
//! globals [11] --fc--relu--> [32] ---+                                                  |
//!                                            +---------------------------------------+
//!                                            |                                       |
//!                                     policy fc -> [600] logits     value fc--relu-> [128] --fc--tanh--> value
//! ```
//!
//! Hidden sizes are configurable through [`MlpConfig`]. Training runs on the
//! `Autodiff<NdArray>` backend; inference uses the detached inner backend.
//! The trainer owns the loss, so an update back-propagates the surrogate
//! `sum(logits * dL/dlogits) + sum(value * dL/dvalue)`, whose parameter
//! gradients are exactly those of the trainer's loss.

use burn::backend::{Autodiff, NdArray};
use burn::module::{AutodiffModule, Module, Param, ParamId};
use burn::nn::{Linear, LinearConfig};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::activation::relu;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor, TensorData};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

use super::traits::{
    ModelError, ModelOutput, Observation, OutputGrad, PolicyValueNetwork, TrainableNetwork,
    BOARD_CHANNELS, GLOBAL_FEATURES,
};
use crate::action_space::ACTION_SPACE_SIZE;
use crate::core::{GameRng, BOARD_SIZE};

type InferBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferBackend>;
type Device = <TrainBackend as Backend>::Device;
type Gradients = <TrainBackend as AutodiffBackend>::Gradients;
type MlpOptimizer = OptimizerAdaptor<Adam, MlpModel<TrainBackend>, TrainBackend>;

/// Bumped whenever the on-disk snapshot layout changes.
const SNAPSHOT_VERSION: u32 = 2;

const BOARD_INPUT: usize = BOARD_CHANNELS * BOARD_SIZE;

/// Adam hyperparameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-4,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl OptimizerConfig {
    fn init(&self) -> MlpOptimizer {
        AdamConfig::new()
            .with_beta_1(self.beta1)
            .with_beta_2(self.beta2)
            .with_epsilon(self.epsilon)
            .init()
    }
}

/// Layer sizes, optimizer settings and initialization seed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpConfig {
    pub board_hidden: usize,
    pub global_hidden: usize,
    pub trunk_hidden: usize,
    pub value_hidden: usize,
    pub optimizer: OptimizerConfig,
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            board_hidden: 128,
            global_hidden: 32,
            trunk_hidden: 256,
            value_hidden: 128,
            optimizer: OptimizerConfig::default(),
            seed: 0,
        }
    }
}

impl MlpConfig {
    #[must_use]
    pub fn with_hidden_sizes(mut self, board: usize, global: usize, trunk: usize, value: usize) -> Self {
        self.board_hidden = board;
        self.global_hidden = global;
        self.trunk_hidden = trunk;
        self.value_hidden = value;
        self
    }

    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.optimizer.learning_rate = learning_rate;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn hidden_sizes(&self) -> [usize; 4] {
        [self.board_hidden, self.global_hidden, self.trunk_hidden, self.value_hidden]
    }
}

#[derive(Module, Debug)]
struct MlpModel<B: Backend> {
    board_fc: Linear<B>,
    global_fc: Linear<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    policy_head: Linear<B>,
    value_fc: Linear<B>,
    value_head: Linear<B>,
}

/// Dense layer drawn from U(-1/sqrt(in), 1/sqrt(in)) using `rng` rather than
/// the backend's global RNG.
fn seeded_linear<B: Backend>(d_in: usize, d_out: usize, rng: &mut GameRng, device: &B::Device) -> Linear<B> {
    let bound = 1.0 / (d_in as f32).sqrt();
    let weight: Vec<f32> = (0..d_in * d_out).map(|_| rng.uniform(-bound, bound)).collect();
    let bias: Vec<f32> = (0..d_out).map(|_| rng.uniform(-bound, bound)).collect();

    let mut layer = LinearConfig::new(d_in, d_out).init(device);
    layer.weight = Param::from_tensor(
        Tensor::<B, 2>::from_data(TensorData::new(weight, [d_in, d_out]), device).require_grad(),
    );
    layer.bias = Some(Param::from_tensor(
        Tensor::<B, 1>::from_data(TensorData::new(bias, [d_out]), device).require_grad(),
    ));
    layer
}

impl<B: Backend> MlpModel<B> {
    fn init(config: &MlpConfig, device: &B::Device) -> Self {
        let mut rng = GameRng::new(config.seed);
        Self {
            board_fc: seeded_linear(BOARD_INPUT, config.board_hidden, &mut rng, device),
            global_fc: seeded_linear(GLOBAL_FEATURES, config.global_hidden, &mut rng, device),
            fc1: seeded_linear(
                config.board_hidden + config.global_hidden,
                config.trunk_hidden,
                &mut rng,
                device,
            ),
            fc2: seeded_linear(config.trunk_hidden, config.trunk_hidden, &mut rng, device),
            policy_head: seeded_linear(config.trunk_hidden, ACTION_SPACE_SIZE, &mut rng, device),
            value_fc: seeded_linear(config.trunk_hidden, config.value_hidden, &mut rng, device),
            value_head: seeded_linear(config.value_hidden, 1, &mut rng, device),
        }
    }

    fn layers(&self) -> [&Linear<B>; 7] {
        [
            &self.board_fc,
            &self.global_fc,
            &self.fc1,
            &self.fc2,
            &self.policy_head,
            &self.value_fc,
            &self.value_head,
        ]
    }

    /// Returns `(logits [n, 600], value [n, 1])`.
    fn forward(&self, board: Tensor<B, 2>, globals: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let board_h = relu(self.board_fc.forward(board));
        let global_h = relu(self.global_fc.forward(globals));
        let x = Tensor::cat(vec![board_h, global_h], 1);
        let x = relu(self.fc1.forward(x));
        let x = relu(self.fc2.forward(x));

        let logits = self.policy_head.forward(x.clone());
        let value = relu(self.value_fc.forward(x));
        let value = self.value_head.forward(value).tanh();
        (logits, value)
    }
}

fn tensor_error(err: impl std::fmt::Debug) -> ModelError {
    ModelError::ContractViolation(format!("tensor readback failed: {err:?}"))
}

fn record_error(err: impl std::fmt::Debug) -> ModelError {
    ModelError::Record(format!("{err:?}"))
}

/// Stack observations into `[n, 72]` board and `[n, 11]` global tensors.
fn batch_inputs<B: Backend>(batch: &[Observation], device: &B::Device) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let n = batch.len();
    let board: Vec<f32> = batch.iter().flat_map(|o| o.board.tensor.iter().copied()).collect();
    let globals: Vec<f32> = batch.iter().flat_map(|o| o.globals.tensor.iter().copied()).collect();
    (
        Tensor::from_data(TensorData::new(board, [n, BOARD_INPUT]), device),
        Tensor::from_data(TensorData::new(globals, [n, GLOBAL_FEATURES]), device),
    )
}

fn read_outputs<B: Backend>(logits: Tensor<B, 2>, values: Tensor<B, 2>) -> Result<Vec<ModelOutput>, ModelError> {
    let logits = logits.into_data().to_vec::<f32>().map_err(tensor_error)?;
    let values = values.into_data().to_vec::<f32>().map_err(tensor_error)?;
    Ok(logits
        .chunks_exact(ACTION_SPACE_SIZE)
        .zip(values)
        .map(|(l, value)| ModelOutput { logits: l.to_vec(), value })
        .collect())
}

fn squared_sum<const D: usize>(tensor: &Tensor<InferBackend, D>) -> f32 {
    (tensor.clone() * tensor.clone()).sum().into_scalar().elem::<f32>()
}

/// Per-parameter gradients pulled out of an autodiff backward pass.
struct ParamGrads {
    weights: Vec<(ParamId, Tensor<InferBackend, 2>)>,
    biases: Vec<(ParamId, Tensor<InferBackend, 1>)>,
}

impl ParamGrads {
    fn collect(model: &MlpModel<TrainBackend>, grads: &Gradients) -> Self {
        let mut out = Self { weights: Vec::new(), biases: Vec::new() };
        for layer in model.layers() {
            if let Some(g) = layer.weight.val().grad(grads) {
                out.weights.push((layer.weight.id.clone(), g));
            }
            if let Some(bias) = &layer.bias {
                if let Some(g) = bias.val().grad(grads) {
                    out.biases.push((bias.id.clone(), g));
                }
            }
        }
        out
    }

    fn global_norm(&self) -> f32 {
        let weights: f32 = self.weights.iter().map(|(_, g)| squared_sum(g)).sum();
        let biases: f32 = self.biases.iter().map(|(_, g)| squared_sum(g)).sum();
        (weights + biases).sqrt()
    }

    fn into_params(self, scale: f32) -> GradientsParams {
        let mut params = GradientsParams::new();
        for (id, g) in self.weights {
            params.register(id, g.mul_scalar(scale));
        }
        for (id, g) in self.biases {
            params.register(id, g.mul_scalar(scale));
        }
        params
    }
}

/// On-disk layout for both checkpoints and weight files. Module and
/// optimizer records are encoded by burn and embedded as bytes.
#[derive(Serialize, Deserialize)]
struct MlpSnapshot {
    version: u32,
    config: MlpConfig,
    model: Vec<u8>,
    optimizer: Option<Vec<u8>>,
    steps: u64,
    episode: Option<u64>,
}

impl MlpSnapshot {
    fn write(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ModelError> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Self = bincode::deserialize_from(reader)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ModelError::IncompatibleCheckpoint(format!(
                "snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

/// Cached training-mode outputs awaiting `backward_and_step`.
struct TrainCache {
    logits: Tensor<TrainBackend, 2>,
    values: Tensor<TrainBackend, 2>,
    len: usize,
}

/// Policy/value MLP with a burn Adam optimizer.
pub struct MlpNetwork {
    config: MlpConfig,
    device: Device,
    model: MlpModel<TrainBackend>,
    optimizer: MlpOptimizer,
    steps: u64,
    cache: Option<TrainCache>,
}

impl MlpNetwork {
    /// Fresh network initialized from `config.seed`.
    #[must_use]
    pub fn new(config: MlpConfig) -> Self {
        let device = Device::default();
        let model = MlpModel::init(&config, &device);
        let optimizer = config.optimizer.init();
        Self {
            config,
            device,
            model,
            optimizer,
            steps: 0,
            cache: None,
        }
    }

    /// Rebuild a network from a weights or checkpoint file, using the layer
    /// sizes stored in the file.
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let snapshot = MlpSnapshot::read(path)?;
        let mut network = Self::new(snapshot.config.clone());
        network.restore_model(&snapshot)?;
        if let Some(bytes) = snapshot.optimizer {
            network.restore_optimizer(bytes)?;
            network.steps = snapshot.steps;
        }
        Ok(network)
    }

    #[must_use]
    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.model.num_params()
    }

    /// Optimizer steps taken since initialization.
    #[must_use]
    pub fn optimizer_steps(&self) -> u64 {
        self.steps
    }

    fn recorder() -> BinBytesRecorder<FullPrecisionSettings> {
        BinBytesRecorder::default()
    }

    fn snapshot(&self, with_optimizer: bool, episode: Option<u64>) -> Result<MlpSnapshot, ModelError> {
        let recorder = Self::recorder();
        let model = Recorder::<TrainBackend>::record(&recorder, self.model.clone().into_record(), ())
            .map_err(record_error)?;
        let optimizer = if with_optimizer {
            Some(
                Recorder::<TrainBackend>::record(&recorder, self.optimizer.to_record(), ())
                    .map_err(record_error)?,
            )
        } else {
            None
        };
        Ok(MlpSnapshot {
            version: SNAPSHOT_VERSION,
            config: self.config.clone(),
            model,
            optimizer,
            steps: self.steps,
            episode,
        })
    }

    fn check_architecture(&self, snapshot: &MlpSnapshot) -> Result<(), ModelError> {
        if snapshot.config.hidden_sizes() != self.config.hidden_sizes() {
            return Err(ModelError::IncompatibleCheckpoint(format!(
                "hidden sizes {:?} do not match {:?}",
                snapshot.config.hidden_sizes(),
                self.config.hidden_sizes()
            )));
        }
        Ok(())
    }

    fn restore_model(&mut self, snapshot: &MlpSnapshot) -> Result<(), ModelError> {
        let record = Recorder::<TrainBackend>::load(&Self::recorder(), snapshot.model.clone(), &self.device)
            .map_err(record_error)?;
        self.model = self.model.clone().load_record(record);
        self.cache = None;
        Ok(())
    }

    fn restore_optimizer(&mut self, bytes: Vec<u8>) -> Result<(), ModelError> {
        let record = Recorder::<TrainBackend>::load(&Self::recorder(), bytes, &self.device)
            .map_err(record_error)?;
        self.optimizer = self.config.optimizer.init().load_record(record);
        Ok(())
    }

    fn infer(&self, batch: &[Observation]) -> Result<Vec<ModelOutput>, ModelError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        for observation in batch {
            observation.validate()?;
        }
        let model = self.model.valid();
        let (board, globals) = batch_inputs::<InferBackend>(batch, &self.device);
        let (logits, values) = model.forward(board, globals);
        read_outputs(logits, values)
    }
}

impl PolicyValueNetwork for MlpNetwork {
    fn forward(&self, observation: &Observation) -> Result<ModelOutput, ModelError> {
        self.infer(std::slice::from_ref(observation))?
            .pop()
            .ok_or_else(|| ModelError::ContractViolation("no output for observation".into()))
    }

    fn forward_batch(&self, observations: &[Observation]) -> Result<Vec<ModelOutput>, ModelError> {
        self.infer(observations)
    }
}

impl TrainableNetwork for MlpNetwork {
    fn forward_train(&mut self, batch: &[Observation]) -> Result<Vec<ModelOutput>, ModelError> {
        self.cache = None;
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        for observation in batch {
            observation.validate()?;
        }
        let (board, globals) = batch_inputs::<TrainBackend>(batch, &self.device);
        let (logits, values) = self.model.forward(board, globals);
        let outputs = read_outputs(logits.clone(), values.clone())?;
        self.cache = Some(TrainCache { logits, values, len: batch.len() });
        Ok(outputs)
    }

    fn backward_and_step(
        &mut self,
        grads: &[OutputGrad],
        max_grad_norm: f32,
    ) -> Result<f32, ModelError> {
        let cache = self.cache.take().ok_or_else(|| {
            ModelError::ContractViolation("backward_and_step without a cached forward pass".into())
        })?;
        if grads.len() != cache.len {
            return Err(ModelError::ContractViolation(format!(
                "{} output gradients for a cached batch of {}",
                grads.len(),
                cache.len
            )));
        }
        if let Some(g) = grads.iter().find(|g| g.logits.len() != ACTION_SPACE_SIZE) {
            return Err(ModelError::ContractViolation(format!(
                "logit gradient of length {}",
                g.logits.len()
            )));
        }

        let n = grads.len();
        let logit_grads: Vec<f32> = grads.iter().flat_map(|g| g.logits.iter().copied()).collect();
        let value_grads: Vec<f32> = grads.iter().map(|g| g.value).collect();
        let logit_grads =
            Tensor::<TrainBackend, 2>::from_data(TensorData::new(logit_grads, [n, ACTION_SPACE_SIZE]), &self.device);
        let value_grads = Tensor::<TrainBackend, 2>::from_data(TensorData::new(value_grads, [n, 1]), &self.device);

        let surrogate = (cache.logits * logit_grads).sum() + (cache.values * value_grads).sum();
        let backward = surrogate.backward();
        let param_grads = ParamGrads::collect(&self.model, &backward);

        let norm = param_grads.global_norm();
        let scale = if max_grad_norm > 0.0 {
            (max_grad_norm / (norm + 1e-6)).min(1.0)
        } else {
            1.0
        };

        let learning_rate = f64::from(self.config.optimizer.learning_rate);
        self.model = self
            .optimizer
            .step(learning_rate, self.model.clone(), param_grads.into_params(scale));
        self.steps += 1;
        Ok(norm)
    }

    fn save_checkpoint(&self, path: &Path, episode: u64) -> Result<(), ModelError> {
        self.snapshot(true, Some(episode))?.write(path)?;
        debug!(path = %path.display(), episode, "checkpoint written");
        Ok(())
    }

    fn load_checkpoint(&mut self, path: &Path) -> Result<u64, ModelError> {
        let snapshot = MlpSnapshot::read(path)?;
        self.check_architecture(&snapshot)?;
        let (Some(optimizer), Some(episode)) = (snapshot.optimizer.clone(), snapshot.episode) else {
            return Err(ModelError::IncompatibleCheckpoint(
                "file holds weights only, not a resumable checkpoint".into(),
            ));
        };
        self.restore_model(&snapshot)?;
        self.restore_optimizer(optimizer)?;
        self.steps = snapshot.steps;
        Ok(episode)
    }

    fn save_weights(&self, path: &Path) -> Result<(), ModelError> {
        self.snapshot(false, None)?.write(path)
    }

    fn load_weights(&mut self, path: &Path) -> Result<(), ModelError> {
        let snapshot = MlpSnapshot::read(path)?;
        self.check_architecture(&snapshot)?;
        self.restore_model(&snapshot)
    }
}
