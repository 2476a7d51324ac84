//! Masked action selection on top of a policy/value network.

use thiserror::Error;

use super::loss::masked_softmax;
use crate::action_space::{ActionSpace, ActionSpaceError, LegalMask};
use crate::core::{GameRng, Player, Position, TurnPlan};
use crate::nn::{MillsEncoder, ModelError, Observation, PolicyValueNetwork, StateEncoder};
use crate::rules::{GameState, MoveOutcome};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no legal action under the current mask")]
    NoLegalAction,

    #[error("a capture is pending; resolve it with decide_removal")]
    RemovalPending,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    ActionSpace(#[from] ActionSpaceError),
}

/// Result of one action selection.
#[derive(Clone, Debug)]
pub struct ActionChoice {
    /// Chosen flat action index.
    pub index: usize,
    /// Unmasked logits as the model returned them.
    pub logits: Vec<f32>,
    pub value: f32,
}

/// How [`SelfPlayAgent::resolve_full_turn`] picks among legal actions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sampling {
    /// Highest-logit legal action.
    Greedy,
    /// Epsilon-uniform exploration, else softmax at `temperature`.
    Stochastic { temperature: f32, epsilon: f64 },
}

impl Sampling {
    fn params(self) -> (f32, f64) {
        match self {
            Sampling::Greedy => (0.0, 0.0),
            Sampling::Stochastic {
                temperature,
                epsilon,
            } => (temperature, epsilon),
        }
    }
}

/// Chooses moves and captures for whichever player is to move.
///
/// The agent holds no network; callers lend one per decision so the same
/// agent can drive inference against a model that is trained in between.
#[derive(Clone, Debug)]
pub struct SelfPlayAgent<E: StateEncoder = MillsEncoder> {
    encoder: E,
    rng: GameRng,
}

impl SelfPlayAgent<MillsEncoder> {
    pub fn new(rng: GameRng) -> Self {
        Self::with_encoder(MillsEncoder, rng)
    }
}

impl<E: StateEncoder> SelfPlayAgent<E> {
    pub fn with_encoder(encoder: E, rng: GameRng) -> Self {
        Self { encoder, rng }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Replace the sampling RNG.
    pub fn reseed(&mut self, rng: GameRng) {
        self.rng = rng;
    }

    /// Observation of `state` from `player`'s side.
    pub fn observe(&self, state: &GameState, player: Player, removal_pending: bool) -> Observation {
        self.encoder.encode(state, player, removal_pending)
    }

    /// Pick one legal action index.
    ///
    /// The model is always queried so the returned logits and value belong
    /// to this decision. With probability `epsilon` the index is drawn
    /// uniformly among legal actions; otherwise from the masked softmax at
    /// `temperature`, or the legal arg-max when `temperature <= 0`.
    pub fn select_action<N: PolicyValueNetwork + ?Sized>(
        &mut self,
        network: &N,
        observation: &Observation,
        mask: &LegalMask,
        temperature: f32,
        epsilon: f64,
    ) -> Result<ActionChoice, AgentError> {
        if mask.is_empty() {
            return Err(AgentError::NoLegalAction);
        }

        let output = network.forward(observation)?;
        output.validate()?;

        let index = if epsilon > 0.0 && self.rng.gen_bool(epsilon) {
            let legal: Vec<usize> = mask.indices().collect();
            *self.rng.choose(&legal).ok_or(AgentError::NoLegalAction)?
        } else if temperature <= 0.0 {
            greedy_index(&output.logits, mask).ok_or(AgentError::NoLegalAction)?
        } else {
            let probs = masked_softmax(&output.logits, mask, temperature);
            self.rng
                .choose_weighted(&probs)
                .ok_or(AgentError::NoLegalAction)?
        };

        Ok(ActionChoice {
            index,
            logits: output.logits,
            value: output.value,
        })
    }

    /// Choose the whole turn for the player to move.
    ///
    /// If the chosen move closes a mill, the model is asked again on the
    /// post-move state for the capture. A move the rules reject is returned
    /// without a capture so the caller's engine reports the violation.
    /// Returns `None` when the mover has no legal move.
    pub fn resolve_full_turn<N: PolicyValueNetwork + ?Sized>(
        &mut self,
        network: &N,
        state: &GameState,
        sampling: Sampling,
    ) -> Result<Option<TurnPlan>, AgentError> {
        if state.removal_pending() {
            return Err(AgentError::RemovalPending);
        }
        let mover = state.to_move();
        let mask = ActionSpace::legal_mask(state, mover, false);
        if mask.is_empty() {
            return Ok(None);
        }

        let (temperature, epsilon) = sampling.params();
        let observation = self.observe(state, mover, false);
        let choice = self.select_action(network, &observation, &mask, temperature, epsilon)?;
        let action = ActionSpace::decode(choice.index)?;

        let removal = match state.after_move(action) {
            Ok((next, MoveOutcome::MustRemove)) => self.decide_removal(network, &next, sampling)?,
            Ok((_, MoveOutcome::Ok)) | Err(_) => None,
        };
        Ok(Some(TurnPlan::new(action, removal)))
    }

    /// Choose the capture for a state with a removal pending.
    ///
    /// Returns `None` when no capture is owed or none is possible.
    pub fn decide_removal<N: PolicyValueNetwork + ?Sized>(
        &mut self,
        network: &N,
        state: &GameState,
        sampling: Sampling,
    ) -> Result<Option<Position>, AgentError> {
        if !state.removal_pending() {
            return Ok(None);
        }
        let mover = state.to_move();
        let mask = ActionSpace::legal_mask(state, mover, true);
        if mask.is_empty() {
            return Ok(None);
        }

        let (temperature, epsilon) = sampling.params();
        let observation = self.observe(state, mover, true);
        let choice = self.select_action(network, &observation, &mask, temperature, epsilon)?;
        Ok(Some(ActionSpace::decode(choice.index)?.target))
    }
}

/// Legal index with the highest logit; ties go to the lowest index.
fn greedy_index(logits: &[f32], mask: &LegalMask) -> Option<usize> {
    mask.indices().fold(None, |best: Option<usize>, i| match best {
        Some(b) if logits[b] >= logits[i] => Some(b),
        _ => Some(i),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_space::{ACTION_SPACE_SIZE, NO_SOURCE};
    use crate::core::{Action, Board, PlayerMap};
    use crate::nn::{ModelOutput, UniformPolicyZeroValue};

    /// Network that always returns the same output.
    struct Fixed(ModelOutput);

    impl PolicyValueNetwork for Fixed {
        fn forward(&self, _observation: &Observation) -> Result<ModelOutput, ModelError> {
            Ok(self.0.clone())
        }
    }

    fn peaked(index: usize) -> Fixed {
        let mut logits = vec![0.0; ACTION_SPACE_SIZE];
        logits[index] = 50.0;
        Fixed(ModelOutput { logits, value: 0.25 })
    }

    fn agent() -> SelfPlayAgent {
        SelfPlayAgent::new(GameRng::new(7))
    }

    fn pos(i: u8) -> Position {
        Position::new(i)
    }

    fn start_observation() -> Observation {
        MillsEncoder.encode(&GameState::new(), Player::A, false)
    }

    #[test]
    fn test_empty_mask_is_no_legal_action() {
        let err = agent()
            .select_action(&UniformPolicyZeroValue, &start_observation(), &LegalMask::none(), 1.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, AgentError::NoLegalAction));
    }

    #[test]
    fn test_sampling_stays_inside_mask() {
        let state = GameState::new();
        let mask = ActionSpace::legal_mask(&state, Player::A, false);
        let mut agent = agent();
        for _ in 0..200 {
            let choice = agent
                .select_action(&UniformPolicyZeroValue, &start_observation(), &mask, 1.0, 0.3)
                .unwrap();
            assert!(mask.is_legal(choice.index));
        }
    }

    #[test]
    fn test_greedy_takes_best_legal_logit() {
        let mask = ActionSpace::legal_mask(&GameState::new(), Player::A, false);
        // index 0 is illegal while placing, however large its logit
        let mut logits = vec![0.0; ACTION_SPACE_SIZE];
        logits[0] = 100.0;
        logits[NO_SOURCE * 24 + 9] = 3.0;
        let network = Fixed(ModelOutput { logits, value: 0.0 });
        let choice = agent()
            .select_action(&network, &start_observation(), &mask, 0.0, 0.0)
            .unwrap();
        assert_eq!(choice.index, NO_SOURCE * 24 + 9);
        assert_eq!(choice.logits[0], 100.0);
    }

    #[test]
    fn test_rejects_malformed_model_output() {
        let mask = ActionSpace::legal_mask(&GameState::new(), Player::A, false);
        let network = Fixed(ModelOutput {
            logits: vec![0.0; 10],
            value: 0.0,
        });
        let err = agent()
            .select_action(&network, &start_observation(), &mask, 1.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, AgentError::Model(ModelError::ContractViolation(_))));
    }

    #[test]
    fn test_full_turn_chains_capture() {
        // A completes 0-1-2 by placing on 2; B's only piece is on 9
        let board = Board::with_pieces(&[pos(0), pos(1)], &[pos(9), pos(10)]);
        let state = GameState::from_position(board, PlayerMap::new(|_| 7), Player::A, false).unwrap();
        let mut agent = agent();

        let place_two = ActionSpace::encode(Action::place(pos(2)));
        let plan = agent
            .resolve_full_turn(&peaked(place_two), &state, Sampling::Greedy)
            .unwrap()
            .unwrap();
        assert_eq!(plan.action, Action::place(pos(2)));
        // the same peaked network has no legal capture preference beyond ties
        assert!(matches!(plan.removal, Some(p) if p == pos(9) || p == pos(10)));
    }

    #[test]
    fn test_full_turn_without_mill_has_no_removal() {
        let mut agent = agent();
        let plan = agent
            .resolve_full_turn(&UniformPolicyZeroValue, &GameState::new(), Sampling::Greedy)
            .unwrap()
            .unwrap();
        assert_eq!(plan.action, Action::place(pos(0)));
        assert_eq!(plan.removal, None);
    }

    #[test]
    fn test_full_turn_refuses_pending_removal() {
        let board = Board::with_pieces(&[pos(0), pos(1), pos(2)], &[pos(9)]);
        let state = GameState::from_position(board, PlayerMap::new(|_| 6), Player::A, true).unwrap();
        let err = agent()
            .resolve_full_turn(&UniformPolicyZeroValue, &state, Sampling::Greedy)
            .unwrap_err();
        assert!(matches!(err, AgentError::RemovalPending));
    }

    #[test]
    fn test_decide_removal_targets_opponent() {
        let board = Board::with_pieces(&[pos(0), pos(1), pos(2)], &[pos(9), pos(21)]);
        let state = GameState::from_position(board, PlayerMap::new(|_| 6), Player::A, true).unwrap();
        let capture = agent()
            .decide_removal(&peaked(NO_SOURCE * 24 + 21), &state, Sampling::Greedy)
            .unwrap();
        assert_eq!(capture, Some(pos(21)));
        assert_eq!(
            agent()
                .decide_removal(&UniformPolicyZeroValue, &GameState::new(), Sampling::Greedy)
                .unwrap(),
            None
        );
    }
}
