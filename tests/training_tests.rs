//! Integration tests for advantage estimation and the self-play trainer.

use morris_rl::action_space::{ActionSpace, LegalMask, ACTION_SPACE_SIZE};
use morris_rl::core::{GameRng, Player};
use morris_rl::nn::{MillsEncoder, MlpConfig, MlpNetwork, StateEncoder, TrainableNetwork};
use morris_rl::rules::{GameState, MillsEngine};
use morris_rl::training::{
    compute_gae, normalize_advantages, Episode, EpisodeEnd, RolloutBuffer, Sampling, SelfPlayAgent,
    SelfPlayTrainer, TrainerConfig, TrajectoryStep,
};

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
    }
}

fn step(reward: f32, value: f32) -> TrajectoryStep {
    let state = GameState::new();
    let mask = ActionSpace::legal_mask(&state, Player::A, false);
    let action_index = mask.indices().next().unwrap();
    TrajectoryStep {
        player: Player::A,
        observation: MillsEncoder.encode(&state, Player::A, false),
        action_index,
        raw_logits: vec![0.0; ACTION_SPACE_SIZE],
        value,
        reward,
        legal_mask: mask,
    }
}

fn episode(pairs: &[(f32, f32)]) -> Episode {
    Episode {
        steps: pairs.iter().map(|&(r, v)| step(r, v)).collect(),
        winner: None,
        end: EpisodeEnd::Truncated,
    }
}

fn small_network(seed: u64) -> MlpNetwork {
    MlpNetwork::new(MlpConfig::default().with_hidden_sizes(8, 4, 8, 4).with_seed(seed))
}

// =============================================================================
// GAE
// =============================================================================

const REWARDS: [f32; 3] = [1.0, 0.0, -1.0];
const VALUES: [f32; 3] = [0.5, 0.2, 0.1];

#[test]
fn test_gae_lambda_one_is_monte_carlo() {
    let (advantages, returns) = compute_gae(&REWARDS, &VALUES, 0.9, 1.0);
    // discounted returns: 1 + 0.9 * (0 + 0.9 * -1) = 0.19
    assert_close(&returns, &[0.19, -0.9, -1.0]);
    assert_close(&advantages, &[0.19 - 0.5, -0.9 - 0.2, -1.0 - 0.1]);
}

#[test]
fn test_gae_lambda_zero_is_td_residual() {
    let (advantages, returns) = compute_gae(&REWARDS, &VALUES, 0.9, 0.0);
    let deltas = [1.0 + 0.9 * 0.2 - 0.5, 0.9 * 0.1 - 0.2, -1.0 - 0.1];
    assert_close(&advantages, &deltas);
    assert_close(&returns, &[deltas[0] + 0.5, deltas[1] + 0.2, deltas[2] + 0.1]);
}

#[test]
fn test_advantages_pooled_across_episodes() {
    let first = [(1.0, 0.2), (0.0, 0.1), (2.0, -0.3)];
    let second = [(-1.0, 0.4), (0.5, 0.0)];
    let (gamma, lambda) = (0.99, 0.95);

    let split = |pairs: &[(f32, f32)]| -> (Vec<f32>, Vec<f32>) { pairs.iter().copied().unzip() };
    let (r1, v1) = split(&first);
    let (r2, v2) = split(&second);
    let (mut expected, _) = compute_gae(&r1, &v1, gamma, lambda);
    expected.extend(compute_gae(&r2, &v2, gamma, lambda).0);
    let raw = expected.clone();
    normalize_advantages(&mut expected);

    let mut buffer = RolloutBuffer::new();
    buffer.push(episode(&first));
    buffer.push(episode(&second));
    let batch = buffer.drain_pooled(gamma, lambda);
    assert_close(&batch.advantages, &expected);

    // per-episode normalization would give something else
    let mut per_episode_first = raw[..3].to_vec();
    let mut per_episode_second = raw[3..].to_vec();
    normalize_advantages(&mut per_episode_first);
    normalize_advantages(&mut per_episode_second);
    per_episode_first.extend(per_episode_second);
    assert!(per_episode_first
        .iter()
        .zip(&batch.advantages)
        .any(|(a, b)| (a - b).abs() > 1e-3));
}

// =============================================================================
// Agent
// =============================================================================

#[test]
fn test_greedy_self_play_game_stays_legal() {
    let network = small_network(3);
    let mut agent = SelfPlayAgent::new(GameRng::new(0));
    let mut engine = MillsEngine::new();

    for _ in 0..150 {
        if engine.is_terminal() {
            break;
        }
        let Some(plan) = agent
            .resolve_full_turn(&network, engine.state(), Sampling::Greedy)
            .unwrap()
        else {
            break;
        };
        engine.apply_turn(&plan).unwrap();
        assert!(!engine.state().removal_pending());
    }
}

#[test]
fn test_sampled_indices_respect_mask() {
    let network = small_network(4);
    let mut agent = SelfPlayAgent::new(GameRng::new(9));
    let state = GameState::new();
    let observation = agent.observe(&state, Player::A, false);
    let mut bits = vec![false; ACTION_SPACE_SIZE];
    bits[580] = true;
    bits[590] = true;
    let mask = LegalMask::from_bits(bits).unwrap();

    for _ in 0..100 {
        let choice = agent
            .select_action(&network, &observation, &mask, 1.0, 0.5)
            .unwrap();
        assert!(choice.index == 580 || choice.index == 590);
        assert!((-1.0..=1.0).contains(&choice.value));
    }
}

// =============================================================================
// Trainer
// =============================================================================

#[test]
fn test_short_run_then_play_from_final_weights() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainerConfig::default()
        .with_num_episodes(6)
        .with_episodes_per_update(3)
        .with_save_every(3)
        .with_max_decisions(80)
        .with_checkpoint_path(dir.path().join("runs/ckpt.bin"))
        .with_final_weights_path(dir.path().join("runs/final.bin"))
        .with_seed(5);

    let mut trainer = SelfPlayTrainer::new(small_network(5), config);
    let summary = trainer.train().unwrap();
    assert_eq!(summary.episodes, 6);
    assert_eq!(summary.updates, 2);
    let rates = summary.outcomes;
    assert!((rates.player_a + rates.player_b + rates.draws - 1.0).abs() < 1e-5);

    // final weights load but cannot be resumed from
    let final_path = dir.path().join("runs/final.bin");
    let loaded = MlpNetwork::from_file(&final_path).unwrap();
    assert_eq!(loaded.parameter_count(), trainer.network().parameter_count());
    let mut other = small_network(5);
    assert!(other.load_checkpoint(&final_path).is_err());

    let mut agent = SelfPlayAgent::new(GameRng::new(1));
    let plan = agent
        .resolve_full_turn(&loaded, &GameState::new(), Sampling::Greedy)
        .unwrap();
    assert!(plan.is_some());
}

#[test]
fn test_terminal_bonus_lands_on_last_step() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainerConfig::default()
        .with_epsilon(1.0)
        .with_checkpoint_path(dir.path().join("ckpt.bin"))
        .with_final_weights_path(dir.path().join("final.bin"))
        .with_max_decisions(2_000)
        .with_seed(21);
    let mut trainer = SelfPlayTrainer::new(small_network(21), config);

    for _ in 0..5 {
        let episode = trainer.collect_episode().unwrap();
        if let Some(winner) = episode.winner {
            let last = episode.steps.last().unwrap();
            // shaping terms never exceed a few points; the bonus dominates
            if last.player == winner {
                assert!(last.reward >= 10.0);
            } else {
                assert!(last.reward <= -10.0 + 5.0);
            }
        }
    }
}
