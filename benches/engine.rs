//! Benchmarks for the rules engine, masks and network forward pass.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use morris_rl::action_space::ActionSpace;
use morris_rl::core::GameRng;
use morris_rl::nn::{MillsEncoder, MlpConfig, MlpNetwork, PolicyValueNetwork, StateEncoder};
use morris_rl::rules::{GameState, MoveOutcome};

/// A mid-game position reached by seeded random play.
fn midgame_state(decisions: usize) -> GameState {
    let mut rng = GameRng::new(42);
    let mut state = GameState::new();
    for _ in 0..decisions {
        if state.is_terminal() {
            break;
        }
        let mover = state.to_move();
        let mask = ActionSpace::legal_mask(&state, mover, state.removal_pending());
        let legal: Vec<usize> = mask.indices().collect();
        let Some(&index) = rng.choose(&legal) else { break };
        let Ok(action) = ActionSpace::decode(index) else { break };
        state = if state.removal_pending() {
            match state.after_removal(action.target) {
                Ok(next) => next,
                Err(_) => break,
            }
        } else {
            match state.after_move(action) {
                Ok((next, _)) => next,
                Err(_) => break,
            }
        };
    }
    state
}

fn bench_legal_mask(c: &mut Criterion) {
    let state = midgame_state(24);
    c.bench_function("legal_mask_midgame", |b| {
        b.iter(|| {
            let mask = ActionSpace::legal_mask(black_box(&state), state.to_move(), false);
            black_box(mask)
        })
    });
}

fn bench_random_game(c: &mut Criterion) {
    c.bench_function("random_game_200_decisions", |b| {
        b.iter(|| black_box(midgame_state(200)))
    });
}

fn bench_legality_queries(c: &mut Criterion) {
    let state = midgame_state(24);
    let actions = state.legal_targets(state.to_move());
    c.bench_function("after_move_all_legal", |b| {
        b.iter(|| {
            let mut mills = 0;
            for &action in &actions {
                if let Ok((_, MoveOutcome::MustRemove)) = state.after_move(black_box(action)) {
                    mills += 1;
                }
            }
            black_box(mills)
        })
    });
}

fn bench_forward(c: &mut Criterion) {
    let network = MlpNetwork::new(MlpConfig::default());
    let state = midgame_state(24);
    let observation = MillsEncoder.encode(&state, state.to_move(), false);
    c.bench_function("mlp_forward", |b| {
        b.iter(|| black_box(network.forward(black_box(&observation))))
    });
}

criterion_group!(
    benches,
    bench_legal_mask,
    bench_random_game,
    bench_legality_queries,
    bench_forward
);
criterion_main!(benches);
