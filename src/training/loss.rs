//! Masked policy-gradient loss and its analytic output gradients.
//!
//! For a pooled batch of `N` steps with advantages `A` and returns `R`:
//!
//! ```text
//! policy  = -mean(log p(a) * A)
//! value   =  mean((v - R)^2)
//! entropy = -mean(sum_j p_j log p_j)        over the masked distribution
//! total   = policy + c_v * value - c_e * entropy
//! ```
//!
//! Gradients with respect to the raw logits `z` and value `v`:
//!
//! ```text
//! dL/dz_j = (A/N) (p_j - [j == a]) + (c_e/N) p_j (log p_j + H)    legal j
//! dL/dz_j = 0                                                     masked j
//! dL/dv   = 2 c_v (v - R) / N
//! ```

use serde::{Deserialize, Serialize};

use super::trajectory::PooledBatch;
use crate::action_space::LegalMask;
use crate::nn::{ModelOutput, OutputGrad};

/// Logit assigned to illegal actions before normalizing.
pub const MASKED_LOGIT: f32 = -1e9;

/// Copy of `logits` with illegal entries replaced by [`MASKED_LOGIT`].
#[must_use]
pub fn masked_logits(logits: &[f32], mask: &LegalMask) -> Vec<f32> {
    logits
        .iter()
        .enumerate()
        .map(|(i, &z)| if mask.is_legal(i) { z } else { MASKED_LOGIT })
        .collect()
}

/// Log-probabilities of the masked distribution.
#[must_use]
pub fn masked_log_softmax(logits: &[f32], mask: &LegalMask) -> Vec<f32> {
    let masked = masked_logits(logits, mask);
    let max = masked.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let log_sum = masked.iter().map(|z| (z - max).exp()).sum::<f32>().ln() + max;
    masked.iter().map(|z| z - log_sum).collect()
}

/// Probabilities of the masked distribution at `temperature`.
///
/// Illegal actions get probability exactly zero.
#[must_use]
pub fn masked_softmax(logits: &[f32], mask: &LegalMask, temperature: f32) -> Vec<f32> {
    let scaled: Vec<f32> = logits
        .iter()
        .enumerate()
        .map(|(i, &z)| if mask.is_legal(i) { z / temperature } else { f32::NEG_INFINITY })
        .collect();
    let max = scaled.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; logits.len()];
    }
    let exp: Vec<f32> = scaled.iter().map(|z| (z - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

/// Loss components of one update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LossBreakdown {
    pub total: f32,
    pub policy: f32,
    pub value: f32,
    pub entropy: f32,
    /// mean(log p_old(a) - log p_new(a)); how far the policy drifted from
    /// the one that sampled the batch.
    pub approx_kl: f32,
}

/// Loss and per-step output gradients for a pooled batch.
///
/// `outputs[i]` must be the training-mode forward pass of
/// `batch.observations[i]`.
#[must_use]
pub fn policy_value_loss(
    outputs: &[ModelOutput],
    batch: &PooledBatch,
    value_coef: f32,
    entropy_coef: f32,
) -> (LossBreakdown, Vec<OutputGrad>) {
    let n = outputs.len();
    if n == 0 {
        return (LossBreakdown::default(), Vec::new());
    }
    let inv_n = 1.0 / n as f32;

    let mut policy_sum = 0.0f32;
    let mut value_sum = 0.0f32;
    let mut entropy_sum = 0.0f32;
    let mut kl_sum = 0.0f32;
    let mut grads = Vec::with_capacity(n);

    for (i, output) in outputs.iter().enumerate() {
        let mask = &batch.masks[i];
        let action = batch.actions[i];
        let advantage = batch.advantages[i];
        let ret = batch.returns[i];

        let log_probs = masked_log_softmax(&output.logits, mask);
        let probs: Vec<f32> = log_probs
            .iter()
            .enumerate()
            .map(|(j, lp)| if mask.is_legal(j) { lp.exp() } else { 0.0 })
            .collect();
        let entropy: f32 = -mask.indices().map(|j| probs[j] * log_probs[j]).sum::<f32>();

        policy_sum -= log_probs[action] * advantage;
        value_sum += (output.value - ret).powi(2);
        entropy_sum += entropy;
        kl_sum += batch.old_log_probs[i] - log_probs[action];

        let mut logit_grad = vec![0.0; output.logits.len()];
        for j in mask.indices() {
            let indicator = if j == action { 1.0 } else { 0.0 };
            logit_grad[j] = advantage * inv_n * (probs[j] - indicator)
                + entropy_coef * inv_n * probs[j] * (log_probs[j] + entropy);
        }
        grads.push(OutputGrad {
            logits: logit_grad,
            value: 2.0 * value_coef * (output.value - ret) * inv_n,
        });
    }

    let policy = policy_sum * inv_n;
    let value = value_sum * inv_n;
    let entropy = entropy_sum * inv_n;
    let breakdown = LossBreakdown {
        total: policy + value_coef * value - entropy_coef * entropy,
        policy,
        value,
        entropy,
        approx_kl: kl_sum * inv_n,
    };
    (breakdown, grads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_space::ACTION_SPACE_SIZE;
    use crate::nn::{EncodedState, Observation};

    fn mask_of(indices: &[usize]) -> LegalMask {
        let mut bits = vec![false; ACTION_SPACE_SIZE];
        for &i in indices {
            bits[i] = true;
        }
        LegalMask::from_bits(bits).unwrap()
    }

    fn batch_of(masks: Vec<LegalMask>, actions: Vec<usize>, advantages: Vec<f32>, returns: Vec<f32>) -> PooledBatch {
        let n = masks.len();
        PooledBatch {
            observations: vec![
                Observation {
                    board: EncodedState::zeros(vec![3, 24]),
                    globals: EncodedState::zeros(vec![11]),
                };
                n
            ],
            actions,
            masks,
            advantages,
            returns,
            old_log_probs: vec![0.0; n],
        }
    }

    fn output(logits: Vec<f32>, value: f32) -> ModelOutput {
        ModelOutput { logits, value }
    }

    fn total_loss(outputs: &[ModelOutput], batch: &PooledBatch) -> f32 {
        policy_value_loss(outputs, batch, 0.5, 0.01).0.total
    }

    #[test]
    fn test_masked_softmax_zeroes_illegal() {
        let mask = mask_of(&[1, 3]);
        let mut logits = vec![5.0; ACTION_SPACE_SIZE];
        logits[3] = 5.0 + 2.0f32.ln();
        let p = masked_softmax(&logits, &mask, 1.0);
        assert_eq!(p[0], 0.0);
        assert!((p[1] - 1.0 / 3.0).abs() < 1e-6);
        assert!((p[3] - 2.0 / 3.0).abs() < 1e-6);
        assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_temperature_sharpens() {
        let mask = mask_of(&[0, 1]);
        let mut logits = vec![0.0; ACTION_SPACE_SIZE];
        logits[1] = 1.0;
        let warm = masked_softmax(&logits, &mask, 2.0);
        let cold = masked_softmax(&logits, &mask, 0.5);
        assert!(cold[1] > warm[1]);
    }

    #[test]
    fn test_uniform_policy_entropy() {
        let mask = mask_of(&[0, 1, 2, 3]);
        let batch = batch_of(vec![mask], vec![2], vec![1.0], vec![0.0]);
        let (loss, _) = policy_value_loss(&[output(vec![0.0; ACTION_SPACE_SIZE], 0.0)], &batch, 0.5, 0.01);
        assert!((loss.entropy - 4.0f32.ln()).abs() < 1e-5);
        assert!((loss.policy - 4.0f32.ln()).abs() < 1e-5);
        assert_eq!(loss.value, 0.0);
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let masks = vec![mask_of(&[0, 5, 9]), mask_of(&[2, 3])];
        let batch = batch_of(masks, vec![5, 3], vec![0.8, -1.2], vec![0.4, -0.3]);

        let mut first = vec![0.0; ACTION_SPACE_SIZE];
        first[0] = 0.3;
        first[5] = -0.2;
        first[9] = 0.5;
        let mut second = vec![0.0; ACTION_SPACE_SIZE];
        second[2] = 1.0;
        second[3] = -0.5;
        let outputs = vec![output(first, 0.1), output(second, -0.6)];

        let (_, grads) = policy_value_loss(&outputs, &batch, 0.5, 0.01);
        let h = 1e-2;

        for (i, j) in [(0, 0), (0, 5), (0, 9), (1, 2), (1, 3)] {
            let mut plus = outputs.clone();
            plus[i].logits[j] += h;
            let mut minus = outputs.clone();
            minus[i].logits[j] -= h;
            let numeric = (total_loss(&plus, &batch) - total_loss(&minus, &batch)) / (2.0 * h);
            assert!(
                (numeric - grads[i].logits[j]).abs() < 1e-3,
                "logit ({i}, {j}): numeric {numeric} vs {}",
                grads[i].logits[j]
            );
        }

        for i in 0..2 {
            let mut plus = outputs.clone();
            plus[i].value += h;
            let mut minus = outputs.clone();
            minus[i].value -= h;
            let numeric = (total_loss(&plus, &batch) - total_loss(&minus, &batch)) / (2.0 * h);
            assert!((numeric - grads[i].value).abs() < 1e-3);
        }

        // masked entries never receive gradient
        assert_eq!(grads[0].logits[1], 0.0);
        assert_eq!(grads[1].logits[0], 0.0);
    }
}
