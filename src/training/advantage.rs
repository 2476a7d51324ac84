//! Generalized Advantage Estimation and pooled normalization.

/// Guard added to the standard deviation when normalizing.
pub const NORMALIZE_EPSILON: f32 = 1e-8;

/// GAE over one episode, computed backward.
///
/// ```text
/// delta_t = r_t + gamma * V_{t+1} - V_t      (V after the last step = 0)
/// A_t     = delta_t + gamma * lambda * A_{t+1}
/// R_t     = A_t + V_t
/// ```
///
/// Returns `(advantages, returns)`.
#[must_use]
pub fn compute_gae(rewards: &[f32], values: &[f32], gamma: f32, lambda: f32) -> (Vec<f32>, Vec<f32>) {
    debug_assert_eq!(rewards.len(), values.len());
    let n = rewards.len();
    let mut advantages = vec![0.0; n];
    let mut next_value = 0.0;
    let mut next_advantage = 0.0;

    for t in (0..n).rev() {
        let delta = rewards[t] + gamma * next_value - values[t];
        next_advantage = delta + gamma * lambda * next_advantage;
        advantages[t] = next_advantage;
        next_value = values[t];
    }

    let returns = advantages.iter().zip(values).map(|(a, v)| a + v).collect();
    (advantages, returns)
}

/// Normalize in place to zero mean and unit (sample) standard deviation.
///
/// Call once on the advantages pooled from every episode since the last
/// update, never per episode.
pub fn normalize_advantages(advantages: &mut [f32]) {
    let n = advantages.len();
    if n == 0 {
        return;
    }
    let mean = advantages.iter().sum::<f32>() / n as f32;
    let std = if n < 2 {
        0.0
    } else {
        let var = advantages.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / (n - 1) as f32;
        var.sqrt()
    };
    for a in advantages.iter_mut() {
        *a = (*a - mean) / (std + NORMALIZE_EPSILON);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_single_step() {
        let (adv, ret) = compute_gae(&[2.0], &[0.5], 0.99, 0.95);
        assert!(close(&adv, &[1.5]));
        assert!(close(&ret, &[2.0]));
    }

    #[test]
    fn test_empty_episode() {
        let (adv, ret) = compute_gae(&[], &[], 0.99, 0.95);
        assert!(adv.is_empty() && ret.is_empty());
    }

    #[test]
    fn test_normalize_sample_std() {
        let mut a = [1.0, 2.0, 3.0];
        normalize_advantages(&mut a);
        // mean 2, sample std 1
        assert!(close(&a, &[-1.0, 0.0, 1.0]));
    }

    #[test]
    fn test_normalize_single_value_is_zero() {
        let mut a = [4.2];
        normalize_advantages(&mut a);
        assert_eq!(a, [0.0]);
    }
}
