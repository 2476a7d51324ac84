//! Rolling win/draw statistics over recent episodes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::Player;

/// Fractions of the window won by each player or drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRates {
    pub player_a: f32,
    pub player_b: f32,
    pub draws: f32,
}

/// The outcomes of the most recent `capacity` episodes.
#[derive(Clone, Debug)]
pub struct OutcomeWindow {
    outcomes: VecDeque<Option<Player>>,
    capacity: usize,
}

impl OutcomeWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an episode; `None` is a draw.
    pub fn record(&mut self, winner: Option<Player>) {
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(winner);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn rates(&self) -> OutcomeRates {
        if self.outcomes.is_empty() {
            return OutcomeRates::default();
        }
        let n = self.outcomes.len() as f32;
        let count = |w: Option<Player>| self.outcomes.iter().filter(|&&o| o == w).count() as f32 / n;
        OutcomeRates {
            player_a: count(Some(Player::A)),
            player_b: count(Some(Player::B)),
            draws: count(None),
        }
    }
}

impl Default for OutcomeWindow {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let mut window = OutcomeWindow::new(4);
        window.record(Some(Player::A));
        window.record(Some(Player::A));
        window.record(Some(Player::B));
        window.record(None);
        let rates = window.rates();
        assert_eq!(rates.player_a, 0.5);
        assert_eq!(rates.player_b, 0.25);
        assert_eq!(rates.draws, 0.25);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = OutcomeWindow::new(2);
        window.record(Some(Player::A));
        window.record(Some(Player::B));
        window.record(Some(Player::B));
        assert_eq!(window.len(), 2);
        assert_eq!(window.rates().player_a, 0.0);
        assert_eq!(window.rates().player_b, 1.0);
    }

    #[test]
    fn test_empty_window() {
        let window = OutcomeWindow::default();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 100);
        assert_eq!(window.rates(), OutcomeRates::default());
    }
}
