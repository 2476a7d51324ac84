//! Legal-action masks over the 600-entry action space.

use serde::{Deserialize, Serialize};

use super::{ActionSpace, ACTION_SPACE_SIZE};

/// Boolean vector over the action space.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegalMask {
    bits: Vec<bool>,
}

impl LegalMask {
    /// Mask with every action disallowed.
    #[must_use]
    pub fn none() -> Self {
        Self {
            bits: vec![false; ACTION_SPACE_SIZE],
        }
    }

    /// Build from raw bits, which must cover the full action space.
    #[must_use]
    pub fn from_bits(bits: Vec<bool>) -> Option<Self> {
        (bits.len() == ACTION_SPACE_SIZE).then_some(Self { bits })
    }

    pub(crate) fn allow(&mut self, source: usize, target: usize) {
        if let Ok(idx) = ActionSpace::to_index(source, target) {
            self.bits[idx] = true;
        }
    }

    /// `false` for out-of-range indices.
    #[must_use]
    pub fn is_legal(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// True when no action is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    /// Legal indices, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }
}
