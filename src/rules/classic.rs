//! Classic Set rules.
//!
//! A card encodes `feature_count` features, each taking one of
//! `feature_size` values; the card ID is the base-`feature_size` encoding
//! of its feature vector. A group of `feature_size` cards is a set iff,
//! for every feature, the values are either all the same or all different.
//! With the standard geometry (4 features of 3 values) this yields the
//! 81-card deck of the physical game.

use smallvec::SmallVec;

use crate::core::CardId;

use super::Rules;

/// Classic all-same-or-all-different rules.
#[derive(Clone, Debug)]
pub struct ClassicRules {
    feature_size: usize,
    feature_count: usize,
}

impl ClassicRules {
    /// Create rules for `feature_count` features of `feature_size` values.
    #[must_use]
    pub fn new(feature_size: usize, feature_count: usize) -> Self {
        assert!(feature_size >= 2, "features need at least 2 values");
        assert!(feature_count >= 1, "cards need at least 1 feature");
        Self {
            feature_size,
            feature_count,
        }
    }

    /// The standard game: 4 features, 3 values, 81 cards, sets of 3.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(3, 4)
    }

    /// Size of the full deck this encoding spans.
    #[must_use]
    pub fn deck_size(&self) -> usize {
        self.feature_size.pow(self.feature_count as u32)
    }

    /// The value of `feature` on `card`.
    fn feature_value(&self, card: CardId, feature: usize) -> u32 {
        (card.raw() / (self.feature_size as u32).pow(feature as u32)) % self.feature_size as u32
    }
}

impl Rules for ClassicRules {
    fn group_size(&self) -> usize {
        self.feature_size
    }

    fn test_set(&self, cards: &[CardId]) -> bool {
        if cards.len() != self.feature_size {
            return false;
        }
        for feature in 0..self.feature_count {
            let mut values: SmallVec<[u32; 4]> =
                cards.iter().map(|&c| self.feature_value(c, feature)).collect();
            values.sort_unstable();
            let all_same = values.first() == values.last();
            values.dedup();
            let all_different = values.len() == cards.len();
            if !all_same && !all_different {
                return false;
            }
        }
        true
    }
}
