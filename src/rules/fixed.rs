//! Fixed-answer rules for deterministic tests.

use smallvec::SmallVec;

use crate::core::CardId;
use crate::table::Candidate;

use super::Rules;

/// Rules backed by an explicit allow-list of valid sets.
///
/// `test_set` ignores card order. Scenario tests use this to script which
/// candidate groups the dealer will accept.
#[derive(Clone, Debug, Default)]
pub struct FixedRules {
    group_size: usize,
    valid: Vec<Candidate>,
}

impl FixedRules {
    /// Rules under which the given groups, and only those, are valid sets.
    #[must_use]
    pub fn new(group_size: usize, valid: impl IntoIterator<Item = Vec<CardId>>) -> Self {
        let valid = valid
            .into_iter()
            .map(|mut cards| {
                assert_eq!(cards.len(), group_size, "valid set of wrong size");
                cards.sort_unstable();
                Candidate::from_vec(cards)
            })
            .collect();
        Self { group_size, valid }
    }

    /// Rules under which no set is ever valid.
    #[must_use]
    pub fn none(group_size: usize) -> Self {
        Self {
            group_size,
            valid: Vec::new(),
        }
    }
}

impl Rules for FixedRules {
    fn group_size(&self) -> usize {
        self.group_size
    }

    fn test_set(&self, cards: &[CardId]) -> bool {
        if cards.len() != self.group_size {
            return false;
        }
        let mut sorted: SmallVec<[CardId; 4]> = cards.iter().copied().collect();
        sorted.sort_unstable();
        self.valid.iter().any(|v| v.as_slice() == sorted.as_slice())
    }

    fn find_sets(&self, pool: &[CardId], limit: usize) -> Vec<Candidate> {
        self.valid
            .iter()
            .filter(|v| v.iter().all(|card| pool.contains(card)))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(ids: &[u32]) -> Vec<CardId> {
        ids.iter().copied().map(CardId::new).collect()
    }

    #[test]
    fn test_allow_list_is_order_insensitive() {
        let rules = FixedRules::new(3, [cards(&[5, 1, 9])]);
        assert!(rules.test_set(&cards(&[1, 5, 9])));
        assert!(rules.test_set(&cards(&[9, 1, 5])));
        assert!(!rules.test_set(&cards(&[1, 5, 8])));
    }

    #[test]
    fn test_find_sets_requires_full_containment() {
        let rules = FixedRules::new(3, [cards(&[1, 2, 3]), cards(&[4, 5, 6])]);
        assert!(rules.has_set(&cards(&[6, 5, 4, 9])));
        assert!(!rules.has_set(&cards(&[1, 2, 4, 5])));
        assert_eq!(rules.find_sets(&cards(&[1, 2, 3, 4, 5, 6]), 10).len(), 2);
    }

    #[test]
    fn test_none_never_matches() {
        let rules = FixedRules::none(3);
        assert!(!rules.has_set(&cards(&[1, 2, 3, 4, 5, 6])));
    }
}
