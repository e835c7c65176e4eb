//! The `Rules` trait: set validity and set search.
//!
//! The dealer calls `test_set` to verify submissions and `find_sets` with
//! `limit = 1` as an existence probe for the reshuffle and end-of-game
//! conditions. Implementations must be `Send + Sync`: the trait object is
//! shared between the dealer and test harnesses.

use smallvec::SmallVec;

use crate::core::CardId;
use crate::table::Candidate;

/// Set validity and search, as seen by the dealer.
pub trait Rules: Send + Sync {
    /// Number of cards that constitute one set.
    fn group_size(&self) -> usize;

    /// Is this exact group of cards a valid set?
    fn test_set(&self, cards: &[CardId]) -> bool;

    /// Find up to `limit` valid sets within `pool`.
    ///
    /// The default implementation enumerates groups of `group_size` cards
    /// and filters with `test_set`, stopping at `limit`.
    fn find_sets(&self, pool: &[CardId], limit: usize) -> Vec<Candidate> {
        let mut found = Vec::new();
        if limit == 0 || pool.len() < self.group_size() {
            return found;
        }
        let mut group: Candidate = SmallVec::new();
        search_groups(self, pool, 0, &mut group, limit, &mut found);
        found
    }

    /// True iff `pool` contains at least one valid set.
    fn has_set(&self, pool: &[CardId]) -> bool {
        !self.find_sets(pool, 1).is_empty()
    }
}

/// Depth-first enumeration of card groups with early exit at `limit`.
fn search_groups<R: Rules + ?Sized>(
    rules: &R,
    pool: &[CardId],
    start: usize,
    group: &mut Candidate,
    limit: usize,
    found: &mut Vec<Candidate>,
) {
    if group.len() == rules.group_size() {
        if rules.test_set(group) {
            found.push(group.clone());
        }
        return;
    }
    let remaining = rules.group_size() - group.len();
    for i in start..pool.len() {
        if pool.len() - i < remaining {
            break;
        }
        group.push(pool[i]);
        search_groups(rules, pool, i + 1, group, limit, found);
        group.pop();
        if found.len() >= limit {
            return;
        }
    }
}
