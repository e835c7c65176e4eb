//! The shared table: card↔slot bijection, token matrix, ready gate.
//!
//! The table is the one structure every thread touches, so all card and
//! token accounting lives behind a single internal lock and every public
//! operation is atomic. Removing a card strips the tokens on its slot in
//! the same critical section, which keeps token counts and candidate
//! snapshots consistent with the table's actual contents at all times.
//! A player can never observe a token on an empty slot.
//!
//! The ready gate is a separate atomic so players can check it without
//! contending on the lock. Only the dealer toggles it.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::{CardId, PlayerId, SlotId};

/// A snapshot of the cards behind one player's placed tokens.
pub type Candidate = SmallVec<[CardId; 4]>;

/// Outcome of a player toggling a token on a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenToggle {
    /// A token was placed. `candidate` is `Some` exactly when this
    /// placement used the player's last token, carrying the atomic
    /// snapshot of the full candidate group.
    Placed { candidate: Option<Candidate> },
    /// The player's existing token on this slot was removed.
    Removed,
    /// Nothing happened: empty slot, or no token budget left.
    Rejected,
}

struct TableInner {
    /// Slot index → card. `None` for empty slots.
    slot_to_card: Vec<Option<CardId>>,
    /// Reverse lookup of the bijection above.
    card_to_slot: FxHashMap<CardId, SlotId>,
    /// Token matrix, indexed `[slot][player]`.
    tokens: Vec<Vec<bool>>,
    /// Tokens currently placed per player.
    token_counts: Vec<usize>,
}

/// The shared table. Cloned across threads via `Arc`.
pub struct Table {
    inner: Mutex<TableInner>,
    ready: AtomicBool,
    slot_count: usize,
    player_count: usize,
    feature_size: usize,
}

impl Table {
    /// Create an empty table.
    #[must_use]
    pub fn new(slot_count: usize, player_count: usize, feature_size: usize) -> Self {
        Self {
            inner: Mutex::new(TableInner {
                slot_to_card: vec![None; slot_count],
                card_to_slot: FxHashMap::default(),
                tokens: vec![vec![false; player_count]; slot_count],
                token_counts: vec![0; player_count],
            }),
            ready: AtomicBool::new(false),
            slot_count,
            player_count,
            feature_size,
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// True when players may legally act on slots (not mid-reshuffle).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Toggle the ready gate. Dealer only.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// Place a card on an empty slot. Dealer only.
    ///
    /// Returns false (and does nothing) if the slot is occupied or the
    /// card is already somewhere on the table.
    pub fn place_card(&self, card: CardId, slot: SlotId) -> bool {
        let mut inner = self.inner.lock();
        if inner.slot_to_card[slot.index()].is_some() {
            debug_assert!(false, "placing {card} on occupied {slot}");
            return false;
        }
        if inner.card_to_slot.contains_key(&card) {
            debug_assert!(false, "{card} is already on the table");
            return false;
        }
        inner.slot_to_card[slot.index()] = Some(card);
        inner.card_to_slot.insert(card, slot);
        true
    }

    /// Remove the card at a slot, stripping every token on it first.
    ///
    /// This is the single reconciliation point for card removal: token
    /// budgets are restored in the same critical section, so no player can
    /// observe a token without its card. Returns the removed card, along
    /// with the players whose token was stripped.
    pub fn remove_card(&self, slot: SlotId) -> Option<(CardId, SmallVec<[PlayerId; 4]>)> {
        let mut inner = self.inner.lock();
        let card = inner.slot_to_card[slot.index()].take()?;
        inner.card_to_slot.remove(&card);
        let mut stripped = SmallVec::new();
        for player in 0..self.player_count {
            if std::mem::take(&mut inner.tokens[slot.index()][player]) {
                inner.token_counts[player] -= 1;
                stripped.push(PlayerId::new(player as u8));
            }
        }
        Some((card, stripped))
    }

    /// Place a token for `player` on `slot`.
    ///
    /// Fails if the slot is empty, the player already has a token there,
    /// or the player has no token budget left.
    pub fn place_token(&self, player: PlayerId, slot: SlotId) -> bool {
        let mut inner = self.inner.lock();
        self.place_token_locked(&mut inner, player, slot)
    }

    /// Remove `player`'s token from `slot`, if present.
    pub fn remove_token(&self, player: PlayerId, slot: SlotId) -> bool {
        let mut inner = self.inner.lock();
        if std::mem::take(&mut inner.tokens[slot.index()][player.index()]) {
            inner.token_counts[player.index()] -= 1;
            true
        } else {
            false
        }
    }

    /// Player-side token toggle, atomic with the candidate snapshot.
    ///
    /// If placing this token exhausts the player's budget, the returned
    /// `Placed.candidate` carries the cards behind all of the player's
    /// tokens, captured in the same critical section as the placement.
    pub fn toggle_token(&self, player: PlayerId, slot: SlotId) -> TokenToggle {
        let mut inner = self.inner.lock();
        if inner.tokens[slot.index()][player.index()] {
            inner.tokens[slot.index()][player.index()] = false;
            inner.token_counts[player.index()] -= 1;
            return TokenToggle::Removed;
        }
        if !self.place_token_locked(&mut inner, player, slot) {
            return TokenToggle::Rejected;
        }
        let candidate = if inner.token_counts[player.index()] == self.feature_size {
            Some(self.candidate_locked(&inner, player))
        } else {
            None
        };
        TokenToggle::Placed { candidate }
    }

    /// Cards behind `player`'s tokens, in slot order, if the player still
    /// has a full candidate. Used for the under-lock re-check before a
    /// submission.
    #[must_use]
    pub fn candidate_of(&self, player: PlayerId) -> Option<Candidate> {
        let inner = self.inner.lock();
        if inner.token_counts[player.index()] == self.feature_size {
            Some(self.candidate_locked(&inner, player))
        } else {
            None
        }
    }

    /// True iff every card in `cards` is still on the table with
    /// `player`'s token on its slot. The dealer checks this before
    /// verifying a submission, making stale submissions harmless.
    #[must_use]
    pub fn holds_candidate(&self, player: PlayerId, cards: &[CardId]) -> bool {
        let inner = self.inner.lock();
        cards.iter().all(|card| {
            inner
                .card_to_slot
                .get(card)
                .is_some_and(|slot| inner.tokens[slot.index()][player.index()])
        })
    }

    /// Tokens the player may still place.
    #[must_use]
    pub fn available_tokens(&self, player: PlayerId) -> usize {
        self.feature_size - self.inner.lock().token_counts[player.index()]
    }

    /// Whether `player` has a token on `slot`.
    #[must_use]
    pub fn has_token(&self, player: PlayerId, slot: SlotId) -> bool {
        self.inner.lock().tokens[slot.index()][player.index()]
    }

    /// Players holding a token on `slot`.
    #[must_use]
    pub fn tokens_at(&self, slot: SlotId) -> SmallVec<[PlayerId; 4]> {
        let inner = self.inner.lock();
        (0..self.player_count)
            .filter(|&p| inner.tokens[slot.index()][p])
            .map(|p| PlayerId::new(p as u8))
            .collect()
    }

    /// Remove every token from the table.
    pub fn strip_all_tokens(&self) {
        let mut inner = self.inner.lock();
        for row in &mut inner.tokens {
            row.fill(false);
        }
        inner.token_counts.fill(0);
    }

    /// The card currently at `slot`.
    #[must_use]
    pub fn card_at(&self, slot: SlotId) -> Option<CardId> {
        self.inner.lock().slot_to_card[slot.index()]
    }

    /// The slot currently holding `card`.
    #[must_use]
    pub fn slot_of(&self, card: CardId) -> Option<SlotId> {
        self.inner.lock().card_to_slot.get(&card).copied()
    }

    /// Number of cards on the table.
    #[must_use]
    pub fn count_cards(&self) -> usize {
        self.inner.lock().card_to_slot.len()
    }

    /// Snapshot of every card on the table.
    #[must_use]
    pub fn cards_on_table(&self) -> Vec<CardId> {
        self.inner.lock().slot_to_card.iter().flatten().copied().collect()
    }

    /// Slots not currently holding a card.
    #[must_use]
    pub fn empty_slots(&self) -> Vec<SlotId> {
        let inner = self.inner.lock();
        (0..self.slot_count)
            .filter(|&i| inner.slot_to_card[i].is_none())
            .map(|i| SlotId::new(i as u8))
            .collect()
    }

    fn place_token_locked(&self, inner: &mut TableInner, player: PlayerId, slot: SlotId) -> bool {
        if inner.slot_to_card[slot.index()].is_none() {
            return false;
        }
        if inner.tokens[slot.index()][player.index()] {
            return false;
        }
        if inner.token_counts[player.index()] >= self.feature_size {
            return false;
        }
        inner.tokens[slot.index()][player.index()] = true;
        inner.token_counts[player.index()] += 1;
        true
    }

    fn candidate_locked(&self, inner: &TableInner, player: PlayerId) -> Candidate {
        let mut cards = Candidate::new();
        for slot in 0..self.slot_count {
            if inner.tokens[slot][player.index()] {
                // Token rows are cleared with their card, so the slot is
                // guaranteed occupied here.
                cards.push(inner.slot_to_card[slot].expect("token on empty slot"));
            }
        }
        cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        // 4 slots, 2 players, sets of 3
        let t = Table::new(4, 2, 3);
        for i in 0..4 {
            assert!(t.place_card(CardId::new(10 + i), SlotId::new(i as u8)));
        }
        t
    }

    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);

    #[test]
    fn test_card_slot_bijection() {
        let t = table();
        assert_eq!(t.count_cards(), 4);
        assert_eq!(t.card_at(SlotId::new(2)), Some(CardId::new(12)));
        assert_eq!(t.slot_of(CardId::new(12)), Some(SlotId::new(2)));
        assert!(t.empty_slots().is_empty());

        let (card, stripped) = t.remove_card(SlotId::new(2)).unwrap();
        assert_eq!(card, CardId::new(12));
        assert!(stripped.is_empty());
        assert_eq!(t.card_at(SlotId::new(2)), None);
        assert_eq!(t.slot_of(CardId::new(12)), None);
        assert_eq!(t.empty_slots(), vec![SlotId::new(2)]);
    }

    #[test]
    fn test_token_budget_enforced() {
        let t = table();
        assert_eq!(t.available_tokens(P0), 3);
        for i in 0..3 {
            assert!(t.place_token(P0, SlotId::new(i)));
        }
        assert_eq!(t.available_tokens(P0), 0);
        // Fourth token rejected
        assert!(!t.place_token(P0, SlotId::new(3)));
        // Other player unaffected
        assert!(t.place_token(P1, SlotId::new(3)));
    }

    #[test]
    fn test_token_requires_card() {
        let t = table();
        t.remove_card(SlotId::new(0));
        assert!(!t.place_token(P0, SlotId::new(0)));
        assert_eq!(t.toggle_token(P0, SlotId::new(0)), TokenToggle::Rejected);
    }

    #[test]
    fn test_toggle_fills_candidate_atomically() {
        let t = table();
        assert_eq!(
            t.toggle_token(P0, SlotId::new(0)),
            TokenToggle::Placed { candidate: None }
        );
        assert_eq!(
            t.toggle_token(P0, SlotId::new(1)),
            TokenToggle::Placed { candidate: None }
        );
        match t.toggle_token(P0, SlotId::new(3)) {
            TokenToggle::Placed { candidate: Some(cards) } => {
                assert_eq!(cards.as_slice(), &[CardId::new(10), CardId::new(11), CardId::new(13)]);
            }
            other => panic!("expected full candidate, got {other:?}"),
        }
        // Toggling an occupied slot removes the token
        assert_eq!(t.toggle_token(P0, SlotId::new(1)), TokenToggle::Removed);
        assert_eq!(t.available_tokens(P0), 1);
        assert_eq!(t.candidate_of(P0), None);
    }

    #[test]
    fn test_remove_card_strips_tokens_and_restores_budget() {
        let t = table();
        t.place_token(P0, SlotId::new(1));
        t.place_token(P1, SlotId::new(1));
        t.place_token(P1, SlotId::new(2));

        let (_, stripped) = t.remove_card(SlotId::new(1)).unwrap();
        assert_eq!(stripped.as_slice(), &[P0, P1]);
        assert_eq!(t.available_tokens(P0), 3);
        assert_eq!(t.available_tokens(P1), 2);
        assert!(!t.has_token(P1, SlotId::new(1)));
        assert!(t.has_token(P1, SlotId::new(2)));
    }

    #[test]
    fn test_holds_candidate_detects_staleness() {
        let t = table();
        for i in 0..3 {
            t.place_token(P0, SlotId::new(i));
        }
        let cards = t.candidate_of(P0).unwrap();
        assert!(t.holds_candidate(P0, &cards));

        // Card removed out from under the candidate
        t.remove_card(SlotId::new(1));
        assert!(!t.holds_candidate(P0, &cards));
    }

    #[test]
    fn test_strip_all_tokens() {
        let t = table();
        t.place_token(P0, SlotId::new(0));
        t.place_token(P1, SlotId::new(1));
        t.strip_all_tokens();
        assert!(t.tokens_at(SlotId::new(0)).is_empty());
        assert_eq!(t.available_tokens(P0), 3);
        assert_eq!(t.available_tokens(P1), 3);
    }

    #[test]
    fn test_ready_gate() {
        let t = table();
        assert!(!t.is_ready());
        t.set_ready(true);
        assert!(t.is_ready());
    }
}
