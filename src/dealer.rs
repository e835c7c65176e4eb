//! The dealer: authoritative timer loop, set verification, dealing,
//! reshuffling, and termination.
//!
//! The dealer owns the deck, the scores, and the receiving end of the
//! submission mailbox. Its loop alternates dealing rounds with a timer
//! loop whose shape depends on the configured `TimeoutPolicy`:
//!
//! - `Deadline`: countdown to a reshuffle deadline, recollecting the
//!   whole table when it passes;
//! - `Elapsed` / `Hidden`: no deadline; the table is reshuffled whenever
//!   no legal set remains on it, with `Elapsed` additionally displaying
//!   time since the last match.
//!
//! Each tick the dealer services at most one submission taken from the
//! rendezvous mailbox, so verifications are never interleaved. The game
//! ends on an external termination request or when no legal set exists
//! in the deck and table combined.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::core::{CardId, GameConfig, GameRng, PlayerId, PlayerMap, SlotId, TimeoutPolicy};
use crate::player::PlayerHandle;
use crate::protocol::{Submission, Verdict};
use crate::rules::Rules;
use crate::table::Table;
use crate::ui::GameUi;

/// One seated player, as the dealer sees it: the input handle (for the
/// final shutdown) and the worker's thread.
pub struct Seat {
    /// Handle used to request the worker's stop.
    pub handle: PlayerHandle,
    /// The worker thread, joined during the winner announcement. `None`
    /// for seats driven synchronously in tests.
    pub thread: Option<JoinHandle<()>>,
}

/// Final outcome of a completed game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameReport {
    /// Final score per player.
    pub scores: PlayerMap<u32>,
    /// Every player whose score equals the maximum (ties allowed).
    pub winners: Vec<PlayerId>,
}

/// The supervising worker.
pub struct Dealer {
    config: GameConfig,
    table: Arc<Table>,
    rules: Arc<dyn Rules>,
    ui: Arc<dyn GameUi>,
    submissions: Receiver<Submission>,
    terminate: Arc<AtomicBool>,
    seats: Vec<Seat>,
    /// Cards not yet dealt. Matched cards leave the game entirely;
    /// collected cards return here.
    deck: Vec<CardId>,
    scores: PlayerMap<u32>,
    /// Freeze expiry per player, kept for the freeze display only. The
    /// authoritative freeze lives in the owning player worker.
    freezes: PlayerMap<Option<Instant>>,
    rng: GameRng,
    reshuffle_at: Instant,
    /// Baseline for the elapsed-time display, reset on every match.
    elapsed_base: Instant,
}

impl Dealer {
    /// Build a dealer over a fresh deck of `config.deck_size` cards.
    /// Cards already sitting on the table are excluded from the deck, so
    /// a pre-seeded table keeps the conservation invariant.
    pub fn new(
        config: GameConfig,
        table: Arc<Table>,
        rules: Arc<dyn Rules>,
        ui: Arc<dyn GameUi>,
        submissions: Receiver<Submission>,
        terminate: Arc<AtomicBool>,
        seats: Vec<Seat>,
    ) -> Self {
        let player_count = config.player_count();
        let deck = (0..config.deck_size as u32)
            .map(CardId::new)
            .filter(|&card| table.slot_of(card).is_none())
            .collect();
        let rng = GameRng::new(config.rng_seed);
        let now = Instant::now();
        Self {
            config,
            table,
            rules,
            ui,
            submissions,
            terminate,
            seats,
            deck,
            scores: PlayerMap::with_value(player_count, 0),
            freezes: PlayerMap::with_value(player_count, None),
            rng,
            reshuffle_at: now,
            elapsed_base: now,
        }
    }

    /// The dealer's main loop: deal, run the timer, recollect; repeat
    /// until termination is requested or no legal set remains anywhere.
    /// Ends by announcing the winners and shutting the players down.
    pub fn run(&mut self) -> GameReport {
        log::info!("dealer thread starting");
        while !self.should_finish() {
            self.deal_round();
            self.run_timer();
            if !self.terminated() {
                self.table.set_ready(false);
                self.collect_all();
            }
        }
        let report = self.announce_winners();
        log::info!("dealer thread terminated");
        report
    }

    /// External termination requested?
    fn terminated(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    /// Terminate if requested externally, or if deck ∪ table no longer
    /// contains any legal set (the exhaustive end condition).
    fn should_finish(&self) -> bool {
        if self.terminated() {
            return true;
        }
        let mut pool = self.table.cards_on_table();
        pool.extend_from_slice(&self.deck);
        !self.rules.has_set(&pool)
    }

    /// Close the table, fill every empty slot from the shuffled deck
    /// (dealing fewer if the deck runs out), and reopen it.
    fn deal_round(&mut self) {
        self.table.set_ready(false);
        self.place_cards_on_table();
        self.table.set_ready(true);
    }

    /// Fill empty slots, in randomized slot order, from the shuffled
    /// deck. A no-op when the table is full or the deck is empty.
    fn place_cards_on_table(&mut self) {
        if self.deck.is_empty() {
            return;
        }
        let mut empty = self.table.empty_slots();
        if empty.is_empty() {
            return;
        }
        self.rng.shuffle(&mut self.deck);
        self.rng.shuffle(&mut empty);
        for slot in empty {
            match self.deck.pop() {
                Some(card) => {
                    self.table.place_card(card, slot);
                    self.ui.place_card(card, slot);
                }
                // Deck exhausted: deal fewer cards.
                None => break,
            }
        }
        log::debug!("dealt; {} cards left in deck", self.deck.len());
    }

    /// Dispatch on the configured timer policy.
    fn run_timer(&mut self) {
        match self.config.timeout {
            TimeoutPolicy::Deadline(timeout) => self.run_deadline(timeout),
            TimeoutPolicy::Elapsed => self.run_untimed(true),
            TimeoutPolicy::Hidden => self.run_untimed(false),
        }
    }

    /// Deadline mode: tick until the reshuffle deadline passes, then let
    /// the caller recollect the whole table.
    fn run_deadline(&mut self, timeout: Duration) {
        self.reshuffle_at = Instant::now() + timeout;
        while !self.terminated() && Instant::now() < self.reshuffle_at {
            self.service_tick();
            self.refresh_countdown();
            self.refresh_freezes();
            self.place_cards_on_table();
        }
        self.refresh_countdown();
    }

    /// No-deadline mode: reshuffle only when the table holds no legal
    /// set. With `show_elapsed`, the countdown display shows time since
    /// the last match. The loop falls through once no set remains
    /// anywhere (the caller then terminates) or termination is requested.
    fn run_untimed(&mut self, show_elapsed: bool) {
        self.reshuffle_until_set_visible();
        self.elapsed_base = Instant::now();
        while !self.should_finish() && self.rules.has_set(&self.table.cards_on_table()) {
            self.service_tick();
            if show_elapsed {
                self.ui.set_countdown(self.elapsed_base.elapsed(), false);
            }
            self.refresh_freezes();
            self.place_cards_on_table();
            self.reshuffle_until_set_visible();
        }
    }

    /// Recollect and redeal until at least one legal set is on the
    /// table, or no set exists anywhere.
    fn reshuffle_until_set_visible(&mut self) {
        while !self.should_finish() && !self.rules.has_set(&self.table.cards_on_table()) {
            self.table.set_ready(false);
            self.collect_all();
            self.deal_round();
        }
    }

    /// One mailbox poll: sleeps at most one tick, services at most one
    /// submission.
    fn service_tick(&mut self) {
        match self.submissions.recv_timeout(self.config.tick) {
            Ok(submission) => self.serve_submission(submission),
            Err(RecvTimeoutError::Timeout) => {}
            // Every player worker is gone; nothing left to supervise.
            Err(RecvTimeoutError::Disconnected) => self.terminate.store(true, Ordering::Release),
        }
    }

    /// Verify one submission and reply with the verdict. The reply is
    /// sent last in every branch: it is the signal that unblocks the
    /// submitting player.
    pub fn serve_submission(&mut self, submission: Submission) {
        let player = submission.player;
        if !self.table.holds_candidate(player, &submission.cards) {
            // The table mutated between the snapshot and now; the
            // submission no longer stands. Structurally nothing to undo.
            log::debug!("stale submission from {player}");
            let _ = submission.reply.send(Verdict::stale());
            return;
        }
        if self.rules.test_set(&submission.cards) {
            self.table.set_ready(false);
            self.scores[player] += 1;
            let score = self.scores[player];
            self.ui.set_score(player, score);
            log::info!("{player} found a set, score {score}");
            self.remove_matched(&submission.cards);
            self.place_cards_on_table();
            self.schedule_freeze(player, self.config.point_freeze);
            if let TimeoutPolicy::Deadline(timeout) = self.config.timeout {
                self.reshuffle_at = Instant::now() + timeout;
            }
            self.elapsed_base = Instant::now();
            self.table.set_ready(true);
            let _ = submission.reply.send(Verdict::point(score, self.config.point_freeze));
        } else {
            log::info!("{player} submitted an invalid set");
            self.schedule_freeze(player, self.config.penalty_freeze);
            let _ = submission
                .reply
                .send(Verdict::penalty(self.config.penalty_freeze));
        }
    }

    fn schedule_freeze(&mut self, player: PlayerId, freeze: Duration) {
        if !freeze.is_zero() {
            self.freezes[player] = Some(Instant::now() + freeze);
        }
    }

    /// Remove the matched cards from the table. Their slots are cleared
    /// in randomized order; token stripping and budget restoration happen
    /// atomically inside the table. Matched cards leave the game.
    fn remove_matched(&mut self, cards: &[CardId]) {
        let mut slots: Vec<SlotId> = cards.iter().filter_map(|&c| self.table.slot_of(c)).collect();
        debug_assert_eq!(slots.len(), cards.len(), "matched card missing from table");
        self.rng.shuffle(&mut slots);
        for slot in slots {
            if self.table.remove_card(slot).is_some() {
                self.ui.remove_card(slot);
            }
        }
    }

    /// Return every card on the table to the deck, clearing slots in
    /// randomized order.
    fn collect_all(&mut self) {
        let mut slots: Vec<SlotId> = SlotId::all(self.table.slot_count()).collect();
        self.rng.shuffle(&mut slots);
        for slot in slots {
            if let Some((card, _stripped)) = self.table.remove_card(slot) {
                self.deck.push(card);
                self.ui.remove_card(slot);
            }
        }
    }

    /// Refresh the countdown display, switching to the warning visual
    /// near the deadline.
    fn refresh_countdown(&self) {
        let remaining = self.reshuffle_at.saturating_duration_since(Instant::now());
        self.ui
            .set_countdown(remaining, remaining <= self.config.warning_time);
    }

    /// Refresh the freeze display of every player still serving one.
    /// Expired entries are unset; the owning worker clears its own
    /// display at expiry.
    fn refresh_freezes(&mut self) {
        let now = Instant::now();
        for (player, entry) in self.freezes.iter_mut() {
            if let Some(expiry) = *entry {
                if expiry > now {
                    self.ui.set_freeze(player, expiry - now);
                } else {
                    *entry = None;
                }
            }
        }
    }

    /// Strip all tokens, publish the winner list, then stop every player
    /// worker in reverse creation order, joining each.
    fn announce_winners(&mut self) -> GameReport {
        self.table.set_ready(false);
        self.table.strip_all_tokens();

        let max = self.scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        let winners: Vec<PlayerId> = self
            .scores
            .iter()
            .filter(|(_, s)| **s == max)
            .map(|(p, _)| p)
            .collect();
        self.ui.announce_winner(&winners);
        log::info!("game over, winners: {winners:?}");

        self.terminate.store(true, Ordering::Release);
        for seat in self.seats.iter_mut().rev() {
            seat.handle.request_stop();
            if let Some(thread) = seat.thread.take() {
                let _ = thread.join();
            }
        }

        GameReport {
            scores: self.scores.clone(),
            winners,
        }
    }

    /// Cards remaining in the deck.
    #[must_use]
    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    /// Current score of a player.
    #[must_use]
    pub fn score(&self, player: PlayerId) -> u32 {
        self.scores[player]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerKind;
    use crate::protocol::submission_mailbox;
    use crate::rules::FixedRules;
    use crate::ui::NullUi;

    fn dealer_with_rules(rules: Arc<dyn Rules>) -> Dealer {
        let config = GameConfig::standard(vec![PlayerKind::Human, PlayerKind::Human])
            .with_geometry(4, 3, 9)
            .with_seed(11);
        let table = Arc::new(Table::new(4, 2, 3));
        let (_tx, rx) = submission_mailbox();
        Dealer::new(
            config,
            table,
            rules,
            Arc::new(NullUi),
            rx,
            Arc::new(AtomicBool::new(false)),
            Vec::new(),
        )
    }

    #[test]
    fn test_deal_round_fills_table_and_opens_it() {
        let mut dealer = dealer_with_rules(Arc::new(FixedRules::none(3)));
        dealer.deal_round();
        assert_eq!(dealer.table.count_cards(), 4);
        assert_eq!(dealer.deck_len(), 5);
        assert!(dealer.table.is_ready());
    }

    #[test]
    fn test_deal_with_exhausted_deck_deals_fewer() {
        let mut dealer = dealer_with_rules(Arc::new(FixedRules::none(3)));
        dealer.deck.truncate(2);
        dealer.deal_round();
        assert_eq!(dealer.table.count_cards(), 2);
        assert_eq!(dealer.deck_len(), 0);
        assert!(dealer.table.is_ready());
    }

    #[test]
    fn test_collect_all_returns_cards_to_deck() {
        let mut dealer = dealer_with_rules(Arc::new(FixedRules::none(3)));
        dealer.deal_round();
        dealer.collect_all();
        assert_eq!(dealer.table.count_cards(), 0);
        assert_eq!(dealer.deck_len(), 9);
    }

    #[test]
    fn test_card_conservation_across_deal_and_collect() {
        let mut dealer = dealer_with_rules(Arc::new(FixedRules::none(3)));
        for _ in 0..5 {
            dealer.deal_round();
            assert_eq!(dealer.deck_len() + dealer.table.count_cards(), 9);
            dealer.collect_all();
            assert_eq!(dealer.deck_len(), 9);
        }
    }

    #[test]
    fn test_should_finish_when_no_set_anywhere() {
        let dealer = dealer_with_rules(Arc::new(FixedRules::none(3)));
        assert!(dealer.should_finish());

        let live = dealer_with_rules(Arc::new(FixedRules::new(
            3,
            [vec![CardId::new(0), CardId::new(1), CardId::new(2)]],
        )));
        assert!(!live.should_finish());
    }

    #[test]
    fn test_announce_winners_with_tie() {
        let mut dealer = dealer_with_rules(Arc::new(FixedRules::none(3)));
        dealer.scores[PlayerId::new(0)] = 2;
        dealer.scores[PlayerId::new(1)] = 2;
        let report = dealer.announce_winners();
        assert_eq!(report.winners, vec![PlayerId::new(0), PlayerId::new(1)]);
        assert!(dealer.terminated());
    }
}
