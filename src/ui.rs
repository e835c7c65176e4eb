//! The display surface.
//!
//! All UI calls are fire-and-forget notifications; the engine never reads
//! state back from the display. `NullUi` discards everything, `LogUi`
//! routes notifications to the `log` facade, and `RecordingUi` captures
//! the notification stream so tests can assert on it.

use parking_lot::Mutex;
use std::time::Duration;

use crate::core::{CardId, PlayerId, SlotId};

/// Display notifications emitted by the engine.
pub trait GameUi: Send + Sync {
    /// A card was dealt onto a slot.
    fn place_card(&self, card: CardId, slot: SlotId);
    /// The card at a slot was removed.
    fn remove_card(&self, slot: SlotId);
    /// A player's score changed.
    fn set_score(&self, player: PlayerId, score: u32);
    /// Countdown display refresh. `warning` is set near the deadline.
    fn set_countdown(&self, remaining: Duration, warning: bool);
    /// Freeze display refresh; zero remaining clears it.
    fn set_freeze(&self, player: PlayerId, remaining: Duration);
    /// Final winner announcement (ties allowed).
    fn announce_winner(&self, players: &[PlayerId]);
}

/// UI that discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullUi;

impl GameUi for NullUi {
    fn place_card(&self, _card: CardId, _slot: SlotId) {}
    fn remove_card(&self, _slot: SlotId) {}
    fn set_score(&self, _player: PlayerId, _score: u32) {}
    fn set_countdown(&self, _remaining: Duration, _warning: bool) {}
    fn set_freeze(&self, _player: PlayerId, _remaining: Duration) {}
    fn announce_winner(&self, _players: &[PlayerId]) {}
}

/// UI that routes notifications to the `log` facade.
///
/// Countdown and freeze refreshes arrive once per tick, so they go to
/// `trace`; discrete events go to `debug`/`info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogUi;

impl GameUi for LogUi {
    fn place_card(&self, card: CardId, slot: SlotId) {
        log::debug!("ui: {card} dealt to {slot}");
    }

    fn remove_card(&self, slot: SlotId) {
        log::debug!("ui: card removed from {slot}");
    }

    fn set_score(&self, player: PlayerId, score: u32) {
        log::info!("ui: {player} score is now {score}");
    }

    fn set_countdown(&self, remaining: Duration, warning: bool) {
        log::trace!("ui: countdown {remaining:?} (warning: {warning})");
    }

    fn set_freeze(&self, player: PlayerId, remaining: Duration) {
        log::trace!("ui: {player} frozen for {remaining:?}");
    }

    fn announce_winner(&self, players: &[PlayerId]) {
        log::info!("ui: winners {players:?}");
    }
}

/// One captured UI notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    PlaceCard(CardId, SlotId),
    RemoveCard(SlotId),
    Score(PlayerId, u32),
    Countdown(Duration, bool),
    Freeze(PlayerId, Duration),
    Winners(Vec<PlayerId>),
}

/// UI that records the notification stream, for tests.
#[derive(Debug, Default)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingUi {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every notification so far.
    #[must_use]
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().clone()
    }

    /// The announced winner list, if the game has ended.
    #[must_use]
    pub fn winners(&self) -> Option<Vec<PlayerId>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            UiEvent::Winners(w) => Some(w.clone()),
            _ => None,
        })
    }

    /// The most recent score shown for a player.
    #[must_use]
    pub fn last_score(&self, player: PlayerId) -> Option<u32> {
        self.events.lock().iter().rev().find_map(|e| match e {
            UiEvent::Score(p, s) if *p == player => Some(*s),
            _ => None,
        })
    }

    /// The most recent freeze duration shown for a player.
    #[must_use]
    pub fn last_freeze(&self, player: PlayerId) -> Option<Duration> {
        self.events.lock().iter().rev().find_map(|e| match e {
            UiEvent::Freeze(p, d) if *p == player => Some(*d),
            _ => None,
        })
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().push(event);
    }
}

impl GameUi for RecordingUi {
    fn place_card(&self, card: CardId, slot: SlotId) {
        self.push(UiEvent::PlaceCard(card, slot));
    }

    fn remove_card(&self, slot: SlotId) {
        self.push(UiEvent::RemoveCard(slot));
    }

    fn set_score(&self, player: PlayerId, score: u32) {
        self.push(UiEvent::Score(player, score));
    }

    fn set_countdown(&self, remaining: Duration, warning: bool) {
        self.push(UiEvent::Countdown(remaining, warning));
    }

    fn set_freeze(&self, player: PlayerId, remaining: Duration) {
        self.push(UiEvent::Freeze(player, remaining));
    }

    fn announce_winner(&self, players: &[PlayerId]) {
        self.push(UiEvent::Winners(players.to_vec()));
    }
}
