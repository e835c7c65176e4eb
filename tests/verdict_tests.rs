//! Submission verdict scenarios.
//!
//! These drive `Dealer::serve_submission` directly, with the table
//! seeded by hand, so each verdict branch is observable without threads.

use crossbeam_channel::Receiver;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use set_engine::protocol::{submission_mailbox, verdict_channel, Submission, Verdict, VerdictKind};
use set_engine::{
    CardId, Dealer, FixedRules, GameConfig, GameUi, NullUi, PlayerId, PlayerKind, RecordingUi,
    SlotId, Table,
};

const P0: PlayerId = PlayerId(0);
const P1: PlayerId = PlayerId(1);

struct Fixture {
    dealer: Dealer,
    table: Arc<Table>,
    ui: Arc<RecordingUi>,
}

/// Four cards 0..4 on slots 0..4, empty deck, only {0, 1, 2} valid.
fn fixture() -> Fixture {
    let config = GameConfig::standard(vec![PlayerKind::Human, PlayerKind::Human])
        .with_geometry(4, 3, 4)
        .with_freezes(Duration::from_millis(40), Duration::from_millis(90));
    let table = Arc::new(Table::new(4, 2, 3));
    for i in 0..4u32 {
        table.place_card(CardId::new(i), SlotId::new(i as u8));
    }
    table.set_ready(true);
    let rules = FixedRules::new(3, [vec![CardId::new(0), CardId::new(1), CardId::new(2)]]);
    let ui = Arc::new(RecordingUi::new());
    let (_tx, rx) = submission_mailbox();
    let dealer = Dealer::new(
        config,
        Arc::clone(&table),
        Arc::new(rules),
        Arc::clone(&ui) as Arc<dyn GameUi>,
        rx,
        Arc::new(AtomicBool::new(false)),
        Vec::new(),
    );
    Fixture { dealer, table, ui }
}

/// Place tokens for `player` on `slots` and build the submission the
/// player worker would send, returning the verdict receiver.
fn submit(table: &Table, player: PlayerId, slots: &[u8]) -> (Submission, Receiver<Verdict>) {
    for &slot in slots {
        assert!(table.place_token(player, SlotId::new(slot)));
    }
    let cards = table.candidate_of(player).expect("candidate not full");
    let (reply, verdict_rx) = verdict_channel();
    (
        Submission {
            player,
            cards,
            reply,
        },
        verdict_rx,
    )
}

#[test]
fn test_valid_set_scores_and_clears_slots() {
    let mut f = fixture();
    let (sub, verdict_rx) = submit(&f.table, P0, &[0, 1, 2]);

    f.dealer.serve_submission(sub);

    let verdict = verdict_rx.try_recv().expect("verdict not delivered");
    assert_eq!(verdict.kind, VerdictKind::Point { score: 1 });
    assert_eq!(verdict.freeze, Duration::from_millis(40));

    assert_eq!(f.dealer.score(P0), 1);
    assert_eq!(f.ui.last_score(P0), Some(1));

    // The matched cards left the game; the deck was empty so the slots
    // stay empty, and only card 3 survives.
    assert_eq!(f.table.count_cards(), 1);
    assert_eq!(f.table.card_at(SlotId::new(3)), Some(CardId::new(3)));
    for slot in 0..3u8 {
        assert_eq!(f.table.card_at(SlotId::new(slot)), None);
        assert!(f.table.tokens_at(SlotId::new(slot)).is_empty());
    }
    // Token budget restored by the removal itself.
    assert_eq!(f.table.available_tokens(P0), 3);
    assert!(f.table.is_ready());
}

#[test]
fn test_invalid_set_penalizes_without_table_mutation() {
    let mut f = fixture();
    let (sub, verdict_rx) = submit(&f.table, P0, &[0, 1, 3]);

    f.dealer.serve_submission(sub);

    let verdict = verdict_rx.try_recv().expect("verdict not delivered");
    assert_eq!(verdict.kind, VerdictKind::Penalty);
    assert_eq!(verdict.freeze, Duration::from_millis(90));

    // Zero table mutation: cards and tokens are exactly as submitted.
    assert_eq!(f.dealer.score(P0), 0);
    assert_eq!(f.ui.last_score(P0), None);
    assert_eq!(f.table.count_cards(), 4);
    assert!(f.table.has_token(P0, SlotId::new(0)));
    assert!(f.table.has_token(P0, SlotId::new(3)));
    assert_eq!(f.table.available_tokens(P0), 0);
}

#[test]
fn test_stale_submission_is_void() {
    let mut f = fixture();
    let (sub, verdict_rx) = submit(&f.table, P0, &[0, 1, 2]);

    // The table mutates between snapshot and service.
    f.table.remove_card(SlotId::new(1));

    f.dealer.serve_submission(sub);

    let verdict = verdict_rx.try_recv().expect("verdict not delivered");
    assert_eq!(verdict.kind, VerdictKind::Stale);
    assert_eq!(verdict.freeze, Duration::ZERO);
    assert_eq!(f.dealer.score(P0), 0);
}

#[test]
fn test_match_strips_other_players_tokens_too() {
    let mut f = fixture();
    // P1 parked tokens on two of the cards P0 is about to match.
    assert!(f.table.place_token(P1, SlotId::new(0)));
    assert!(f.table.place_token(P1, SlotId::new(2)));

    let (sub, _verdict_rx) = submit(&f.table, P0, &[0, 1, 2]);
    f.dealer.serve_submission(sub);

    assert_eq!(f.table.available_tokens(P1), 3);
    assert!(!f.table.has_token(P1, SlotId::new(0)));
}

#[test]
fn test_scores_accumulate_and_freed_slots_are_redealt() {
    let config = GameConfig::standard(vec![PlayerKind::Human])
        .with_geometry(3, 3, 9)
        .with_freezes(Duration::ZERO, Duration::ZERO);
    let table = Arc::new(Table::new(3, 1, 3));
    for i in 0..3u32 {
        table.place_card(CardId::new(i), SlotId::new(i as u8));
    }
    table.set_ready(true);
    let rules = FixedRules::new(3, [vec![CardId::new(0), CardId::new(1), CardId::new(2)]]);
    let (_tx, rx) = submission_mailbox();
    let mut dealer = Dealer::new(
        config,
        Arc::clone(&table),
        Arc::new(rules),
        Arc::new(NullUi),
        rx,
        Arc::new(AtomicBool::new(false)),
        Vec::new(),
    );

    let (sub, _verdict_rx) = submit(&table, P0, &[0, 1, 2]);
    dealer.serve_submission(sub);
    assert_eq!(dealer.score(P0), 1);
    // Freed slots were redealt from the 6 cards left in the deck.
    assert_eq!(table.count_cards(), 3);
    assert_eq!(dealer.deck_len(), 3);
}
