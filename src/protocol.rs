//! The set-submission protocol: mailbox, submissions, verdicts.
//!
//! A player with a full candidate sends a `Submission` through the
//! mailbox and blocks on its private reply channel until the dealer
//! answers with a `Verdict`. The mailbox is a zero-capacity rendezvous
//! channel: a send completes only when the dealer takes the submission,
//! and the dealer replies before taking the next one, so at most one
//! submission is ever in flight and no two are verified interleaved.
//!
//! The verdict carries the freeze to serve, delivered as an explicit
//! one-shot message instead of the dealer writing into player state.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::time::Duration;

use crate::core::PlayerId;
use crate::table::Candidate;

/// One pending set-verification request.
#[derive(Clone, Debug)]
pub struct Submission {
    /// The submitting player.
    pub player: PlayerId,
    /// Snapshot of the player's candidate at submission time.
    pub cards: Candidate,
    /// Where the dealer sends the verdict. Sending it is the signal that
    /// unblocks the submitter.
    pub reply: Sender<Verdict>,
}

/// The dealer's answer to a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
    /// What the dealer decided.
    pub kind: VerdictKind,
    /// Freeze the submitter must serve before acting again.
    pub freeze: Duration,
}

/// Classification of a served submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerdictKind {
    /// Valid set: the submitter scored. Carries the new score.
    Point { score: u32 },
    /// Invalid set.
    Penalty,
    /// The table mutated between snapshot and verification; the
    /// submission no longer stands. No score, no penalty, no freeze.
    Stale,
}

impl Verdict {
    /// A point verdict with the configured point freeze.
    #[must_use]
    pub fn point(score: u32, freeze: Duration) -> Self {
        Self {
            kind: VerdictKind::Point { score },
            freeze,
        }
    }

    /// A penalty verdict with the configured penalty freeze.
    #[must_use]
    pub fn penalty(freeze: Duration) -> Self {
        Self {
            kind: VerdictKind::Penalty,
            freeze,
        }
    }

    /// A stale verdict: the submission is void.
    #[must_use]
    pub fn stale() -> Self {
        Self {
            kind: VerdictKind::Stale,
            freeze: Duration::ZERO,
        }
    }
}

/// Build the submission mailbox shared by all players and the dealer.
///
/// Zero capacity: the send itself is the handoff.
#[must_use]
pub fn submission_mailbox() -> (Sender<Submission>, Receiver<Submission>) {
    bounded(0)
}

/// Build the one-shot reply channel for a single submission.
#[must_use]
pub fn verdict_channel() -> (Sender<Verdict>, Receiver<Verdict>) {
    bounded(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardId;
    use smallvec::smallvec;

    #[test]
    fn test_mailbox_rendezvous() {
        let (tx, rx) = submission_mailbox();
        // Zero capacity: without a receiver the send cannot complete.
        let (reply, _reply_rx) = verdict_channel();
        let sub = Submission {
            player: PlayerId::new(0),
            cards: smallvec![CardId::new(1), CardId::new(2), CardId::new(3)],
            reply,
        };
        assert!(tx.try_send(sub).is_err());
        drop(rx);
    }

    #[test]
    fn test_submit_and_reply_round_trip() {
        let (tx, rx) = submission_mailbox();
        let (reply_tx, reply_rx) = verdict_channel();

        let handle = std::thread::spawn(move || {
            let sub = Submission {
                player: PlayerId::new(1),
                cards: smallvec![CardId::new(4), CardId::new(5), CardId::new(6)],
                reply: reply_tx,
            };
            tx.send(sub).unwrap();
            reply_rx.recv().unwrap()
        });

        let sub = rx.recv().unwrap();
        assert_eq!(sub.player, PlayerId::new(1));
        sub.reply
            .send(Verdict::point(1, Duration::from_millis(10)))
            .unwrap();

        let verdict = handle.join().unwrap();
        assert_eq!(verdict.kind, VerdictKind::Point { score: 1 });
        assert_eq!(verdict.freeze, Duration::from_millis(10));
    }

    #[test]
    fn test_stale_verdict_has_no_freeze() {
        assert_eq!(Verdict::stale().freeze, Duration::ZERO);
    }
}
