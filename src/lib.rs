//! # set-engine
//!
//! A concurrent engine for the Set card game: one supervising dealer
//! thread, N player worker threads, and one input-producer thread per
//! automatic player, contending for a shared table of face-up cards and
//! per-player token placements.
//!
//! ## The core protocol
//!
//! A player marks candidate cards by toggling tokens on table slots.
//! Spending the last token atomically snapshots the candidate group and
//! submits it through a rendezvous mailbox; the player then blocks until
//! the dealer replies with a verdict (point, penalty, or stale). The
//! mailbox guarantees at most one submission is in flight, so no two
//! candidates are ever verified interleaved.
//!
//! ## Design
//!
//! - **Single reconciliation point**: all card and token accounting lives
//!   inside the `Table`'s critical section; removing a card strips its
//!   tokens and restores budgets atomically, so stale-token races are
//!   structurally unreachable.
//! - **Message-passing verdicts**: the dealer never writes into player
//!   state; freezes travel in the verdict message.
//! - **Cooperative shutdown**: every blocking wait is time-sliced by the
//!   configured tick; termination is observed within one tick.
//! - **Deterministic runs**: all shuffles and synthesized input derive
//!   from the configured seed.
//!
//! ## Modules
//!
//! - `core`: card/slot/player identifiers, configuration, RNG
//! - `table`: the shared table (card↔slot bijection, token matrix, ready gate)
//! - `rules`: set validity and search (`ClassicRules`, `FixedRules`)
//! - `ui`: display notifications (`NullUi`, `LogUi`, `RecordingUi`)
//! - `protocol`: submissions, verdicts, the mailbox
//! - `player`: player workers and input handles
//! - `producer`: synthesized input for automatic players
//! - `dealer`: timer loop, verification, dealing, termination
//! - `game`: assembly and lifecycle

pub mod core;
pub mod dealer;
pub mod game;
pub mod player;
pub mod producer;
pub mod protocol;
pub mod rules;
pub mod table;
pub mod ui;

// Re-export commonly used types
pub use crate::core::{
    CardId, ConfigError, GameConfig, GameRng, PlayerId, PlayerKind, PlayerMap, SlotId,
    TimeoutPolicy,
};

pub use crate::dealer::{Dealer, GameReport, Seat};
pub use crate::game::{Game, GameError, TerminateHandle};
pub use crate::player::{PlayerHandle, PlayerWorker};
pub use crate::producer::InputProducer;
pub use crate::protocol::{Submission, Verdict, VerdictKind};
pub use crate::rules::{ClassicRules, FixedRules, Rules};
pub use crate::table::{Candidate, Table, TokenToggle};
pub use crate::ui::{GameUi, LogUi, NullUi, RecordingUi, UiEvent};
