//! Player workers: input handling, token placement, and the submission
//! side of the verification protocol.
//!
//! Each player runs on its own thread. Raw input events arrive through a
//! bounded queue on the `PlayerHandle`; the worker turns them into token
//! toggles on the shared table. The moment a toggle spends the player's
//! last token, the worker submits the candidate snapshot through the
//! mailbox and blocks for the dealer's verdict. Freezes are served
//! locally: the verdict message carries the duration, the worker sleeps
//! it off in tick-sized slices so termination is observed promptly.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::{GameConfig, GameRng, PlayerId, SlotId};
use crate::producer::InputProducer;
use crate::protocol::{verdict_channel, Submission, Verdict, VerdictKind};
use crate::table::{Candidate, Table, TokenToggle};
use crate::ui::GameUi;

/// Shared entry point for feeding input to one player.
///
/// Held by input producers and external input sources. Events are
/// silently dropped while the player is frozen, while the table is not
/// ready, or when the pending-input queue is full.
#[derive(Clone)]
pub struct PlayerHandle {
    id: PlayerId,
    table: Arc<Table>,
    input_tx: Sender<SlotId>,
    frozen: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
}

impl PlayerHandle {
    /// The player this handle feeds.
    #[must_use]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Enqueue a "slot selected" event.
    ///
    /// Returns whether the event was accepted. Rejection has no side
    /// effect and is not an error: frozen player, not-ready table, and a
    /// full queue all simply drop the event.
    pub fn submit_input(&self, slot: SlotId) -> bool {
        if self.frozen.load(Ordering::Acquire) || !self.table.is_ready() {
            return false;
        }
        self.input_tx.try_send(slot).is_ok()
    }

    /// Whether the player is currently serving a freeze.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Ask the player worker to exit. Observed within one tick.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

/// One player's worker loop, run on a dedicated thread.
pub struct PlayerWorker {
    id: PlayerId,
    table: Arc<Table>,
    ui: Arc<dyn GameUi>,
    submissions: Sender<Submission>,
    input_rx: Receiver<SlotId>,
    handle: PlayerHandle,
    terminate: Arc<AtomicBool>,
    tick: Duration,
    freeze_until: Option<Instant>,
    /// RNG for the attached input producer; `Some` for automatic players.
    producer_rng: Option<GameRng>,
}

impl PlayerWorker {
    /// Build a worker and the handle that feeds it.
    ///
    /// `producer_rng` attaches a synthesized-input producer thread to the
    /// worker for the lifetime of its run.
    pub fn new(
        id: PlayerId,
        config: &GameConfig,
        table: Arc<Table>,
        ui: Arc<dyn GameUi>,
        submissions: Sender<Submission>,
        terminate: Arc<AtomicBool>,
        producer_rng: Option<GameRng>,
    ) -> (Self, PlayerHandle) {
        let (input_tx, input_rx) = bounded(config.input_queue_capacity);
        let handle = PlayerHandle {
            id,
            table: Arc::clone(&table),
            input_tx,
            frozen: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(AtomicBool::new(false)),
        };
        let worker = Self {
            id,
            table,
            ui,
            submissions,
            input_rx,
            handle: handle.clone(),
            terminate,
            tick: config.tick,
            freeze_until: None,
            producer_rng,
        };
        (worker, handle)
    }

    /// The worker's main loop. Returns when stopped or terminated.
    pub fn run(mut self) {
        log::info!("{} worker starting", self.id);
        let producer = self.producer_rng.take().map(|rng| {
            InputProducer::spawn(self.handle.clone(), self.table.slot_count(), rng, self.tick)
        });

        while !self.should_stop() {
            if let Some(until) = self.freeze_until.take() {
                self.serve_freeze(until);
                continue;
            }
            match self.input_rx.recv_timeout(self.tick) {
                Ok(slot) => self.apply_input(slot),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if let Some(producer) = producer {
            producer.stop_and_join();
        }
        log::info!("{} worker terminated", self.id);
    }

    fn should_stop(&self) -> bool {
        self.terminate.load(Ordering::Acquire) || self.handle.stop.load(Ordering::Acquire)
    }

    /// Block for the remaining freeze, reporting the countdown at entry
    /// and clearing it at expiry. The only purely time-based sleep in the
    /// worker, sliced by ticks so stop requests interrupt it.
    fn serve_freeze(&mut self, until: Instant) {
        self.ui
            .set_freeze(self.id, until.saturating_duration_since(Instant::now()));
        while !self.should_stop() {
            let remaining = until.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(self.tick));
        }
        self.ui.set_freeze(self.id, Duration::ZERO);
        self.handle.frozen.store(false, Ordering::Release);
    }

    /// Apply one dequeued "slot selected" event.
    fn apply_input(&mut self, slot: SlotId) {
        if !self.table.is_ready() {
            return;
        }
        match self.table.toggle_token(self.id, slot) {
            TokenToggle::Placed {
                candidate: Some(cards),
            } => self.submit(cards),
            TokenToggle::Placed { candidate: None }
            | TokenToggle::Removed
            | TokenToggle::Rejected => {}
        }
    }

    /// The submission protocol: hand the candidate to the dealer through
    /// the rendezvous mailbox, then block for the verdict. Both waits are
    /// time-sliced so termination unwinds them.
    fn submit(&mut self, cards: Candidate) {
        let (reply_tx, reply_rx) = verdict_channel();
        let mut submission = Submission {
            player: self.id,
            cards,
            reply: reply_tx,
        };
        loop {
            if self.should_stop() {
                return;
            }
            match self.submissions.send_timeout(submission, self.tick) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(back)) => submission = back,
                Err(SendTimeoutError::Disconnected(_)) => return,
            }
        }
        let verdict = loop {
            if self.should_stop() {
                return;
            }
            match reply_rx.recv_timeout(self.tick) {
                Ok(verdict) => break verdict,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
        };
        self.apply_verdict(verdict);
    }

    fn apply_verdict(&mut self, verdict: Verdict) {
        match verdict.kind {
            VerdictKind::Point { score } => {
                log::debug!("{} scored, now at {score}", self.id);
            }
            VerdictKind::Penalty => {
                log::debug!("{} penalized", self.id);
            }
            VerdictKind::Stale => {
                log::debug!("{} submission went stale", self.id);
                return;
            }
        }
        if !verdict.freeze.is_zero() {
            // Gate closes before the deadline is recorded so no input
            // sneaks in between.
            self.handle.frozen.store(true, Ordering::Release);
            self.freeze_until = Some(Instant::now() + verdict.freeze);
        }
    }
}
