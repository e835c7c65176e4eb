//! Game assembly: wiring the table, players, producers, and dealer
//! together, and running a complete game.
//!
//! `Game::new` validates the configuration and builds every channel and
//! worker up front; `Game::run` spawns one named thread per player (each
//! automatic player additionally spawning its producer thread), runs the
//! dealer on the calling thread, and returns the final `GameReport` once
//! every thread has been joined.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use thiserror::Error;

use crate::core::{ConfigError, GameConfig, GameRng, PlayerId, PlayerKind};
use crate::dealer::{Dealer, GameReport, Seat};
use crate::player::{PlayerHandle, PlayerWorker};
use crate::protocol::submission_mailbox;
use crate::rules::Rules;
use crate::table::Table;
use crate::ui::GameUi;

/// Failure to assemble or start a game.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("rules expect sets of {group_size} cards, but the configured feature size is {feature_size}")]
    RulesMismatch {
        group_size: usize,
        feature_size: usize,
    },
    #[error("failed to spawn player thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Handle for requesting termination of a running game from outside.
///
/// Cheap to clone; every worker observes the request within one tick.
#[derive(Clone)]
pub struct TerminateHandle {
    flag: Arc<AtomicBool>,
}

impl TerminateHandle {
    /// Request cooperative termination of the whole game.
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether termination has been requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A fully wired game, ready to run.
pub struct Game {
    config: GameConfig,
    table: Arc<Table>,
    terminate: Arc<AtomicBool>,
    workers: Vec<PlayerWorker>,
    handles: Vec<PlayerHandle>,
    dealer_parts: DealerParts,
}

struct DealerParts {
    rules: Arc<dyn Rules>,
    ui: Arc<dyn GameUi>,
    submissions: crossbeam_channel::Receiver<crate::protocol::Submission>,
}

impl Game {
    /// Validate the configuration and wire up the table, mailbox, and
    /// one worker per seated player.
    pub fn new(
        config: GameConfig,
        rules: Arc<dyn Rules>,
        ui: Arc<dyn GameUi>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        if rules.group_size() != config.feature_size {
            return Err(GameError::RulesMismatch {
                group_size: rules.group_size(),
                feature_size: config.feature_size,
            });
        }

        let table = Arc::new(Table::new(
            config.table_size,
            config.player_count(),
            config.feature_size,
        ));
        let terminate = Arc::new(AtomicBool::new(false));
        let (submit_tx, submit_rx) = submission_mailbox();
        let mut seed_rng = GameRng::new(config.rng_seed);

        let mut workers = Vec::with_capacity(config.player_count());
        let mut handles = Vec::with_capacity(config.player_count());
        for (index, kind) in config.players.iter().enumerate() {
            let producer_rng = match kind {
                PlayerKind::Automatic => Some(seed_rng.fork()),
                PlayerKind::Human => None,
            };
            let (worker, handle) = PlayerWorker::new(
                PlayerId::new(index as u8),
                &config,
                Arc::clone(&table),
                Arc::clone(&ui),
                submit_tx.clone(),
                Arc::clone(&terminate),
                producer_rng,
            );
            workers.push(worker);
            handles.push(handle);
        }
        drop(submit_tx);

        Ok(Self {
            config,
            table,
            terminate,
            workers,
            handles,
            dealer_parts: DealerParts {
                rules,
                ui,
                submissions: submit_rx,
            },
        })
    }

    /// Input handles for every seated player, in seat order. External
    /// input sources drive human players through these.
    #[must_use]
    pub fn handles(&self) -> &[PlayerHandle] {
        &self.handles
    }

    /// The shared table, for observers.
    #[must_use]
    pub fn table(&self) -> Arc<Table> {
        Arc::clone(&self.table)
    }

    /// A handle for requesting termination from another thread.
    #[must_use]
    pub fn terminate_handle(&self) -> TerminateHandle {
        TerminateHandle {
            flag: Arc::clone(&self.terminate),
        }
    }

    /// Run the game to completion on the calling thread.
    ///
    /// Spawns the player threads, runs the dealer loop, and returns once
    /// the dealer has announced the winners and joined every player.
    pub fn run(self) -> Result<GameReport, GameError> {
        let mut seats = Vec::with_capacity(self.workers.len());
        for (worker, handle) in self.workers.into_iter().zip(self.handles.into_iter()) {
            let thread = thread::Builder::new()
                .name(format!("player-{}", handle.id().index()))
                .spawn(move || worker.run())?;
            seats.push(Seat {
                handle,
                thread: Some(thread),
            });
        }

        let mut dealer = Dealer::new(
            self.config,
            self.table,
            self.dealer_parts.rules,
            self.dealer_parts.ui,
            self.dealer_parts.submissions,
            self.terminate,
            seats,
        );
        Ok(dealer.run())
    }
}
