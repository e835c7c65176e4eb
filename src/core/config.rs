//! Game configuration.
//!
//! A `GameConfig` is assembled once at startup and read-only afterwards.
//! It fixes the table geometry (slots, feature size, deck size), the timer
//! policy, the freeze durations, and the player roster. `Game::new` calls
//! `validate` before any thread is spawned.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Timer policy governing when the dealer reshuffles the table.
///
/// Mirrors the sign convention of a millisecond turn-timeout setting:
/// positive selects `Deadline`, zero selects `Elapsed`, negative selects
/// `Hidden`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutPolicy {
    /// Countdown mode: reshuffle everything when the deadline passes.
    Deadline(Duration),
    /// No deadline; the countdown display shows time elapsed since the
    /// last successful match. The table is reshuffled only when no legal
    /// set remains on it.
    Elapsed,
    /// No deadline and no countdown display at all.
    Hidden,
}

impl TimeoutPolicy {
    /// Build a policy from a signed millisecond setting.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            m if m > 0 => TimeoutPolicy::Deadline(Duration::from_millis(m as u64)),
            0 => TimeoutPolicy::Elapsed,
            _ => TimeoutPolicy::Hidden,
        }
    }
}

/// Whether a player is driven by an external input source or by a
/// synthesized input producer thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerKind {
    /// Input arrives from outside the engine (keyboard, network, test).
    Human,
    /// Input is synthesized by an `InputProducer` thread.
    Automatic,
}

/// Configuration validation failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("table must hold at least one full set ({table_size} slots < feature size {feature_size})")]
    TableTooSmall {
        table_size: usize,
        feature_size: usize,
    },
    #[error("feature size must be at least 1")]
    ZeroFeatureSize,
    #[error("deck of {deck_size} cards cannot fill a table of {table_size} slots")]
    DeckTooSmall {
        deck_size: usize,
        table_size: usize,
    },
    #[error("at least one player is required")]
    NoPlayers,
    #[error("at most 255 players are supported, got {0}")]
    TooManyPlayers(usize),
    #[error("at most 255 slots are supported, got {0}")]
    TableTooLarge(usize),
}

/// Complete game configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of slots on the table.
    pub table_size: usize,

    /// Cards per set, equal to the token budget of each player.
    pub feature_size: usize,

    /// Total number of cards in the deck.
    pub deck_size: usize,

    /// Timer policy for the dealer loop.
    pub timeout: TimeoutPolicy,

    /// Countdown remainder below which the display switches to warning.
    pub warning_time: Duration,

    /// Freeze applied to a player after a valid set.
    pub point_freeze: Duration,

    /// Freeze applied to a player after an invalid set.
    pub penalty_freeze: Duration,

    /// Player roster; index is the `PlayerId`.
    pub players: Vec<PlayerKind>,

    /// Polling tick used by the dealer and player loops.
    pub tick: Duration,

    /// Capacity of each player's pending-input queue.
    pub input_queue_capacity: usize,

    /// Seed for all deck shuffles and synthesized input.
    pub rng_seed: u64,
}

impl GameConfig {
    /// Create a configuration with the standard Set geometry:
    /// 12 slots, 3 cards per set, 81-card deck, 60 second turns.
    #[must_use]
    pub fn standard(players: Vec<PlayerKind>) -> Self {
        Self {
            table_size: 12,
            feature_size: 3,
            deck_size: 81,
            timeout: TimeoutPolicy::Deadline(Duration::from_secs(60)),
            warning_time: Duration::from_secs(5),
            point_freeze: Duration::from_secs(1),
            penalty_freeze: Duration::from_secs(3),
            players,
            tick: Duration::from_millis(1),
            input_queue_capacity: 3,
            rng_seed: 0,
        }
    }

    /// Set the table geometry.
    #[must_use]
    pub fn with_geometry(mut self, table_size: usize, feature_size: usize, deck_size: usize) -> Self {
        self.table_size = table_size;
        self.feature_size = feature_size;
        self.deck_size = deck_size;
        self
    }

    /// Set the timer policy.
    #[must_use]
    pub fn with_timeout(mut self, timeout: TimeoutPolicy) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the point and penalty freeze durations.
    #[must_use]
    pub fn with_freezes(mut self, point: Duration, penalty: Duration) -> Self {
        self.point_freeze = point;
        self.penalty_freeze = penalty;
        self
    }

    /// Set the polling tick.
    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Number of players in the roster.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feature_size == 0 {
            return Err(ConfigError::ZeroFeatureSize);
        }
        if self.table_size < self.feature_size {
            return Err(ConfigError::TableTooSmall {
                table_size: self.table_size,
                feature_size: self.feature_size,
            });
        }
        if self.table_size > 255 {
            return Err(ConfigError::TableTooLarge(self.table_size));
        }
        if self.deck_size < self.table_size {
            return Err(ConfigError::DeckTooSmall {
                deck_size: self.deck_size,
                table_size: self.table_size,
            });
        }
        if self.players.is_empty() {
            return Err(ConfigError::NoPlayers);
        }
        if self.players.len() > 255 {
            return Err(ConfigError::TooManyPlayers(self.players.len()));
        }
        Ok(())
    }
}
