//! Core engine types: card/slot/player identifiers, RNG, configuration.
//!
//! Everything here is passive data; the threaded machinery lives in
//! `table`, `player`, `producer`, and `dealer`.

pub mod card;
pub mod config;
pub mod player;
pub mod rng;

pub use card::{CardId, SlotId};
pub use config::{ConfigError, GameConfig, PlayerKind, TimeoutPolicy};
pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;
