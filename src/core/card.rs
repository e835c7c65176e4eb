//! Card and slot identifiers.
//!
//! A `CardId` names a card for the whole game; for the classic rules it
//! is the base-`feature_size` encoding of the card's feature vector. A
//! `SlotId` names a position in the table grid. Both are plain indices
//! wrapped for type safety.

use serde::{Deserialize, Serialize};

/// Card identifier, unique across the deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw card value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card {}", self.0)
    }
}

/// Table slot identifier (0-based, row-major).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u8);

impl SlotId {
    /// Create a new slot ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw slot index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all slot IDs for a table with `slot_count` slots.
    pub fn all(slot_count: usize) -> impl Iterator<Item = SlotId> {
        (0..slot_count as u8).map(SlotId)
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Slot {}", self.0)
    }
}
