//! Player identification and seating.
//!
//! ## PlayerId
//!
//! Opaque identifier supplied by whatever identity layer fronts the engine.
//! The engine only compares ids; it never interprets them.
//!
//! ## Seat
//!
//! A player's place at the table: id, display name, join order and hand.
//! `TurnState::active` indexes into the ordered seat list.

use serde::{Deserialize, Serialize};

use crate::cards::Hand;

/// Opaque, stable player identifier.
///
/// ```
/// use uno_engine::core::PlayerId;
///
/// let alice = PlayerId::new("alice");
/// assert_eq!(alice.as_str(), "alice");
/// assert_eq!(alice, PlayerId::from("alice"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One occupied seat at the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Who sits here.
    pub player: PlayerId,

    /// Display name given on join.
    pub name: String,

    /// Join order, starting at 1 for the creator.
    pub order: u32,

    /// Cards held by this seat.
    pub hand: Hand,
}

impl Seat {
    /// Create an empty-handed seat.
    #[must_use]
    pub fn new(player: PlayerId, name: impl Into<String>, order: u32) -> Self {
        Self {
            player,
            name: name.into(),
            order,
            hand: Hand::new(),
        }
    }
}
