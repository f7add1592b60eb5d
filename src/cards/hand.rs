//! A player's hand.
//!
//! Backed by `im::Vector` so snapshots that share a hand clone in O(1).
//! Order carries no meaning; it is kept only so serialization is stable.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::card::{Card, CardId, Color};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vector<Card>,
}

impl Hand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Look up a card by id.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.get(id).is_some()
    }

    /// Does the hand hold any card printed in `color`?
    #[must_use]
    pub fn has_color(&self, color: Color) -> bool {
        self.cards.iter().any(|c| c.color == color)
    }

    /// Add cards to the hand.
    pub fn extend(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    /// Remove a card by id, returning it if it was held.
    pub fn remove(&mut self, id: CardId) -> Option<Card> {
        let index = self.cards.iter().position(|c| c.id == id)?;
        Some(self.cards.remove(index))
    }

    /// Empty the hand, returning everything it held.
    pub fn take_all(&mut self) -> Vector<Card> {
        std::mem::take(&mut self.cards)
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}
