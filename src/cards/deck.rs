//! Draw and discard piles.
//!
//! Both piles are ordered with the top card last, like the ordered zones
//! of a zone manager. Every operation takes `&self` and returns a new
//! `Deck`; `im::Vector` keeps those copies cheap.
//!
//! ## Reshuffle
//!
//! When a draw needs more cards than the draw pile holds, every discard
//! except the current top is shuffled and slid beneath the remaining draw
//! pile. The top discard stays put because it is the card in play.

use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::card::Card;
use crate::core::rng::GameRng;
use crate::rules::error::IntegrityError;

/// Cards drawn in one go. Draws are almost always 1, 2 or 4.
pub type Drawn = SmallVec<[Card; 4]>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    draw_pile: Vector<Card>,
    discard_pile: Vector<Card>,
}

impl Deck {
    /// Build a draw pile from `cards` in a uniformly random order.
    #[must_use]
    pub fn shuffled(cards: impl IntoIterator<Item = Card>, rng: &mut GameRng) -> Self {
        let mut cards: Vec<Card> = cards.into_iter().collect();
        rng.shuffle(&mut cards);
        Self {
            draw_pile: cards.into_iter().collect(),
            discard_pile: Vector::new(),
        }
    }

    /// Take `n` cards off the top of the draw pile.
    ///
    /// Reshuffles the discard pile (minus its top) first if the draw pile is
    /// short. Fails with `DeckExhausted` when even that is not enough.
    pub fn draw(&self, n: usize, rng: &mut GameRng) -> Result<(Drawn, Deck), IntegrityError> {
        let mut next = self.clone();

        if next.draw_pile.len() < n {
            next.recycle_discards(rng);
        }
        if next.draw_pile.len() < n {
            return Err(IntegrityError::DeckExhausted {
                requested: n,
                available: next.draw_pile.len(),
            });
        }

        let mut drawn = Drawn::new();
        for _ in 0..n {
            if let Some(card) = next.draw_pile.pop_back() {
                drawn.push(card);
            }
        }
        Ok((drawn, next))
    }

    /// Put `card` on top of the discard pile.
    #[must_use]
    pub fn discard(&self, card: Card) -> Deck {
        let mut next = self.clone();
        next.discard_pile.push_back(card);
        next
    }

    /// The card in play.
    #[must_use]
    pub fn discard_top(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    #[must_use]
    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    #[must_use]
    pub fn discard_pile_len(&self) -> usize {
        self.discard_pile.len()
    }

    /// Every card in either pile.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.draw_pile.iter().chain(self.discard_pile.iter())
    }

    /// Put `cards` back into the draw pile and reshuffle the whole pile.
    ///
    /// Used when a dealt card must be redrawn, such as a WildDrawFour
    /// turned up as the starting discard.
    #[must_use]
    pub(crate) fn bury(&self, cards: impl IntoIterator<Item = Card>, rng: &mut GameRng) -> Deck {
        let mut pile: Vec<Card> = self.draw_pile.iter().copied().chain(cards).collect();
        rng.shuffle(&mut pile);
        Deck {
            draw_pile: pile.into_iter().collect(),
            discard_pile: self.discard_pile.clone(),
        }
    }

    fn recycle_discards(&mut self, rng: &mut GameRng) {
        let Some(top) = self.discard_pile.pop_back() else {
            return;
        };

        let mut recycled: Vec<Card> = std::mem::take(&mut self.discard_pile).into_iter().collect();
        rng.shuffle(&mut recycled);

        let mut pile: Vector<Card> = recycled.into_iter().collect();
        pile.append(std::mem::take(&mut self.draw_pile));
        self.draw_pile = pile;
        self.discard_pile.push_back(top);
    }
}

#[cfg(test)]
impl Deck {
    /// Pull the first draw-pile card matching `pred` out of the pile.
    pub(crate) fn take_matching(&mut self, pred: impl Fn(&Card) -> bool) -> Option<Card> {
        let index = self.draw_pile.iter().position(|c| pred(c))?;
        Some(self.draw_pile.remove(index))
    }

    /// Put cards back on the bottom of the draw pile.
    pub(crate) fn return_to_bottom(&mut self, cards: impl IntoIterator<Item = Card>) {
        for card in cards {
            self.draw_pile.push_front(card);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::card::{standard_deck, CardId, DECK_SIZE};

    fn fresh() -> (Deck, GameRng) {
        let mut rng = GameRng::new(42);
        let deck = Deck::shuffled(standard_deck(), &mut rng);
        (deck, rng)
    }

    fn sorted_ids(deck: &Deck, extra: &[Card]) -> Vec<CardId> {
        let mut ids: Vec<_> = deck.cards().chain(extra.iter()).map(|c| c.id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_shuffled_keeps_every_card() {
        let (deck, _) = fresh();
        assert_eq!(deck.draw_pile_len(), DECK_SIZE);
        assert_eq!(deck.discard_pile_len(), 0);
        let expected: Vec<_> = (0..DECK_SIZE as u8).map(CardId).collect();
        assert_eq!(sorted_ids(&deck, &[]), expected);
    }

    #[test]
    fn test_shuffled_changes_order() {
        let (deck, _) = fresh();
        let order: Vec<_> = deck.cards().map(|c| c.id).collect();
        let canonical: Vec<_> = standard_deck().iter().map(|c| c.id).collect();
        assert_ne!(order, canonical);
    }

    #[test]
    fn test_draw_takes_from_top() {
        let (deck, mut rng) = fresh();
        let (drawn, after) = deck.draw(3, &mut rng).unwrap();

        assert_eq!(drawn.len(), 3);
        assert_eq!(after.draw_pile_len(), DECK_SIZE - 3);
        // Original deck untouched
        assert_eq!(deck.draw_pile_len(), DECK_SIZE);
        assert_eq!(sorted_ids(&after, &drawn).len(), DECK_SIZE);
    }

    #[test]
    fn test_discard_sets_top() {
        let (deck, mut rng) = fresh();
        let (drawn, deck) = deck.draw(1, &mut rng).unwrap();
        let deck = deck.discard(drawn[0]);
        assert_eq!(deck.discard_top(), Some(&drawn[0]));
    }

    #[test]
    fn test_draw_reshuffles_discards_but_keeps_top() {
        let (deck, mut rng) = fresh();

        // Move everything but 2 cards onto the discard pile
        let (drawn, mut deck) = deck.draw(DECK_SIZE - 2, &mut rng).unwrap();
        for card in drawn.iter() {
            deck = deck.discard(*card);
        }
        let top = *deck.discard_top().unwrap();
        assert_eq!(deck.draw_pile_len(), 2);

        let (got, deck) = deck.draw(5, &mut rng).unwrap();
        assert_eq!(got.len(), 5);
        assert_eq!(deck.discard_pile_len(), 1);
        assert_eq!(deck.discard_top(), Some(&top));
        assert_eq!(deck.draw_pile_len(), DECK_SIZE - 1 - 5);
        assert_eq!(sorted_ids(&deck, &got).len(), DECK_SIZE);
    }

    #[test]
    fn test_reshuffle_draws_remaining_pile_first() {
        let (deck, mut rng) = fresh();
        let (drawn, mut deck) = deck.draw(DECK_SIZE - 2, &mut rng).unwrap();
        for card in drawn.iter() {
            deck = deck.discard(*card);
        }
        let remaining: Vec<_> = deck.cards().take(2).map(|c| c.id).collect();

        let (got, _) = deck.draw(3, &mut rng).unwrap();
        let first_two: Vec<_> = got.iter().take(2).map(|c| c.id).collect();
        for id in remaining {
            assert!(first_two.contains(&id));
        }
    }

    #[test]
    fn test_exhausted_when_everything_is_held() {
        let (deck, mut rng) = fresh();
        let (_held, deck) = deck.draw(DECK_SIZE - 1, &mut rng).unwrap();
        let (last, deck) = deck.draw(1, &mut rng).unwrap();
        let deck = deck.discard(last[0]);

        let err = deck.draw(1, &mut rng).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::DeckExhausted {
                requested: 1,
                available: 0
            }
        );
    }

    #[test]
    fn test_bury_returns_card_to_draw_pile() {
        let (deck, mut rng) = fresh();
        let (drawn, deck) = deck.draw(1, &mut rng).unwrap();
        let deck = deck.bury(drawn, &mut rng);
        assert_eq!(deck.draw_pile_len(), DECK_SIZE);
    }

    #[test]
    fn test_draw_is_deterministic_for_same_rng_state() {
        let (deck, rng) = fresh();
        let mut a = rng.clone();
        let mut b = rng;
        let (x, _) = deck.draw(10, &mut a).unwrap();
        let (y, _) = deck.draw(10, &mut b).unwrap();
        assert_eq!(x, y);
    }
}
