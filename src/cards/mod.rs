//! Cards: the fixed 108-card deck, hands, and the draw/discard piles.
//!
//! ## Key Types
//!
//! - `CardId`: Stable identity of one physical card (0..108)
//! - `Card`: Color and face of a card
//! - `Hand`: Cards held by one seat
//! - `Deck`: Draw pile plus discard pile, with reshuffle on demand

pub mod card;
pub mod deck;
pub mod hand;

pub use card::{standard_deck, Card, CardId, CardKind, Color, DECK_SIZE};
pub use deck::{Deck, Drawn};
pub use hand::Hand;
