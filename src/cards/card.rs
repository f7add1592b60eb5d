//! Card value types and legality predicates.
//!
//! A `Card` is an immutable `(id, color, kind)` triple. The `kind` is a
//! closed enum: only `Number` carries a payload. Wild kinds are always
//! colored `Color::Wild`; the color chosen when playing one lives in the
//! turn state, never on the card.

use serde::{Deserialize, Serialize};

/// Opaque card token. Unique within one 108-card deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u8);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Card color. `Wild` is only ever printed on wild kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Wild,
}

impl Color {
    /// The four colors a wild card may name.
    pub const PLAYABLE: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    /// True for the four real colors.
    #[must_use]
    pub fn is_playable(self) -> bool {
        self != Color::Wild
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Wild => "wild",
        };
        f.write_str(name)
    }
}

/// What a card does when played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    /// Face value 0-9.
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl CardKind {
    /// Wild kinds need a color choice and are playable on anything.
    #[must_use]
    pub fn is_wild(self) -> bool {
        matches!(self, CardKind::Wild | CardKind::WildDrawFour)
    }

    /// Cards that add to the pending draw count.
    #[must_use]
    pub fn draw_penalty(self) -> u32 {
        match self {
            CardKind::DrawTwo => 2,
            CardKind::WildDrawFour => 4,
            _ => 0,
        }
    }
}

/// A physical card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub color: Color,
    pub kind: CardKind,
}

impl Card {
    /// Create a card. Wild kinds are forced to `Color::Wild`.
    #[must_use]
    pub fn new(id: CardId, color: Color, kind: CardKind) -> Self {
        let color = if kind.is_wild() { Color::Wild } else { color };
        Self { id, color, kind }
    }

    #[must_use]
    pub fn is_wild(&self) -> bool {
        self.kind.is_wild()
    }

    /// Can this card be played on `top` while `current_color` is in force?
    ///
    /// Wild kinds always match. A `Color::Wild` current color (a wild card
    /// seeded the discard pile) accepts anything. Otherwise the card must
    /// share the current color or the top card's face.
    #[must_use]
    pub fn can_follow(&self, top: &Card, current_color: Color) -> bool {
        if self.is_wild() || current_color == Color::Wild {
            return true;
        }
        self.color == current_color || (!top.is_wild() && self.kind == top.kind)
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            CardKind::Number(n) => write!(f, "{} {}", self.color, n),
            CardKind::Skip => write!(f, "{} skip", self.color),
            CardKind::Reverse => write!(f, "{} reverse", self.color),
            CardKind::DrawTwo => write!(f, "{} draw two", self.color),
            CardKind::Wild => f.write_str("wild"),
            CardKind::WildDrawFour => f.write_str("wild draw four"),
        }
    }
}

/// Number of cards in the canonical deck.
pub const DECK_SIZE: usize = 108;

/// The canonical 108-card deck, ids assigned 0..108 in this order.
///
/// Per color: one 0, two each of 1-9, two Skip, two Reverse, two DrawTwo.
/// Then four Wild and four WildDrawFour.
#[must_use]
pub fn standard_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    let mut next_id = 0u8;
    let mut push = |color: Color, kind: CardKind, cards: &mut Vec<Card>| {
        cards.push(Card::new(CardId(next_id), color, kind));
        next_id += 1;
    };

    for color in Color::PLAYABLE {
        push(color, CardKind::Number(0), &mut cards);
        for _ in 0..2 {
            for n in 1..=9 {
                push(color, CardKind::Number(n), &mut cards);
            }
            push(color, CardKind::Skip, &mut cards);
            push(color, CardKind::Reverse, &mut cards);
            push(color, CardKind::DrawTwo, &mut cards);
        }
    }
    for _ in 0..4 {
        push(Color::Wild, CardKind::Wild, &mut cards);
    }
    for _ in 0..4 {
        push(Color::Wild, CardKind::WildDrawFour, &mut cards);
    }

    debug_assert_eq!(cards.len(), DECK_SIZE);
    cards
}
