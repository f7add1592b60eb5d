//! Player moves.
//!
//! A move is either playing one card from hand or drawing. Wild cards carry
//! the color the player names; for any other card the color is ignored.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use crate::cards::{CardId, Color};

/// A move submitted by a player.
///
/// ## Example
///
/// ```
/// use uno_engine::cards::{CardId, Color};
/// use uno_engine::core::{Move, PlayerId};
///
/// let alice = PlayerId::new("alice");
///
/// let play = Move::play(alice.clone(), CardId::new(12));
/// let wild = Move::play_wild(alice.clone(), CardId::new(100), Color::Green);
/// let draw = Move::draw(alice.clone());
///
/// assert_eq!(draw.player(), &alice);
/// assert_eq!(wild.card(), Some(CardId::new(100)));
/// assert!(play.card().is_some());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Move {
    Play {
        player: PlayerId,
        card: CardId,
        chosen_color: Option<Color>,
    },
    Draw {
        player: PlayerId,
    },
}

impl Move {
    /// Play a colored card.
    #[must_use]
    pub fn play(player: PlayerId, card: CardId) -> Self {
        Move::Play {
            player,
            card,
            chosen_color: None,
        }
    }

    /// Play a wild card naming `color`.
    #[must_use]
    pub fn play_wild(player: PlayerId, card: CardId, color: Color) -> Self {
        Move::Play {
            player,
            card,
            chosen_color: Some(color),
        }
    }

    /// Draw (one card, or the whole pending penalty).
    #[must_use]
    pub fn draw(player: PlayerId) -> Self {
        Move::Draw { player }
    }

    /// Who is making the move.
    #[must_use]
    pub fn player(&self) -> &PlayerId {
        match self {
            Move::Play { player, .. } | Move::Draw { player } => player,
        }
    }

    /// The card being played, if any.
    #[must_use]
    pub fn card(&self) -> Option<CardId> {
        match self {
            Move::Play { card, .. } => Some(*card),
            Move::Draw { .. } => None,
        }
    }
}

/// An accepted move and the snapshot version it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub mv: Move,
    pub version: u64,
}

impl MoveRecord {
    #[must_use]
    pub fn new(mv: Move, version: u64) -> Self {
        Self { mv, version }
    }
}
