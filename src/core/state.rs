//! Game snapshots: the complete, versioned state of one game.
//!
//! ## GameSnapshot
//!
//! Everything needed to continue the game:
//! - Seats (players in join order, each with a hand)
//! - Deck (draw and discard piles)
//! - Turn state, status, winner
//! - RNG position, so reshuffles depend only on the snapshot
//!
//! Snapshots are values. The rules engine never edits one in place; it
//! returns a successor with `version + 1`. `im` structures make those
//! successors share almost all of their memory with the predecessor.
//!
//! ## PlayerView
//!
//! What one player is allowed to see: their own hand, and only the card
//! counts of everyone else.

use im::Vector;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::action::MoveRecord;
use super::config::GameConfig;
use super::id::GameId;
use super::player::{PlayerId, Seat};
use super::rng::GameRngState;
use crate::cards::{standard_deck, Card, Color, Deck, Hand};
use crate::rules::error::IntegrityError;
use crate::rules::turn::{Direction, TurnState};

/// Lifecycle of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    /// Accepting players.
    Waiting,
    /// Moves are being played.
    Playing,
    /// Someone emptied their hand.
    Finished,
}

/// Immutable state of one game at one version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub(crate) game_id: GameId,
    pub(crate) version: u64,
    pub(crate) creator: PlayerId,
    pub(crate) rules: GameConfig,
    pub(crate) seats: Vector<Seat>,
    pub(crate) deck: Deck,
    pub(crate) turn: TurnState,
    pub(crate) status: GameStatus,
    pub(crate) winner: Option<PlayerId>,
    pub(crate) rng: GameRngState,
    pub(crate) last_move: Option<MoveRecord>,
}

impl GameSnapshot {
    #[must_use]
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Optimistic-concurrency fencing token. Bumped on every accepted change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn creator(&self) -> &PlayerId {
        &self.creator
    }

    #[must_use]
    pub fn rules(&self) -> &GameConfig {
        &self.rules
    }

    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    #[must_use]
    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn discard_top(&self) -> Option<&Card> {
        self.deck.discard_top()
    }

    #[must_use]
    pub fn current_color(&self) -> Color {
        self.turn.current_color
    }

    #[must_use]
    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.last_move.as_ref()
    }

    #[must_use]
    pub fn rng_state(&self) -> GameRngState {
        self.rng
    }

    /// Seats in join order.
    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter()
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.seats.iter().map(|s| &s.player)
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    /// Seat index of `player`.
    #[must_use]
    pub fn seat_of(&self, player: &PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| &s.player == player)
    }

    #[must_use]
    pub fn hand(&self, player: &PlayerId) -> Option<&Hand> {
        self.seats.iter().find(|s| &s.player == player).map(|s| &s.hand)
    }

    /// Player whose turn it is. `None` before anyone is seated.
    #[must_use]
    pub fn active_player(&self) -> Option<&PlayerId> {
        self.seats.get(self.turn.active).map(|s| &s.player)
    }

    /// Every card the game knows about: both piles and all hands.
    pub fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.deck
            .cards()
            .chain(self.seats.iter().flat_map(|s| s.hand.iter()))
    }

    /// Check that piles and hands together hold exactly the canonical deck.
    pub fn check_conservation(&self) -> Result<(), IntegrityError> {
        let canonical = standard_deck();
        let mut seen = FxHashSet::default();
        let mut count = 0usize;

        for card in self.all_cards() {
            count += 1;
            let expected = canonical.get(card.id.raw() as usize).ok_or_else(|| {
                IntegrityError::Conservation(format!("unknown card id {}", card.id))
            })?;
            if expected != card {
                return Err(IntegrityError::Conservation(format!(
                    "{} should be {expected}, found {card}",
                    card.id
                )));
            }
            if !seen.insert(card.id) {
                return Err(IntegrityError::Conservation(format!(
                    "{} appears more than once",
                    card.id
                )));
            }
        }

        if count != canonical.len() {
            return Err(IntegrityError::Conservation(format!(
                "expected {} cards, found {count}",
                canonical.len()
            )));
        }
        Ok(())
    }

    /// Project what `player` may see. `None` if they are not seated.
    #[must_use]
    pub fn view_for(&self, player: &PlayerId) -> Option<PlayerView> {
        let seat = self.seat_of(player)?;
        let hand = self.seats[seat].hand.iter().copied().collect();
        let opponents = self
            .seats
            .iter()
            .filter(|s| &s.player != player)
            .map(|s| OpponentSummary {
                player: s.player.clone(),
                name: s.name.clone(),
                order: s.order,
                card_count: s.hand.len(),
            })
            .collect();

        Some(PlayerView {
            game_id: self.game_id,
            version: self.version,
            player: player.clone(),
            hand,
            opponents,
            discard_top: self.discard_top().copied(),
            current_color: self.turn.current_color,
            active_player: self.active_player().cloned(),
            direction: self.turn.direction,
            pending_draw: self.turn.pending_draw,
            draw_pile_size: self.deck.draw_pile_len(),
            status: self.status,
            winner: self.winner.clone(),
        })
    }
}

/// Another player's public information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentSummary {
    pub player: PlayerId,
    pub name: String,
    pub order: u32,
    pub card_count: usize,
}

/// One player's view of a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub game_id: GameId,
    pub version: u64,
    pub player: PlayerId,
    pub hand: Vec<Card>,
    pub opponents: Vec<OpponentSummary>,
    pub discard_top: Option<Card>,
    pub current_color: Color,
    pub active_player: Option<PlayerId>,
    pub direction: Direction,
    pub pending_draw: u32,
    pub draw_pile_size: usize,
    pub status: GameStatus,
    pub winner: Option<PlayerId>,
}

impl PlayerView {
    /// Is it this player's turn?
    #[must_use]
    pub fn is_my_turn(&self) -> bool {
        self.status == GameStatus::Playing && self.active_player.as_ref() == Some(&self.player)
    }
}
