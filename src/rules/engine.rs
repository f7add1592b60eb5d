//! The rules engine: validate a move against a snapshot and produce the
//! successor snapshot.
//!
//! `apply` is pure. The same snapshot and move always give the same result,
//! error included, because the only randomness (reshuffles) comes from the
//! RNG state stored in the snapshot. The coordinator relies on this when it
//! re-applies a move after losing a compare-and-swap race.

use crate::cards::{Card, CardId, CardKind, Color};
use crate::core::action::{Move, MoveRecord};
use crate::core::player::PlayerId;
use crate::core::rng::GameRng;
use crate::core::state::{GameSnapshot, GameStatus};

use super::error::{EngineError, IntegrityError};

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `apply`: Must be deterministic and must not touch its input
/// - `candidate_moves`: Every move worth trying; `legal_moves` filters
///   them through `apply`
/// - `outcome`: Return None while the game continues
pub trait RulesEngine {
    /// Validate `mv` against `snapshot` and return the successor.
    fn apply(&self, snapshot: &GameSnapshot, mv: &Move) -> Result<GameSnapshot, EngineError>;

    /// Moves `player` might submit, legal or not.
    fn candidate_moves(&self, snapshot: &GameSnapshot, player: &PlayerId) -> Vec<Move>;

    /// The winner, once the game is over.
    fn outcome<'a>(&self, snapshot: &'a GameSnapshot) -> Option<&'a PlayerId>;

    // === Convenience Methods ===

    /// Every move `apply` would accept from `player` right now.
    fn legal_moves(&self, snapshot: &GameSnapshot, player: &PlayerId) -> Vec<Move> {
        self.candidate_moves(snapshot, player)
            .into_iter()
            .filter(|mv| self.apply(snapshot, mv).is_ok())
            .collect()
    }
}

/// Standard UNO rules, with stacking and the relaxed WildDrawFour check
/// controlled per game by `GameConfig`.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnoRules;

impl UnoRules {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn play(
        &self,
        snapshot: &GameSnapshot,
        seat: usize,
        card_id: CardId,
        chosen_color: Option<Color>,
    ) -> Result<GameSnapshot, EngineError> {
        let rules = &snapshot.rules;
        let turn = &snapshot.turn;
        let hand = &snapshot.seats[seat].hand;
        let held = hand.get(card_id).copied();
        let top = *snapshot
            .deck
            .discard_top()
            .ok_or_else(|| IntegrityError::Conservation("discard pile is empty".to_string()))?;

        let stacking = turn.pending_draw > 0;
        if stacking {
            let stackable = held.is_some_and(|card| can_stack(&card, &top, turn.current_color));
            if !rules.stacking_enabled || (held.is_some() && !stackable) {
                return Err(EngineError::MustResolvePendingDraw);
            }
        }

        let card = held.ok_or(EngineError::CardNotInHand(card_id))?;

        if !card.can_follow(&top, turn.current_color) {
            return Err(EngineError::IllegalMove);
        }
        if card.kind == CardKind::WildDrawFour
            && !stacking
            && !rules.relaxed_wild_draw_four
            && turn.current_color.is_playable()
            && hand.has_color(turn.current_color)
        {
            return Err(EngineError::IllegalMove);
        }

        let color = if card.is_wild() {
            match chosen_color {
                Some(color) if color.is_playable() => color,
                _ => return Err(EngineError::MissingColorChoice),
            }
        } else {
            card.color
        };

        let mut next = snapshot.clone();
        let seat_count = next.seats.len();
        next.seats[seat].hand.remove(card.id);
        next.deck = next.deck.discard(card);
        next.turn.current_color = color;

        if next.seats[seat].hand.is_empty() {
            next.status = GameStatus::Finished;
            next.winner = Some(next.seats[seat].player.clone());
            next.turn.pending_draw = 0;
            return Ok(next);
        }

        match card.kind {
            CardKind::Number(_) | CardKind::Wild => next.turn.advance(1, seat_count),
            CardKind::Skip => next.turn.advance(2, seat_count),
            CardKind::Reverse => {
                next.turn.direction = next.turn.direction.flipped();
                // Heads-up, a reverse hands the turn straight back
                let steps = if seat_count == 2 { 2 } else { 1 };
                next.turn.advance(steps, seat_count);
            }
            CardKind::DrawTwo | CardKind::WildDrawFour => {
                next.turn.pending_draw += card.kind.draw_penalty();
                next.turn.advance(1, seat_count);
            }
        }
        Ok(next)
    }

    fn draw(&self, snapshot: &GameSnapshot, seat: usize) -> Result<GameSnapshot, EngineError> {
        let count = snapshot.turn.pending_draw.max(1) as usize;
        let mut rng = GameRng::from_state(&snapshot.rng);
        let (drawn, deck) = snapshot.deck.draw(count, &mut rng)?;

        let mut next = snapshot.clone();
        let seat_count = next.seats.len();
        next.seats[seat].hand.extend(drawn);
        next.deck = deck;
        next.rng = rng.state();
        next.turn.pending_draw = 0;
        next.turn.advance(1, seat_count);
        Ok(next)
    }
}

impl RulesEngine for UnoRules {
    fn apply(&self, snapshot: &GameSnapshot, mv: &Move) -> Result<GameSnapshot, EngineError> {
        if snapshot.status != GameStatus::Playing {
            return Err(EngineError::GameNotActive);
        }
        let seat = snapshot
            .seat_of(mv.player())
            .filter(|&seat| seat == snapshot.turn.active)
            .ok_or(EngineError::NotYourTurn)?;

        let mut next = match mv {
            Move::Play {
                card, chosen_color, ..
            } => self.play(snapshot, seat, *card, *chosen_color)?,
            Move::Draw { .. } => self.draw(snapshot, seat)?,
        };

        next.version = snapshot.version + 1;
        next.last_move = Some(MoveRecord::new(mv.clone(), next.version));
        Ok(next)
    }

    fn candidate_moves(&self, snapshot: &GameSnapshot, player: &PlayerId) -> Vec<Move> {
        let Some(hand) = snapshot.hand(player) else {
            return Vec::new();
        };

        let mut moves = Vec::with_capacity(hand.len() + 1);
        for card in hand.iter() {
            if card.is_wild() {
                for color in Color::PLAYABLE {
                    moves.push(Move::play_wild(player.clone(), card.id, color));
                }
            } else {
                moves.push(Move::play(player.clone(), card.id));
            }
        }
        moves.push(Move::draw(player.clone()));
        moves
    }

    fn outcome<'a>(&self, snapshot: &'a GameSnapshot) -> Option<&'a PlayerId> {
        match snapshot.status {
            GameStatus::Finished => snapshot.winner.as_ref(),
            _ => None,
        }
    }
}

/// May `card` answer a pending draw?
///
/// A WildDrawFour always stacks. A DrawTwo stacks on another DrawTwo or on
/// a WildDrawFour whose chosen color it matches.
fn can_stack(card: &Card, top: &Card, current_color: Color) -> bool {
    match card.kind {
        CardKind::WildDrawFour => true,
        CardKind::DrawTwo => top.kind == CardKind::DrawTwo || card.color == current_color,
        _ => false,
    }
}
