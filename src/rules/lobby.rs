//! Game creation, joining and starting as pure snapshot transitions.
//!
//! These run through the same compare-and-swap loop as moves, so two
//! players joining at once can never overwrite each other's seat.

use im::Vector;

use crate::cards::{standard_deck, CardKind, Deck};
use crate::core::config::GameConfig;
use crate::core::id::GameId;
use crate::core::player::{PlayerId, Seat};
use crate::core::rng::GameRng;
use crate::core::state::{GameSnapshot, GameStatus};

use super::error::EngineError;
use super::turn::TurnState;

/// Build the first snapshot of a game (version 1).
///
/// Shuffles a fresh deck, deals the creator's hand and turns up the
/// starting discard. A WildDrawFour seed goes back into the pile and the
/// pile is reshuffled until something else turns up.
pub fn create_game(
    game_id: GameId,
    creator: PlayerId,
    name: impl Into<String>,
    rules: GameConfig,
) -> Result<GameSnapshot, EngineError> {
    // A draw pile with nothing but WildDrawFours left would never yield a seed
    rules
        .validate()
        .map_err(|err| EngineError::InvalidRules(err.to_string()))?;

    let mut rng = match rules.seed {
        Some(seed) => GameRng::new(seed),
        None => GameRng::from_entropy(),
    };

    let deck = Deck::shuffled(standard_deck(), &mut rng);
    let (hand, mut deck) = deck.draw(rules.hand_size, &mut rng)?;

    let seed_card = loop {
        let (drawn, rest) = deck.draw(1, &mut rng)?;
        let card = drawn[0];
        if card.kind == CardKind::WildDrawFour {
            deck = rest.bury([card], &mut rng);
            continue;
        }
        deck = rest.discard(card);
        break card;
    };

    let mut seat = Seat::new(creator.clone(), name, 1);
    seat.hand.extend(hand);

    Ok(GameSnapshot {
        game_id,
        version: 1,
        creator,
        rules,
        seats: Vector::unit(seat),
        deck,
        turn: TurnState::opening(seed_card.color),
        status: GameStatus::Waiting,
        winner: None,
        rng: rng.state(),
        last_move: None,
    })
}

/// Seat `player` and deal their hand.
///
/// Starts the game in the same transition when the seat count reaches
/// `auto_start_players`.
pub fn join(
    snapshot: &GameSnapshot,
    player: PlayerId,
    name: impl Into<String>,
) -> Result<GameSnapshot, EngineError> {
    if snapshot.status != GameStatus::Waiting {
        return Err(EngineError::GameAlreadyStarted);
    }
    if snapshot.seat_of(&player).is_some() {
        return Err(EngineError::AlreadyJoined);
    }
    if snapshot.seats.len() >= snapshot.rules.max_players {
        return Err(EngineError::TableFull {
            max: snapshot.rules.max_players,
        });
    }

    let mut rng = GameRng::from_state(&snapshot.rng);
    let (hand, deck) = snapshot.deck.draw(snapshot.rules.hand_size, &mut rng)?;

    let order = snapshot.seats.iter().map(|s| s.order).max().unwrap_or(0) + 1;
    let mut seat = Seat::new(player, name, order);
    seat.hand.extend(hand);

    let mut next = snapshot.clone();
    next.seats.push_back(seat);
    next.deck = deck;
    next.rng = rng.state();
    next.version += 1;

    if next.rules.auto_start_players == Some(next.seats.len()) {
        begin_play(&mut next);
    }
    Ok(next)
}

/// Move a waiting game into play. Only the creator may do this.
pub fn start(snapshot: &GameSnapshot, player: &PlayerId) -> Result<GameSnapshot, EngineError> {
    if snapshot.status != GameStatus::Waiting {
        return Err(EngineError::GameAlreadyStarted);
    }
    if player != &snapshot.creator {
        return Err(EngineError::NotGameCreator);
    }
    if snapshot.seats.len() < snapshot.rules.min_players {
        return Err(EngineError::NotEnoughPlayers {
            min: snapshot.rules.min_players,
            have: snapshot.seats.len(),
        });
    }

    let mut next = snapshot.clone();
    next.version += 1;
    begin_play(&mut next);
    Ok(next)
}

fn begin_play(snapshot: &mut GameSnapshot) {
    snapshot.status = GameStatus::Playing;
    snapshot.turn = TurnState::opening(snapshot.turn.current_color);
}
