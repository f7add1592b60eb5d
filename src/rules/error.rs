//! Rule violations and integrity failures.
//!
//! Validation variants are a player's mistake: surface them verbatim.
//! `Integrity` means the engine itself is wrong and should be treated as a bug.

use thiserror::Error;

use crate::cards::CardId;

/// Broad grouping used by callers to decide how to react to an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected move. Nothing changed; tell the player why.
    Validation,
    /// Lost an optimistic race. Resubmitting may succeed.
    Concurrency,
    /// Broken invariant. Log it and report a generic failure.
    Integrity,
    /// Store or feed unavailable.
    Infrastructure,
}

/// Invariant violations inside a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("deck exhausted: needed {requested} cards, {available} available after reshuffle")]
    DeckExhausted { requested: usize, available: usize },

    #[error("card conservation violated: {0}")]
    Conservation(String),
}

/// Why the rules engine refused a transition.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("game is not in progress")]
    GameNotActive,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("a pending draw must be resolved first")]
    MustResolvePendingDraw,

    #[error("{0} is not in your hand")]
    CardNotInHand(CardId),

    #[error("that card cannot be played now")]
    IllegalMove,

    #[error("wild cards need a red, blue, green or yellow color choice")]
    MissingColorChoice,

    #[error("game has already started")]
    GameAlreadyStarted,

    #[error("player has already joined this game")]
    AlreadyJoined,

    #[error("table is full ({max} players)")]
    TableFull { max: usize },

    #[error("need at least {min} players to start, have {have}")]
    NotEnoughPlayers { min: usize, have: usize },

    #[error("only the game creator can do that")]
    NotGameCreator,

    #[error("player is not seated in this game")]
    UnknownPlayer,

    #[error("invalid game rules: {0}")]
    InvalidRules(String),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl EngineError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::Integrity(_) => ErrorCategory::Integrity,
            _ => ErrorCategory::Validation,
        }
    }
}
