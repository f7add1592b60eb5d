//! Errors from the store, the feed and the coordinator.

use thiserror::Error;

use crate::core::id::GameId;
use crate::rules::error::{EngineError, ErrorCategory};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("game {0} not found")]
    NotFound(GameId),

    #[error("game {0} already exists")]
    AlreadyExists(GameId),

    /// A swap must advance the version by exactly one.
    #[error("snapshot version {found} does not follow expected version {expected}")]
    InvalidVersion { expected: u64, found: u64 },

    #[error("snapshot codec error: {0}")]
    Codec(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            StoreError::NotFound(_) => ErrorCategory::Validation,
            StoreError::AlreadyExists(_)
            | StoreError::InvalidVersion { .. }
            | StoreError::Codec(_) => ErrorCategory::Integrity,
            StoreError::Backend(_) => ErrorCategory::Infrastructure,
        }
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("change feed backend error: {0}")]
    Backend(String),
}

/// Anything `Coordinator` can return.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("game {game_id}: gave up after {attempts} conflicting attempts")]
    Conflict { game_id: GameId, attempts: u32 },

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("invalid game rules: {0}")]
    InvalidRules(String),
}

impl CoordinatorError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoordinatorError::Engine(err) => err.category(),
            CoordinatorError::InvalidRules(_) => ErrorCategory::Validation,
            CoordinatorError::Conflict { .. } => ErrorCategory::Concurrency,
            CoordinatorError::Store(err) => err.category(),
            CoordinatorError::Timeout { .. } | CoordinatorError::Feed(_) => {
                ErrorCategory::Infrastructure
            }
        }
    }

    /// Is this a rule violation the player should see?
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, CoordinatorError::Engine(err) if err.category() == ErrorCategory::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::error::IntegrityError;

    #[test]
    fn test_categories() {
        let id = GameId::new_v4();

        assert_eq!(
            CoordinatorError::from(EngineError::NotYourTurn).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            CoordinatorError::from(EngineError::from(IntegrityError::Conservation("x".into())))
                .category(),
            ErrorCategory::Integrity
        );
        assert_eq!(
            CoordinatorError::Conflict { game_id: id, attempts: 5 }.category(),
            ErrorCategory::Concurrency
        );
        assert_eq!(
            CoordinatorError::Timeout { operation: "load" }.category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            CoordinatorError::from(StoreError::NotFound(id)).category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_is_rejection() {
        assert!(CoordinatorError::from(EngineError::IllegalMove).is_rejection());
        assert!(!CoordinatorError::Timeout { operation: "load" }.is_rejection());
    }

    #[test]
    fn test_engine_message_passes_through() {
        let err = CoordinatorError::from(EngineError::NotYourTurn);
        assert_eq!(err.to_string(), "it is not your turn");
    }
}
