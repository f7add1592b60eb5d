//! # uno-engine
//!
//! An UNO rules engine with an optimistic-concurrency coordinator, for
//! servers where many players act on one shared game at once.
//!
//! ## Design Principles
//!
//! 1. **Snapshots, Not Mutation**: Every accepted move produces a new
//!    immutable `GameSnapshot` one version higher. Cloning is O(1) via
//!    `im-rs`.
//!
//! 2. **Pure Rules**: `RulesEngine::apply` never does I/O and is
//!    deterministic. Reshuffles draw from the RNG state stored in the
//!    snapshot.
//!
//! 3. **Version Fencing**: The coordinator commits with compare-and-swap on
//!    `version` and retries on conflict. No lock is held across a move.
//!
//! ## Modules
//!
//! - `core`: Ids, players, moves, snapshots, RNG, configuration
//! - `cards`: The 108-card deck, hands, draw and discard piles
//! - `rules`: Move validation, turn order, lobby transitions
//! - `sync`: Coordinator, store and change feed
//!
//! ## Example
//!
//! ```
//! use uno_engine::{GameConfig, GameId, Move, PlayerId, RulesEngine, UnoRules};
//! use uno_engine::rules::lobby;
//!
//! let rules = GameConfig::default().with_seed(3);
//! let game = lobby::create_game(GameId::new_v4(), PlayerId::new("ann"), "Ann", rules).unwrap();
//! let game = lobby::join(&game, PlayerId::new("bo"), "Bo").unwrap();
//!
//! let next = UnoRules.apply(&game, &Move::draw(PlayerId::new("ann"))).unwrap();
//! assert_eq!(next.version(), game.version() + 1);
//! assert_eq!(next.active_player(), Some(&PlayerId::new("bo")));
//! ```

pub mod cards;
pub mod core;
pub mod rules;
pub mod sync;

// Re-export commonly used types
pub use crate::core::{
    ConfigError, CoordinatorConfig, EngineSettings, GameConfig,
    GameId, PlayerId, Seat,
    GameRng, GameRngState,
    Move, MoveRecord,
    GameSnapshot, GameStatus, OpponentSummary, PlayerView,
};

pub use crate::cards::{Card, CardId, CardKind, Color, Deck, Hand, DECK_SIZE};

pub use crate::rules::{
    Direction, EngineError, ErrorCategory, IntegrityError, RulesEngine, TurnState, UnoRules,
};

pub use crate::sync::{
    BroadcastChangeFeed, ChangeFeed, CommitPhase, Coordinator, CoordinatorError,
    FeedError, GameStore, InMemoryGameStore, StoreError,
};
