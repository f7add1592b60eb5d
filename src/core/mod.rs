//! Core types: ids, players, moves, snapshots, RNG, configuration.
//!
//! Nothing here validates moves. The rules module turns one snapshot into
//! the next; the sync module stores and broadcasts them.

pub mod action;
pub mod config;
pub mod id;
pub mod player;
pub mod rng;
pub mod state;

pub use action::{Move, MoveRecord};
pub use config::{ConfigError, CoordinatorConfig, EngineSettings, GameConfig};
pub use id::GameId;
pub use player::{PlayerId, Seat};
pub use rng::{GameRng, GameRngState};
pub use state::{GameSnapshot, GameStatus, OpponentSummary, PlayerView};
