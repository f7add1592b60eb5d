//! Concurrency: the commit loop plus the store and feed it talks to.
//!
//! ## Key Types
//!
//! - `Coordinator`: Applies transitions with compare-and-swap and retry
//! - `GameStore` / `InMemoryGameStore`: Versioned snapshot persistence
//! - `ChangeFeed` / `BroadcastChangeFeed`: Snapshot fan-out per game

pub mod coordinator;
pub mod error;
pub mod feed;
pub mod store;

pub use coordinator::{CommitPhase, Coordinator};
pub use error::{CoordinatorError, FeedError, StoreError};
pub use feed::{latest_versions, BroadcastChangeFeed, ChangeFeed};
pub use store::{GameStore, InMemoryGameStore};
