//! Snapshot persistence behind an optimistic compare-and-swap.
//!
//! The trait is the whole contract the coordinator needs. `InMemoryGameStore`
//! keeps encoded snapshots in a sharded map; it is the adapter the tests and
//! single-process hosts use.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::trace;

use crate::core::id::GameId;
use crate::core::state::GameSnapshot;

use super::error::StoreError;

/// Load and save snapshots by game id.
///
/// ## Implementation Notes
///
/// - `compare_and_swap` must be atomic per game: compare the stored version
///   with `expected_version` and replace in one step
/// - A swap whose snapshot is not exactly `expected_version + 1` is an
///   `InvalidVersion` error, not a lost race
/// - Return `Ok(false)` for a lost race; the coordinator retries
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Persist a brand new game.
    async fn create(&self, snapshot: &GameSnapshot) -> Result<GameId, StoreError>;

    /// The latest committed snapshot. Its `version()` is the CAS token.
    async fn load(&self, game_id: GameId) -> Result<GameSnapshot, StoreError>;

    /// Replace the stored snapshot if its version is still `expected_version`.
    async fn compare_and_swap(
        &self,
        game_id: GameId,
        expected_version: u64,
        snapshot: &GameSnapshot,
    ) -> Result<bool, StoreError>;
}

/// Process-local store. Snapshots are kept bincode-encoded, as a real
/// backend would keep bytes.
#[derive(Debug, Default)]
pub struct InMemoryGameStore {
    games: DashMap<GameId, StoredGame>,
}

#[derive(Debug)]
struct StoredGame {
    version: u64,
    bytes: Vec<u8>,
}

impl InMemoryGameStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    fn encode(snapshot: &GameSnapshot) -> Result<StoredGame, StoreError> {
        Ok(StoredGame {
            version: snapshot.version(),
            bytes: bincode::serialize(snapshot)?,
        })
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn create(&self, snapshot: &GameSnapshot) -> Result<GameId, StoreError> {
        let game_id = snapshot.game_id();
        let stored = Self::encode(snapshot)?;

        match self.games.entry(game_id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(game_id)),
            Entry::Vacant(slot) => {
                slot.insert(stored);
                trace!(game.id = %game_id, version = snapshot.version(), "Stored new game");
                Ok(game_id)
            }
        }
    }

    async fn load(&self, game_id: GameId) -> Result<GameSnapshot, StoreError> {
        let stored = self.games.get(&game_id).ok_or(StoreError::NotFound(game_id))?;
        Ok(bincode::deserialize(&stored.bytes)?)
    }

    async fn compare_and_swap(
        &self,
        game_id: GameId,
        expected_version: u64,
        snapshot: &GameSnapshot,
    ) -> Result<bool, StoreError> {
        if snapshot.version() != expected_version + 1 {
            return Err(StoreError::InvalidVersion {
                expected: expected_version,
                found: snapshot.version(),
            });
        }
        let encoded = Self::encode(snapshot)?;

        let mut stored = self.games.get_mut(&game_id).ok_or(StoreError::NotFound(game_id))?;
        if stored.version != expected_version {
            trace!(
                game.id = %game_id,
                expected = expected_version,
                stored = stored.version,
                "Version moved on, swap refused"
            );
            return Ok(false);
        }
        *stored = encoded;
        Ok(true)
    }
}
