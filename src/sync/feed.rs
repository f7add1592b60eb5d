//! Change notification for committed snapshots.
//!
//! Delivery is at least once and may skip: a subscriber that falls behind
//! the channel capacity jumps ahead to newer snapshots. Since every snapshot
//! is a full state, skipping is harmless; consumers drop anything not newer
//! than what they already hold (see `latest_versions`).
//!
//! Channels live only while someone is watching. Publishing the finished
//! snapshot of a game closes its channel, so subscriptions end there.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::core::id::GameId;
use crate::core::state::{GameSnapshot, GameStatus};

use super::error::FeedError;

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Announce a committed snapshot to everyone watching `game_id`.
    async fn publish(&self, game_id: GameId, snapshot: &GameSnapshot) -> Result<(), FeedError>;

    /// Snapshots published for `game_id` from now on.
    fn subscribe(&self, game_id: GameId) -> BoxStream<'static, GameSnapshot>;
}

/// Keep only snapshots newer than the last one yielded.
pub fn latest_versions(
    stream: BoxStream<'static, GameSnapshot>,
) -> BoxStream<'static, GameSnapshot> {
    let mut last_seen = 0u64;
    stream
        .filter(move |snapshot| {
            let newer = snapshot.version() > last_seen;
            if newer {
                last_seen = snapshot.version();
            }
            future::ready(newer)
        })
        .boxed()
}

/// One `tokio::sync::broadcast` channel per watched game, created by the
/// first subscriber.
#[derive(Debug)]
pub struct BroadcastChangeFeed {
    channels: DashMap<GameId, broadcast::Sender<GameSnapshot>>,
    capacity: usize,
}

impl BroadcastChangeFeed {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Drop the channel for a game. Open subscriptions end once they have
    /// read what was already sent.
    pub fn close(&self, game_id: GameId) {
        self.channels.remove(&game_id);
    }

    /// Games with an open channel.
    #[must_use]
    pub fn watched_games(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn subscriber_count(&self, game_id: GameId) -> usize {
        self.channels
            .get(&game_id)
            .map_or(0, |sender| sender.receiver_count())
    }
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl ChangeFeed for BroadcastChangeFeed {
    async fn publish(&self, game_id: GameId, snapshot: &GameSnapshot) -> Result<(), FeedError> {
        // No receivers is not an error, nobody is watching
        let delivered = match self.channels.get(&game_id) {
            Some(sender) => sender.send(snapshot.clone()).unwrap_or(0),
            None => 0,
        };
        debug!(game.id = %game_id, version = snapshot.version(), delivered, "Published snapshot");

        if snapshot.status() == GameStatus::Finished {
            self.close(game_id);
        } else if delivered == 0 {
            self.channels
                .remove_if(&game_id, |_, sender| sender.receiver_count() == 0);
        }
        Ok(())
    }

    fn subscribe(&self, game_id: GameId) -> BoxStream<'static, GameSnapshot> {
        // Subscribe under the entry lock so a concurrent prune cannot orphan us
        let receiver = self
            .channels
            .entry(game_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        BroadcastStream::new(receiver)
            .filter_map(move |item| {
                future::ready(match item {
                    Ok(snapshot) => Some(snapshot),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        debug!(game.id = %game_id, skipped, "Subscriber lagged");
                        None
                    }
                })
            })
            .boxed()
    }
}
