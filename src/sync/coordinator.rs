//! Serialize concurrent submissions per game with optimistic versioning.
//!
//! No lock is held across a transition. Each submission loads the latest
//! snapshot, runs a pure transition on it and tries to swap the result in
//! at `version + 1`. Losing the race means someone else committed first;
//! the loop reloads and validates against their snapshot instead.
//!
//! ## Commit loop
//!
//! ```text
//! Idle -> Loading -> Validating -> Committing -> Committed
//!            ^                         |
//!            +-------- Conflict <------+
//!                     Validating -> Rejected
//! ```
//!
//! Store and feed calls are each bounded by `CoordinatorConfig::io_timeout`.
//! A write that timed out may still land later, so every such candidate is
//! kept until a reload settles it. A swap can only ever write at its own
//! version:
//!
//! - stored snapshot equal to a candidate: it landed, return it
//! - another snapshot holds the candidate's version: it can never land
//! - stored version still below the candidate's: undecided, keep retrying
//! - stored version past an undecided candidate: it may have landed and been
//!   overwritten, so surface `Timeout` rather than apply the move twice

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, trace, warn};

use crate::core::action::Move;
use crate::core::config::{CoordinatorConfig, GameConfig};
use crate::core::id::GameId;
use crate::core::player::PlayerId;
use crate::core::state::{GameSnapshot, PlayerView};
use crate::rules::engine::{RulesEngine, UnoRules};
use crate::rules::error::EngineError;
use crate::rules::lobby;

use super::error::CoordinatorError;
use super::feed::{latest_versions, ChangeFeed};
use super::store::GameStore;

/// Spread retries by up to this fraction of the base delay either way.
const JITTER_FRACTION: f64 = 0.2;

/// Where a submission is in the commit loop. Recorded on trace events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommitPhase {
    Idle,
    Loading,
    Validating,
    Committing,
    Committed,
    Conflict,
    Rejected,
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitPhase::Idle => "idle",
            CommitPhase::Loading => "loading",
            CommitPhase::Validating => "validating",
            CommitPhase::Committing => "committing",
            CommitPhase::Committed => "committed",
            CommitPhase::Conflict => "conflict",
            CommitPhase::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Outcome of one pass through the loop that did not commit.
enum Retry {
    /// Lost the swap to another writer.
    Conflict,
    /// A store call timed out.
    TimedOut { operation: &'static str },
}

/// What a reload says about candidates whose swap timed out.
#[derive(Debug, PartialEq, Eq)]
enum Unconfirmed {
    /// The stored snapshot is one of them.
    Landed,
    /// None has landed yet; retrying is safe.
    Open,
    /// The store moved past one that might have landed in between.
    Ambiguous,
}

/// Settle timed out candidates against the stored snapshot, dropping any
/// whose version slot another writer already took.
fn reconcile(sent: &mut Vec<GameSnapshot>, current: &GameSnapshot) -> Unconfirmed {
    if sent.iter().any(|candidate| candidate == current) {
        return Unconfirmed::Landed;
    }
    sent.retain(|candidate| candidate.version() != current.version());
    if sent.iter().any(|candidate| candidate.version() < current.version()) {
        Unconfirmed::Ambiguous
    } else {
        Unconfirmed::Open
    }
}

/// The only writer of game snapshots.
///
/// Cheap to share: wrap it in an `Arc` and call it from any number of tasks.
pub struct Coordinator<S, F, R = UnoRules> {
    store: Arc<S>,
    feed: Arc<F>,
    rules: R,
    config: CoordinatorConfig,
}

impl<S, F> Coordinator<S, F, UnoRules>
where
    S: GameStore,
    F: ChangeFeed,
{
    #[must_use]
    pub fn new(store: Arc<S>, feed: Arc<F>, config: CoordinatorConfig) -> Self {
        Self::with_rules(store, feed, UnoRules::new(), config)
    }
}

impl<S, F, R> Coordinator<S, F, R>
where
    S: GameStore,
    F: ChangeFeed,
    R: RulesEngine + Send + Sync,
{
    #[must_use]
    pub fn with_rules(store: Arc<S>, feed: Arc<F>, rules: R, config: CoordinatorConfig) -> Self {
        Self {
            store,
            feed,
            rules,
            config,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[must_use]
    pub fn feed(&self) -> &Arc<F> {
        &self.feed
    }

    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    #[must_use]
    pub fn rules(&self) -> &R {
        &self.rules
    }

    // =========================================================================
    // Public operations
    // =========================================================================

    /// Create a game under a fresh id with `creator` in the first seat.
    pub async fn new_game(
        &self,
        creator: PlayerId,
        name: impl Into<String>,
        rules: GameConfig,
    ) -> Result<GameId, CoordinatorError> {
        rules
            .validate()
            .map_err(|err| CoordinatorError::InvalidRules(err.to_string()))?;

        let snapshot = lobby::create_game(GameId::new_v4(), creator, name, rules)?;
        self.verify(&snapshot)?;

        let game_id = self.bounded("create", self.store.create(&snapshot)).await?;
        info!(
            game.id = %game_id,
            creator = %snapshot.creator(),
            version = snapshot.version(),
            "Game created"
        );
        self.publish(&snapshot).await;
        Ok(game_id)
    }

    /// Seat `player` in a waiting game.
    pub async fn join_game(
        &self,
        game_id: GameId,
        player: PlayerId,
        name: impl Into<String>,
    ) -> Result<GameSnapshot, CoordinatorError> {
        let name = name.into();
        self.commit(game_id, "join", &player, |snapshot| {
            lobby::join(snapshot, player.clone(), name.clone())
        })
        .await
    }

    /// Start a waiting game. Only its creator may.
    pub async fn start_game(
        &self,
        game_id: GameId,
        player: PlayerId,
    ) -> Result<GameSnapshot, CoordinatorError> {
        self.commit(game_id, "start", &player, |snapshot| {
            lobby::start(snapshot, &player)
        })
        .await
    }

    /// Validate and commit one move. Returns the snapshot it produced.
    pub async fn submit(&self, game_id: GameId, mv: Move) -> Result<GameSnapshot, CoordinatorError> {
        self.commit(game_id, "move", mv.player(), |snapshot| {
            self.rules.apply(snapshot, &mv)
        })
        .await
    }

    /// Snapshots committed from now on, oldest first, stale repeats dropped.
    pub fn subscribe(&self, game_id: GameId) -> BoxStream<'static, GameSnapshot> {
        latest_versions(self.feed.subscribe(game_id))
    }

    /// The latest committed snapshot.
    pub async fn snapshot(&self, game_id: GameId) -> Result<GameSnapshot, CoordinatorError> {
        self.bounded("load", self.store.load(game_id)).await
    }

    /// What `player` may see of the latest snapshot.
    pub async fn view(
        &self,
        game_id: GameId,
        player: &PlayerId,
    ) -> Result<PlayerView, CoordinatorError> {
        let snapshot = self.snapshot(game_id).await?;
        snapshot
            .view_for(player)
            .ok_or(CoordinatorError::Engine(EngineError::UnknownPlayer))
    }

    // =========================================================================
    // Commit loop
    // =========================================================================

    async fn commit<T>(
        &self,
        game_id: GameId,
        operation: &'static str,
        player: &PlayerId,
        transition: T,
    ) -> Result<GameSnapshot, CoordinatorError>
    where
        T: Fn(&GameSnapshot) -> Result<GameSnapshot, EngineError> + Send + Sync,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut unconfirmed: Vec<GameSnapshot> = Vec::new();
        let mut last_failure = Retry::Conflict;

        trace!(game.id = %game_id, operation, %player, phase = %CommitPhase::Idle, "Submission received");

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                sleep(self.backoff(attempt - 1)).await;
            }

            trace!(game.id = %game_id, attempt, phase = %CommitPhase::Loading, "Loading snapshot");
            let current = match self.bounded("load", self.store.load(game_id)).await {
                Ok(snapshot) => snapshot,
                Err(CoordinatorError::Timeout { operation: op }) => {
                    warn!(game.id = %game_id, attempt, operation = op, "Store call timed out, retrying");
                    last_failure = Retry::TimedOut { operation: op };
                    continue;
                }
                Err(err) => return Err(err),
            };

            match reconcile(&mut unconfirmed, &current) {
                Unconfirmed::Landed => {
                    info!(
                        game.id = %game_id,
                        operation,
                        %player,
                        version = current.version(),
                        attempt,
                        "Timed out write had landed"
                    );
                    self.publish(&current).await;
                    return Ok(current);
                }
                Unconfirmed::Ambiguous => {
                    warn!(
                        game.id = %game_id,
                        operation,
                        stored = current.version(),
                        pending = unconfirmed.len(),
                        "Cannot tell whether timed out write landed"
                    );
                    return Err(CoordinatorError::Timeout {
                        operation: "compare_and_swap",
                    });
                }
                Unconfirmed::Open => {}
            }

            trace!(
                game.id = %game_id,
                attempt,
                version = current.version(),
                phase = %CommitPhase::Validating,
                "Applying transition"
            );
            let candidate = match transition(&current) {
                Ok(candidate) => candidate,
                Err(err) => {
                    debug!(
                        game.id = %game_id,
                        operation,
                        %player,
                        version = current.version(),
                        phase = %CommitPhase::Rejected,
                        error = %err,
                        "Transition rejected"
                    );
                    return Err(err.into());
                }
            };
            self.verify(&candidate)?;

            trace!(
                game.id = %game_id,
                attempt,
                expected = current.version(),
                phase = %CommitPhase::Committing,
                "Swapping snapshot"
            );
            let swap = self
                .store
                .compare_and_swap(game_id, current.version(), &candidate);
            match self.bounded("compare_and_swap", swap).await {
                Ok(true) => {
                    info!(
                        game.id = %game_id,
                        operation,
                        %player,
                        version = candidate.version(),
                        attempt,
                        phase = %CommitPhase::Committed,
                        "Committed"
                    );
                    self.publish(&candidate).await;
                    return Ok(candidate);
                }
                Ok(false) => {
                    debug!(
                        game.id = %game_id,
                        operation,
                        attempt,
                        expected = current.version(),
                        phase = %CommitPhase::Conflict,
                        "Lost compare-and-swap, reloading"
                    );
                    last_failure = Retry::Conflict;
                }
                Err(CoordinatorError::Timeout { operation: op }) => {
                    warn!(game.id = %game_id, attempt, operation = op, "Store call timed out, retrying");
                    if !unconfirmed.contains(&candidate) {
                        unconfirmed.push(candidate);
                    }
                    last_failure = Retry::TimedOut { operation: op };
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(landed) = self.landed(game_id, &unconfirmed).await {
            info!(game.id = %game_id, operation, version = landed.version(), "Timed out write had landed");
            self.publish(&landed).await;
            return Ok(landed);
        }

        match last_failure {
            Retry::TimedOut { operation: op } => {
                warn!(game.id = %game_id, operation, attempts = max_attempts, "Giving up after timeouts");
                Err(CoordinatorError::Timeout { operation: op })
            }
            Retry::Conflict => {
                warn!(
                    game.id = %game_id,
                    operation,
                    %player,
                    attempts = max_attempts,
                    "Giving up after repeated conflicts"
                );
                Err(CoordinatorError::Conflict {
                    game_id,
                    attempts: max_attempts,
                })
            }
        }
    }

    /// Check the card population before anything is written.
    fn verify(&self, candidate: &GameSnapshot) -> Result<(), CoordinatorError> {
        candidate.check_conservation().map_err(|err| {
            error!(
                game.id = %candidate.game_id(),
                version = candidate.version(),
                error = %err,
                "Integrity check failed, refusing to write"
            );
            CoordinatorError::Engine(EngineError::Integrity(err))
        })
    }

    /// One last look for any timed out candidate in the store.
    async fn landed(&self, game_id: GameId, sent: &[GameSnapshot]) -> Option<GameSnapshot> {
        if sent.is_empty() {
            return None;
        }
        let stored = self.bounded("load", self.store.load(game_id)).await.ok()?;
        sent.contains(&stored).then_some(stored)
    }

    /// Publishing is best effort once the write has committed.
    async fn publish(&self, snapshot: &GameSnapshot) {
        let game_id = snapshot.game_id();
        if let Err(err) = self.bounded("publish", self.feed.publish(game_id, snapshot)).await {
            warn!(
                game.id = %game_id,
                version = snapshot.version(),
                error = %err,
                "Publish failed after commit"
            );
        }
    }

    async fn bounded<T, E>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, CoordinatorError>
    where
        CoordinatorError: From<E>,
    {
        match timeout(self.config.io_timeout(), call).await {
            Ok(result) => result.map_err(CoordinatorError::from),
            Err(_) => Err(CoordinatorError::Timeout { operation }),
        }
    }

    /// Exponential backoff with jitter for the retry after `attempt`.
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_for(attempt);
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * JITTER_FRACTION;
        base.mul_f64(1.0 + jitter)
    }
}
