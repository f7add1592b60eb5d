//! Shared helpers for integration tests: logging, game setup and store
//! doubles that lose races or stall on purpose.
//!
//! Set `TEST_LOG=debug` (or `RUST_LOG`) to see coordinator traces.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use uno_engine::rules::lobby;
use uno_engine::{
    BroadcastChangeFeed, ChangeFeed, Coordinator, CoordinatorConfig, FeedError, GameConfig,
    GameId, GameSnapshot, GameStore, InMemoryGameStore, Move, PlayerId, RulesEngine, StoreError,
    UnoRules,
};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Initialize test logging once per binary. `TEST_LOG`, then `RUST_LOG`,
/// then "warn".
pub fn init_logging() {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

pub fn pid(name: &str) -> PlayerId {
    PlayerId::new(name)
}

/// Rules with a fixed seed and no auto-start.
pub fn manual_rules(seed: u64) -> GameConfig {
    GameConfig::default().with_seed(seed).with_auto_start(None)
}

/// Create a game with `players` seated (first is creator) and start it.
pub fn started_game(players: &[&str], rules: GameConfig) -> GameSnapshot {
    let rules = rules.with_auto_start(None);
    let mut snapshot =
        lobby::create_game(GameId::new_v4(), pid(players[0]), players[0], rules).unwrap();
    for name in &players[1..] {
        snapshot = lobby::join(&snapshot, pid(name), *name).unwrap();
    }
    lobby::start(&snapshot, &pid(players[0])).unwrap()
}

pub fn memory_coordinator(
    config: CoordinatorConfig,
) -> Coordinator<InMemoryGameStore, BroadcastChangeFeed> {
    Coordinator::new(
        Arc::new(InMemoryGameStore::new()),
        Arc::new(BroadcastChangeFeed::new(config.feed_capacity)),
        config,
    )
}

// =============================================================================
// Racing store
// =============================================================================

type Rival = Box<dyn Fn(&GameSnapshot) -> Option<GameSnapshot> + Send + Sync>;

/// Once armed, commits a rival transition just before each of the next
/// `races` compare-and-swaps, so the caller's swap is always stale.
/// A stalling racer then hangs for `stall` before answering.
pub struct RacingStore {
    inner: InMemoryGameStore,
    rival: Rival,
    races: AtomicU32,
    injected: AtomicU32,
    stall: Option<Duration>,
}

impl RacingStore {
    pub fn new(rival: Rival) -> Self {
        Self {
            inner: InMemoryGameStore::new(),
            rival,
            races: AtomicU32::new(0),
            injected: AtomicU32::new(0),
            stall: None,
        }
    }

    /// Hang for `delay` after each injected rival commit.
    pub fn stalling(mut self, delay: Duration) -> Self {
        self.stall = Some(delay);
        self
    }

    /// Rival that seats a new player each time.
    pub fn joiners() -> Self {
        let count = AtomicU32::new(0);
        Self::new(Box::new(move |snapshot| {
            let n = count.fetch_add(1, Ordering::SeqCst);
            lobby::join(snapshot, PlayerId::new(format!("rival-{n}")), "Rival").ok()
        }))
    }

    /// Rival that draws for whoever is active.
    pub fn drawers() -> Self {
        Self::new(Box::new(|snapshot| {
            let active = snapshot.active_player()?.clone();
            UnoRules.apply(snapshot, &Move::draw(active)).ok()
        }))
    }

    /// Race the next `races` swaps.
    pub fn arm(&self, races: u32) {
        self.races.store(races, Ordering::SeqCst);
    }

    pub fn injected(&self) -> u32 {
        self.injected.load(Ordering::SeqCst)
    }

    fn take_race(&self) -> bool {
        self.races
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl GameStore for RacingStore {
    async fn create(&self, snapshot: &GameSnapshot) -> Result<GameId, StoreError> {
        self.inner.create(snapshot).await
    }

    async fn load(&self, game_id: GameId) -> Result<GameSnapshot, StoreError> {
        self.inner.load(game_id).await
    }

    async fn compare_and_swap(
        &self,
        game_id: GameId,
        expected_version: u64,
        snapshot: &GameSnapshot,
    ) -> Result<bool, StoreError> {
        if self.take_race() {
            let current = self.inner.load(game_id).await?;
            if let Some(rival) = (self.rival)(&current) {
                if self
                    .inner
                    .compare_and_swap(game_id, current.version(), &rival)
                    .await?
                {
                    self.injected.fetch_add(1, Ordering::SeqCst);
                }
            }
            if let Some(delay) = self.stall {
                tokio::time::sleep(delay).await;
            }
        }
        self.inner
            .compare_and_swap(game_id, expected_version, snapshot)
            .await
    }
}

// =============================================================================
// Stalling store
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stall {
    /// Hang before writing; the swap never happens.
    Lost,
    /// Write, then hang; the swap happened but the caller never hears.
    Landed,
    /// Hang without writing, then land the write just before the next swap.
    Late,
}

type Deferred = (GameId, u64, GameSnapshot);

/// Once armed, hangs for `delay` on the next `swaps` compare-and-swaps,
/// and on every load while load stalls are on.
pub struct StallingStore {
    inner: InMemoryGameStore,
    mode: Stall,
    delay: Duration,
    swaps: AtomicU32,
    stall_loads: AtomicBool,
    deferred: Mutex<Option<Deferred>>,
}

impl StallingStore {
    pub fn new(mode: Stall, delay: Duration) -> Self {
        Self {
            inner: InMemoryGameStore::new(),
            mode,
            delay,
            swaps: AtomicU32::new(0),
            stall_loads: AtomicBool::new(false),
            deferred: Mutex::new(None),
        }
    }

    pub fn arm_swaps(&self, swaps: u32) {
        self.swaps.store(swaps, Ordering::SeqCst);
    }

    pub fn stall_loads(&self, on: bool) {
        self.stall_loads.store(on, Ordering::SeqCst);
    }

    fn take_stall(&self) -> bool {
        self.swaps
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn take_deferred(&self) -> Option<Deferred> {
        self.deferred.lock().unwrap().take()
    }
}

#[async_trait]
impl GameStore for StallingStore {
    async fn create(&self, snapshot: &GameSnapshot) -> Result<GameId, StoreError> {
        self.inner.create(snapshot).await
    }

    async fn load(&self, game_id: GameId) -> Result<GameSnapshot, StoreError> {
        if self.stall_loads.load(Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.load(game_id).await
    }

    async fn compare_and_swap(
        &self,
        game_id: GameId,
        expected_version: u64,
        snapshot: &GameSnapshot,
    ) -> Result<bool, StoreError> {
        if let Some((id, expected, late)) = self.take_deferred() {
            self.inner.compare_and_swap(id, expected, &late).await?;
        }
        if !self.take_stall() {
            return self
                .inner
                .compare_and_swap(game_id, expected_version, snapshot)
                .await;
        }
        match self.mode {
            Stall::Lost => {
                tokio::time::sleep(self.delay).await;
                Ok(false)
            }
            Stall::Landed => {
                let swapped = self
                    .inner
                    .compare_and_swap(game_id, expected_version, snapshot)
                    .await?;
                tokio::time::sleep(self.delay).await;
                Ok(swapped)
            }
            Stall::Late => {
                *self.deferred.lock().unwrap() =
                    Some((game_id, expected_version, snapshot.clone()));
                tokio::time::sleep(self.delay).await;
                Ok(false)
            }
        }
    }
}

// =============================================================================
// Failing feed
// =============================================================================

/// Accepts subscriptions but refuses every publish.
#[derive(Default)]
pub struct FailingFeed {
    inner: BroadcastChangeFeed,
}

#[async_trait]
impl ChangeFeed for FailingFeed {
    async fn publish(&self, _game_id: GameId, _snapshot: &GameSnapshot) -> Result<(), FeedError> {
        Err(FeedError::Backend("broker unreachable".to_string()))
    }

    fn subscribe(&self, game_id: GameId) -> BoxStream<'static, GameSnapshot> {
        self.inner.subscribe(game_id)
    }
}
