//! Full games played with random legal moves.
//!
//! Every step must keep the 108 cards conserved, bump the version by one
//! and only ever hand the turn to a seated player.

mod common;

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use common::*;
use uno_engine::{
    CoordinatorConfig, GameConfig, GameSnapshot, GameStatus, PlayerId, RulesEngine, UnoRules,
};

const MAX_TURNS: usize = 3_000;

/// Play until someone wins or `MAX_TURNS` pass. Returns the last snapshot.
fn play_out(mut snapshot: GameSnapshot, seed: u64) -> GameSnapshot {
    let rules = UnoRules::new();
    let mut chooser = ChaCha8Rng::seed_from_u64(seed);

    for _ in 0..MAX_TURNS {
        if snapshot.status() == GameStatus::Finished {
            break;
        }
        let active = snapshot.active_player().cloned().unwrap();
        let legal = rules.legal_moves(&snapshot, &active);
        let Some(mv) = legal.choose(&mut chooser) else {
            break;
        };

        // Nobody else may move right now
        for other in snapshot.players().filter(|p| **p != active) {
            assert!(rules.legal_moves(&snapshot, other).is_empty());
        }

        let next = rules.apply(&snapshot, mv).unwrap();
        assert_eq!(next.version(), snapshot.version() + 1);
        assert!(next.check_conservation().is_ok());
        assert!(next.turn().active < next.player_count());
        assert_eq!(next.last_move().map(|r| &r.mv), Some(mv));
        snapshot = next;
    }
    snapshot
}

fn assert_finished_properly(snapshot: &GameSnapshot) {
    let winner = snapshot.winner().unwrap();
    assert!(snapshot.hand(winner).unwrap().is_empty());
    assert_eq!(snapshot.turn().pending_draw, 0);
    assert_eq!(UnoRules.outcome(snapshot), Some(winner));
    for player in snapshot.players().filter(|p| *p != winner) {
        assert!(!snapshot.hand(player).unwrap().is_empty());
    }
}

#[test]
fn test_random_playouts_standard_rules() {
    let names = ["a", "b", "c", "d", "e"];
    let mut finished = 0;

    for seed in 0..24u64 {
        let seats = 2 + (seed as usize % 4);
        let start = started_game(&names[..seats], GameConfig::default().with_seed(seed));
        let end = play_out(start, seed);

        if end.status() == GameStatus::Finished {
            assert_finished_properly(&end);
            finished += 1;
        }
    }
    assert!(finished > 0);
}

#[test]
fn test_random_playouts_with_stacking() {
    let names = ["a", "b", "c", "d"];
    let mut finished = 0;

    for seed in 100..116u64 {
        let seats = 2 + (seed as usize % 3);
        let rules = GameConfig::default()
            .with_seed(seed)
            .with_stacking(true)
            .with_relaxed_wild_draw_four(true);
        let end = play_out(started_game(&names[..seats], rules), seed);

        if end.status() == GameStatus::Finished {
            assert_finished_properly(&end);
            finished += 1;
        }
    }
    assert!(finished > 0);
}

#[test]
fn test_playout_replays_identically() {
    let start = started_game(&["a", "b", "c"], GameConfig::default().with_seed(77));
    let first = play_out(start.clone(), 5);
    let second = play_out(start, 5);
    assert_eq!(first, second);
}

/// Each player runs in its own task and only acts on its own turn, as
/// clients would. The coordinator is the only thing keeping them in line.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clients_finish_a_game() {
    init_logging();
    let config = CoordinatorConfig::default().with_retry_backoff(Duration::from_millis(1));
    let coordinator = Arc::new(memory_coordinator(config));

    let rules = GameConfig::default().with_seed(31).with_auto_start(Some(3));
    let id = coordinator.new_game(pid("a"), "A", rules).await.unwrap();
    coordinator.join_game(id, pid("b"), "B").await.unwrap();
    coordinator.join_game(id, pid("c"), "C").await.unwrap();

    let clients: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let coordinator = Arc::clone(&coordinator);
            let me = PlayerId::new(name);
            tokio::spawn(async move {
                let mut chooser = ChaCha8Rng::seed_from_u64(i as u64);
                loop {
                    let snapshot = coordinator.snapshot(id).await.unwrap();
                    if snapshot.status() == GameStatus::Finished
                        || snapshot.version() > MAX_TURNS as u64
                    {
                        return snapshot.version();
                    }
                    let Some(active) = snapshot.active_player().cloned() else {
                        return snapshot.version();
                    };
                    if UnoRules.legal_moves(&snapshot, &active).is_empty() {
                        return snapshot.version();
                    }
                    if active != me {
                        tokio::task::yield_now().await;
                        continue;
                    }
                    let legal = UnoRules.legal_moves(&snapshot, &me);
                    let Some(mv) = legal.choose(&mut chooser).cloned() else {
                        return snapshot.version();
                    };
                    // Nobody else can move on our turn, so this must commit
                    let next = coordinator.submit(id, mv).await.unwrap();
                    assert_eq!(next.version(), snapshot.version() + 1);
                }
            })
        })
        .collect();

    let mut seen = Vec::new();
    for client in clients {
        seen.push(client.await.unwrap());
    }

    let last = coordinator.snapshot(id).await.unwrap();
    assert!(last.check_conservation().is_ok());
    assert!(seen.iter().all(|&v| v == last.version()));
    if last.status() == GameStatus::Finished {
        assert_finished_properly(&last);
    }
}
