//! Match registry loading and the periodic sweep

mod common;

use common::{Harness, config, settle};
use island_match::{MatchConfig, MatchError, MatchManager};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

#[test]
fn test_invalid_and_duplicate_configs_skipped() {
    let harness = Harness::new();
    let configs = vec![
        config(1, 4),
        config(2, 1),
        MatchConfig {
            name: "shadow".to_string(),
            ..config(1, 2)
        },
        config(3, 2),
    ];

    let manager = MatchManager::new(configs, harness.gateways());

    let ids: Vec<_> = manager.matches().map(|m| m.id()).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(manager.len(), 2);
    assert_eq!(manager.get(1).unwrap().config().name, "match-1");
}

#[test]
fn test_unknown_match() {
    let harness = Harness::new();
    let manager = MatchManager::new(vec![config(1, 2)], harness.gateways());

    assert!(matches!(
        manager.get(9),
        Err(MatchError::MatchNotFound(9))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_sweep_isolates_failing_match() {
    let harness = Harness::new();
    let configs = vec![
        // Stalls waiting for a bot the account tier cannot provide
        MatchConfig {
            bots_enabled: true,
            bot_idle_secs: 3,
            ..config(1, 2)
        },
        MatchConfig {
            rest_timeout_secs: 30,
            ..config(2, 2)
        },
    ];
    let manager = MatchManager::new(configs, harness.gateways());

    let first = manager.get(1).unwrap();
    first.signup("alice").await.unwrap();

    let second = manager.get(2).unwrap();
    second.signup("bob").await.unwrap();
    second.signup("carol").await.unwrap();
    settle(|| harness.game.adds().len() == 2).await;
    second.game_over(1).await.unwrap();

    tokio::time::advance(Duration::from_secs(31)).await;
    let mut report = manager.sweep().await;
    report.expired.sort();

    assert_eq!(report.failed, vec![1]);
    assert_eq!(
        report.expired,
        vec![(2, "bob".to_string()), (2, "carol".to_string())]
    );
    assert!(report.backfilled.is_empty());
    assert!(first.player("alice").await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_sweep_reports_backfill() {
    let harness = Harness::new();
    harness.accounts.push("bot-x", chrono::Duration::hours(1));
    let manager = MatchManager::new(
        vec![MatchConfig {
            bots_enabled: true,
            bot_idle_secs: 3,
            ..config(4, 2)
        }],
        harness.gateways(),
    );

    manager.get(4).unwrap().signup("alice").await.unwrap();
    tokio::time::advance(Duration::from_secs(4)).await;

    let report = manager.sweep().await;
    assert_eq!(report.backfilled, vec![(4, "bot-x".to_string())]);
    assert!(report.failed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_ticks_after_one_full_period() {
    let harness = Harness::new();
    let manager = Arc::new(MatchManager::new(vec![config(1, 2)], harness.gateways()));

    let sweeps = Arc::new(AtomicUsize::new(0));
    let counter = sweeps.clone();
    let handle = manager.clone().spawn_sweeper(Duration::from_secs(60), move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        async {}
    });

    tokio::time::advance(Duration::from_secs(59)).await;
    tokio::task::yield_now().await;
    assert_eq!(sweeps.load(Ordering::SeqCst), 0);

    tokio::time::advance(Duration::from_secs(2)).await;
    settle(|| sweeps.load(Ordering::SeqCst) == 1).await;

    tokio::time::advance(Duration::from_secs(60)).await;
    settle(|| sweeps.load(Ordering::SeqCst) == 2).await;

    handle.abort();
}
