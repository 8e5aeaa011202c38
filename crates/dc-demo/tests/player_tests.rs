//! Player timing under paused tokio time

use dc_demo::{
    builtin, CompletionStore, Demo, DemoCatalog, DemoError, DemoPlayer, DemoStep,
    FileCompletionStore, MemoryCompletionStore, PlayerOptions,
};
use std::sync::Arc;
use std::time::Duration;

fn short_catalog() -> Arc<DemoCatalog> {
    let mut catalog = DemoCatalog::builtin();
    catalog
        .insert(Demo::new(
            "short",
            "Short",
            vec![
                DemoStep::new("one", "One", 2.0),
                DemoStep::new("two", "Two", 3.0).wait_for_click(),
                DemoStep::new("three", "Three", 1.0),
            ],
        ))
        .unwrap();
    Arc::new(catalog)
}

fn player(catalog: Arc<DemoCatalog>) -> (DemoPlayer, Arc<MemoryCompletionStore>) {
    let store = Arc::new(MemoryCompletionStore::new());
    (DemoPlayer::new(catalog, store.clone()), store)
}

/// Let the player task observe the latest command
async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn executive_overview_advances_after_first_step_duration() {
    let catalog = Arc::new(DemoCatalog::builtin());
    let first = catalog.get(builtin::EXECUTIVE_OVERVIEW).unwrap().steps[0].duration();
    let (player, _) = player(catalog);

    player.start_demo(builtin::EXECUTIVE_OVERVIEW).unwrap();
    let snapshot = player.snapshot();
    assert_eq!(snapshot.step_index, 0);
    assert!(!snapshot.is_playing);

    player.play();
    settle().await;
    tokio::time::advance(first).await;
    settle().await;

    assert_eq!(player.snapshot().step_index, 1);
    assert!(player.snapshot().is_playing);
}

#[tokio::test(start_paused = true)]
async fn paused_player_does_not_advance() {
    let (player, _) = player(short_catalog());
    player.start_demo("short").unwrap();
    settle().await;

    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;

    assert_eq!(player.snapshot().step_index, 0);
}

#[tokio::test(start_paused = true)]
async fn pause_cancels_armed_timer() {
    let (player, _) = player(short_catalog());
    player.start_demo("short").unwrap();
    player.play();
    settle().await;

    tokio::time::advance(Duration::from_secs(1)).await;
    player.pause();
    settle().await;
    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;

    assert_eq!(player.snapshot().step_index, 0);
}

#[tokio::test(start_paused = true)]
async fn manual_step_rearms_timer_from_new_step() {
    let (player, _) = player(short_catalog());
    player.start_demo("short").unwrap();
    player.go_to_step(2);
    player.play();
    settle().await;

    tokio::time::advance(Duration::from_millis(500)).await;
    settle().await;
    assert!(player.snapshot().is_playing);

    tokio::time::advance(Duration::from_millis(600)).await;
    settle().await;
    assert!(!player.snapshot().is_playing);
}

#[tokio::test(start_paused = true)]
async fn wait_for_click_holds_until_next_step() {
    let (player, _) = player(short_catalog());
    player.start_demo("short").unwrap();
    player.play();
    settle().await;

    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(player.snapshot().step_index, 1);

    tokio::time::advance(Duration::from_secs(3)).await;
    settle().await;
    let held = player.snapshot();
    assert!(held.awaiting_click);

    tokio::time::advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(player.snapshot().step_index, 1);

    assert!(player.next_step());
    settle().await;
    assert_eq!(player.snapshot().step_index, 2);
    assert!(!player.snapshot().awaiting_click);
}

#[tokio::test(start_paused = true)]
async fn final_step_completes_and_records_flag() {
    let (player, store) = player(short_catalog());
    player.start_demo("short").unwrap();
    player.go_to_step(2);
    player.play();
    settle().await;

    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;

    let snapshot = player.snapshot();
    assert!(snapshot.completed);
    assert!(!snapshot.is_playing);
    assert!((snapshot.progress - 1.0).abs() < 1e-9);
    assert!(store.is_completed("short"));
    assert!(player.is_completed("short"));
}

#[tokio::test(start_paused = true)]
async fn next_step_on_final_step_is_noop() {
    let (player, _) = player(short_catalog());
    player.start_demo("short").unwrap();
    player.go_to_step(2);

    assert!(!player.next_step());
    assert_eq!(player.snapshot().step_index, 2);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_go_to_is_ignored() {
    let (player, _) = player(short_catalog());
    player.start_demo("short").unwrap();

    assert!(!player.go_to_step(10));
    assert_eq!(player.snapshot().step_index, 0);
}

#[tokio::test(start_paused = true)]
async fn speed_scales_step_delay() {
    let store = Arc::new(MemoryCompletionStore::new());
    let player = DemoPlayer::with_options(short_catalog(), store, PlayerOptions { speed: 4.0 });
    player.start_demo("short").unwrap();
    player.play();
    settle().await;

    tokio::time::advance(Duration::from_millis(500)).await;
    settle().await;

    assert_eq!(player.snapshot().step_index, 1);
}

#[tokio::test(start_paused = true)]
async fn extreme_speed_falls_back_to_normal_delay() {
    let mut catalog = DemoCatalog::new();
    catalog
        .insert(Demo::new(
            "pair",
            "Pair",
            vec![DemoStep::new("one", "One", 2.0), DemoStep::new("two", "Two", 1.0)],
        ))
        .unwrap();
    let store = Arc::new(MemoryCompletionStore::new());
    let player = DemoPlayer::with_options(Arc::new(catalog), store.clone(), PlayerOptions { speed: 1e-300 });
    player.start_demo("pair").unwrap();
    player.play();
    settle().await;

    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(player.snapshot().step_index, 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    assert!(player.is_completed("pair"));
    assert!(store.is_completed("pair"));
}

#[test]
fn speed_must_be_finite_and_positive() {
    assert!(PlayerOptions::is_valid_speed(0.5));
    assert!(!PlayerOptions::is_valid_speed(0.0));
    assert!(!PlayerOptions::is_valid_speed(-2.0));
    assert!(!PlayerOptions::is_valid_speed(f64::NAN));
    assert!(!PlayerOptions::is_valid_speed(f64::INFINITY));
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_updates() {
    let (player, _) = player(short_catalog());
    let mut updates = player.subscribe();

    player.start_demo("short").unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().demo_id.as_deref(), Some("short"));

    player.stop_demo();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().demo_id, None);
}

#[tokio::test]
async fn unknown_demo_is_rejected() {
    let (player, _) = player(short_catalog());
    assert!(matches!(
        player.start_demo("missing"),
        Err(DemoError::UnknownDemo(_))
    ));
    assert_eq!(player.snapshot().demo_id, None);
}

#[tokio::test(start_paused = true)]
async fn completion_persists_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo-state.json");
    let store = Arc::new(FileCompletionStore::open(&path).unwrap());
    let player = DemoPlayer::new(short_catalog(), store);

    player.start_demo("short").unwrap();
    player.go_to_step(2);
    player.play();
    settle().await;
    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    drop(player);

    let reopened = FileCompletionStore::open(&path).unwrap();
    assert!(reopened.is_completed("short"));
}
