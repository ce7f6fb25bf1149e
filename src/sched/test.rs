use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;

#[tokio::test(start_paused = true)]
async fn repeat_runs_on_interval() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let handle = repeat(Duration::from_secs(2), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    });

    tokio::time::sleep(Duration::from_millis(6_500)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 3);

    handle.cancel();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn repeat_stops_when_step_declines() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let handle = repeat(Duration::from_secs(1), move || {
        counter.fetch_add(1, Ordering::SeqCst) < 2
    });

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn repeat_limited_caps_runs() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    let handle = repeat_limited(Duration::from_secs(2), 15, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    });

    // Well past 15 intervals.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 15);
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent() {
    let handle = repeat(Duration::from_secs(1), || true);

    handle.cancel();
    handle.cancel();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn task_set_cancels_everything_at_once() {
    let runs = Arc::new(AtomicUsize::new(0));

    let mut set = TaskSet::new();
    for _ in 0..3 {
        let counter = runs.clone();
        set.push(repeat(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }));
    }

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    let before = runs.load(Ordering::SeqCst);
    assert_eq!(before, 6);

    set.cancel_all();
    assert!(set.is_empty());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(runs.load(Ordering::SeqCst), before);

    // Cancelling an already-empty set is a no-op.
    set.cancel_all();
}
