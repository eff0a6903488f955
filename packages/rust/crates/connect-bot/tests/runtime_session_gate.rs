#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use connect_bot::{SessionGate, session_key};
use tokio::sync::oneshot;
use uuid::Uuid;

fn dialogue_key() -> String {
    session_key(Uuid::new_v4(), Uuid::new_v4())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn same_dialogue_is_serialized() {
    let gate = SessionGate::new();
    let key = dialogue_key();
    let first_guard = gate.acquire(&key).await;

    let gate_for_second = gate.clone();
    let key_for_second = key.clone();
    let (entered_tx, entered_rx) = oneshot::channel::<()>();
    let blocked = Arc::new(AtomicBool::new(false));
    let blocked_for_task = Arc::clone(&blocked);

    let second = tokio::spawn(async move {
        blocked_for_task.store(true, Ordering::SeqCst);
        let _second_guard = gate_for_second.acquire(&key_for_second).await;
        let _ = entered_tx.send(());
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(
        blocked.load(Ordering::SeqCst),
        "second task should be waiting on the same dialogue"
    );
    assert!(
        tokio::time::timeout(Duration::from_millis(50), entered_rx)
            .await
            .is_err(),
        "second event must not start before the first one finishes"
    );

    drop(first_guard);
    second.await.expect("second task should finish");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn different_dialogues_run_in_parallel() {
    let gate = SessionGate::new();
    let first_guard = gate.acquire(&dialogue_key()).await;

    let gate_for_other = gate.clone();
    let (entered_tx, entered_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _other_guard = gate_for_other.acquire(&dialogue_key()).await;
        let _ = entered_tx.send(());
    });

    let _ = tokio::time::timeout(Duration::from_millis(200), entered_rx)
        .await
        .expect("another dialogue should not be blocked");

    drop(first_guard);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn entry_is_removed_after_last_guard_drops() {
    let gate = SessionGate::new();
    assert_eq!(gate.active_sessions(), 0);
    {
        let _guard = gate.acquire(&dialogue_key()).await;
        assert_eq!(gate.active_sessions(), 1);
    }
    assert_eq!(gate.active_sessions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn waiters_keep_the_entry_alive() {
    let gate = SessionGate::new();
    let key = dialogue_key();
    let first_guard = gate.acquire(&key).await;

    let gate_for_second = gate.clone();
    let key_for_second = key.clone();
    let (entered_second_tx, entered_second_rx) = oneshot::channel::<()>();
    let (release_second_tx, release_second_rx) = oneshot::channel::<()>();
    let second = tokio::spawn(async move {
        let _second_guard = gate_for_second.acquire(&key_for_second).await;
        let _ = entered_second_tx.send(());
        let _ = release_second_rx.await;
    });

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(
        gate.active_sessions(),
        1,
        "entry should stay tracked while a waiter is queued"
    );

    drop(first_guard);
    let _ = tokio::time::timeout(Duration::from_millis(200), entered_second_rx)
        .await
        .expect("second task should enter after the first guard drops");

    let gate_for_third = gate.clone();
    let key_for_third = key.clone();
    let (entered_third_tx, entered_third_rx) = oneshot::channel::<()>();
    let third = tokio::spawn(async move {
        let _third_guard = gate_for_third.acquire(&key_for_third).await;
        let _ = entered_third_tx.send(());
    });

    assert!(
        tokio::time::timeout(Duration::from_millis(60), entered_third_rx)
            .await
            .is_err(),
        "third task should wait while the second guard is held"
    );

    let _ = release_second_tx.send(());
    second.await.expect("second task should finish");
    third.await.expect("third task should finish");
    assert_eq!(gate.active_sessions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_waiter_releases_the_entry() {
    let gate = SessionGate::new();
    let key = dialogue_key();
    let first_guard = gate.acquire(&key).await;

    let waited = tokio::time::timeout(Duration::from_millis(30), gate.acquire(&key)).await;
    assert!(waited.is_err(), "waiter should time out while the guard is held");
    assert_eq!(gate.active_sessions(), 1);

    drop(first_guard);
    assert_eq!(gate.active_sessions(), 0);
}
