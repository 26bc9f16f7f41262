use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn test_same_key_is_exclusive() {
    let locks = KeyedLocks::new(4);
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let locks = locks.clone();
        let active = Arc::clone(&active);
        let peak = Arc::clone(&peak);
        handles.push(tokio::spawn(async move {
            let _guard = locks.lock("hot").await;
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            active.fetch_sub(1, Ordering::SeqCst);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(locks.in_flight(), 0);
}

#[tokio::test]
async fn test_distinct_keys_do_not_block() {
    let locks = KeyedLocks::new(1);
    let _a = locks.lock("a").await;

    let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("b")).await;
    assert!(b.is_ok(), "a different key in the same shard must not wait");
    assert_eq!(locks.in_flight(), 2);
}

#[tokio::test]
async fn test_slot_removed_after_release() {
    let locks = KeyedLocks::default();
    assert_eq!(locks.shard_count(), KeyedLocks::DEFAULT_SHARDS);

    {
        let _guard = locks.lock("k").await;
        assert_eq!(locks.in_flight(), 1);
    }
    assert_eq!(locks.in_flight(), 0);
}

#[tokio::test]
async fn test_cancelled_waiter_unregisters() {
    let locks = KeyedLocks::new(8);
    let held = locks.lock("k").await;

    let waited = tokio::time::timeout(Duration::from_millis(20), locks.lock("k")).await;
    assert!(waited.is_err());
    assert_eq!(locks.in_flight(), 1);

    drop(held);
    assert_eq!(locks.in_flight(), 0);

    let _again = tokio::time::timeout(Duration::from_millis(100), locks.lock("k"))
        .await
        .expect("lock must be free after holder and waiter left");
}

#[tokio::test]
async fn test_waiter_acquires_after_holder_releases() {
    let locks = KeyedLocks::new(8);
    let held = locks.lock("k").await;

    let waiter = {
        let locks = locks.clone();
        tokio::spawn(async move {
            let _guard = locks.lock("k").await;
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!waiter.is_finished());

    drop(held);
    waiter.await.unwrap();
    assert_eq!(locks.in_flight(), 0);
}

#[test]
fn test_zero_shards_clamped() {
    assert_eq!(KeyedLocks::new(0).shard_count(), 1);
}
