//! Tests for the token bucket and source limiter pair.

use std::sync::Arc;
use std::time::Duration;
use vermeer_core::LimitSettings;
use vermeer_rate_limit::{SourceLimiter, TokenBucket};

#[tokio::test(start_paused = true)]
async fn burst_beyond_capacity_waits_for_replenishment_in_order() {
    let capacity = 3u32;
    let bucket = Arc::new(TokenBucket::new(capacity, Duration::from_secs(1)));

    let start = tokio::time::Instant::now();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    for i in 0..5u32 {
        let bucket = bucket.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            bucket.acquire().await.unwrap();
            tx.send((i, start.elapsed())).unwrap();
        });
        // Park each waiter before spawning the next so arrival order is fixed.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    drop(tx);

    let mut grants = Vec::new();
    while let Some(g) = rx.recv().await {
        grants.push(g);
    }

    // Exactly `capacity` immediate grants, the rest only after a refill.
    let immediate: Vec<_> = grants
        .iter()
        .filter(|(_, t)| *t < Duration::from_secs(1))
        .collect();
    assert_eq!(immediate.len(), capacity as usize);
    for (_, t) in grants.iter().skip(capacity as usize) {
        assert!(*t >= Duration::from_secs(1), "late grant at {:?}", t);
    }

    // FIFO: grant order matches arrival order.
    let order: Vec<u32> = grants.iter().map(|(i, _)| *i).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn query_and_download_buckets_are_independent() {
    let settings = LimitSettings {
        query_capacity: 1,
        query_interval_ms: 60_000,
        download_capacity: 2,
        download_interval_ms: 60_000,
        max_download_connections: 2,
    };
    let limiter = SourceLimiter::new(&settings);

    // Drain the query bucket entirely.
    limiter.acquire_query().await.unwrap();
    assert!(!limiter.query_bucket().try_acquire());

    // Downloads still proceed on their own budget.
    let _a = limiter.acquire_download().await.unwrap();
    let _b = limiter.acquire_download().await.unwrap();
    assert!(!limiter.download_bucket().try_acquire());
}
