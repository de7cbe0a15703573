//! Generic token-bucket primitive.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;
use vermeer_error::{RateLimitError, RateLimitErrorKind};

/// Replenishing token bucket with strict FIFO waiters.
///
/// The bucket holds up to `capacity` tokens and refills to full capacity
/// once per `refill_interval`. [`TokenBucket::acquire`] suspends (without
/// busy-waiting) until a token can be granted; waiters are admitted in
/// arrival order through a fair queue. Dropping a waiting `acquire` future
/// removes the waiter from the queue without consuming a token.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use vermeer_rate_limit::TokenBucket;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bucket = TokenBucket::new(2, Duration::from_millis(100));
/// bucket.acquire().await?; // immediate
/// bucket.acquire().await?; // immediate
/// bucket.acquire().await?; // waits for the next refill
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    refill_interval: Duration,
    state: Mutex<BucketState>,
    // Fair queue head: tokio's Mutex wakes waiters strictly in FIFO order,
    // and a dropped waiter leaves the queue without side effects.
    queue: tokio::sync::Mutex<()>,
}

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket that starts full.
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        Self {
            capacity,
            refill_interval,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            queue: tokio::sync::Mutex::new(()),
        }
    }

    /// Token capacity per refill interval.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Wait for a token.
    ///
    /// Suspends until a token is available. The token is consumed at the
    /// moment of the grant, so cancellation while queued or while waiting
    /// for a refill leaves the bucket untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitErrorKind::Saturated`] when the bucket can never
    /// grant (zero capacity); the request is refused rather than silently
    /// parked forever.
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        if self.capacity == 0 {
            return Err(RateLimitError::new(RateLimitErrorKind::Saturated(
                "token capacity is zero".into(),
            )));
        }

        let _head = self.queue.lock().await;
        loop {
            match self.take_or_next_refill() {
                Ok(()) => {
                    trace!("token granted");
                    return Ok(());
                }
                Err(ready_at) => tokio::time::sleep_until(ready_at).await,
            }
        }
    }

    /// Take a token without waiting.
    ///
    /// Returns `false` when the bucket is empty or another caller is queued
    /// ahead.
    pub fn try_acquire(&self) -> bool {
        if self.capacity == 0 {
            return false;
        }
        // Respect the queue: jumping ahead of parked waiters would break
        // the oldest-first guarantee.
        let Ok(_head) = self.queue.try_lock() else {
            return false;
        };
        self.take_or_next_refill().is_ok()
    }

    /// Consume one token, or report when the next refill lands.
    fn take_or_next_refill(&self) -> Result<(), Instant> {
        let mut state = self.state.lock().expect("bucket state poisoned");

        // Refill to full capacity once per elapsed interval.
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        if elapsed >= self.refill_interval {
            let intervals = (elapsed.as_nanos() / self.refill_interval.as_nanos()) as u32;
            state.tokens = self.capacity;
            state.last_refill += self.refill_interval * intervals;
        }

        if state.tokens > 0 {
            state.tokens -= 1;
            Ok(())
        } else {
            Err(state.last_refill + self.refill_interval)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn capacity_grants_are_immediate() {
        let bucket = TokenBucket::new(3, Duration::from_secs(1));
        for _ in 0..3 {
            assert!(bucket.try_acquire());
        }
        assert!(!bucket.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn excess_waits_one_refill_interval() {
        let bucket = TokenBucket::new(2, Duration::from_secs(1));
        bucket.acquire().await.unwrap();
        bucket.acquire().await.unwrap();

        let start = Instant::now();
        bucket.acquire().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_served_fifo() {
        use std::sync::Arc;

        let bucket = Arc::new(TokenBucket::new(1, Duration::from_millis(100)));
        bucket.acquire().await.unwrap(); // drain

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        for i in 0..4u32 {
            let bucket = bucket.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                bucket.acquire().await.unwrap();
                tx.send(i).unwrap();
            });
            // Let the task park in the queue before spawning the next one.
            tokio::task::yield_now().await;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        drop(tx);

        let mut order = Vec::new();
        while let Some(i) = rx.recv().await {
            order.push(i);
        }
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_waiter_consumes_no_token() {
        let bucket = TokenBucket::new(1, Duration::from_secs(1));
        bucket.acquire().await.unwrap(); // drain

        // Start a waiter, then drop it before the refill lands.
        {
            let acquire = bucket.acquire();
            tokio::pin!(acquire);
            let timeout = tokio::time::timeout(Duration::from_millis(10), &mut acquire).await;
            assert!(timeout.is_err(), "waiter should still be queued");
        }

        // The refill's single token must go to the next caller in full.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
    }

    #[tokio::test]
    async fn zero_capacity_is_refused_not_parked() {
        let bucket = TokenBucket::new(0, Duration::from_secs(1));
        let err = bucket.acquire().await.unwrap_err();
        assert!(format!("{}", err).contains("saturated") || format!("{}", err).contains("Saturated"));
    }
}
