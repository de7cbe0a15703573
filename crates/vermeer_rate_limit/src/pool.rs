//! Per-source limiter pairs and the process-wide pool.

use crate::TokenBucket;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{instrument, warn};
use vermeer_core::{LimitSettings, ScraperConfig, SourceId};
use vermeer_error::{RateLimitError, RateLimitErrorKind, RetryableError};

/// RAII permit for an open download connection.
///
/// Dropping the permit returns the connection slot to the source's pool;
/// this happens even when the download fails or the task panics.
pub struct DownloadPermit {
    _permit: OwnedSemaphorePermit,
}

/// The two limiters for one source.
///
/// Query (metadata) and download (binary) traffic are throttled by
/// independent token buckets, and downloads additionally hold a connection
/// slot for their full duration, independent of the token rate.
#[derive(Debug)]
pub struct SourceLimiter {
    query: TokenBucket,
    download: TokenBucket,
    connections: Arc<Semaphore>,
}

impl SourceLimiter {
    /// Build a limiter pair from one source's settings.
    pub fn new(settings: &LimitSettings) -> Self {
        Self {
            query: TokenBucket::new(
                settings.query_capacity,
                Duration::from_millis(settings.query_interval_ms),
            ),
            download: TokenBucket::new(
                settings.download_capacity,
                Duration::from_millis(settings.download_interval_ms),
            ),
            connections: Arc::new(Semaphore::new(settings.max_download_connections as usize)),
        }
    }

    /// Wait for a metadata-query token.
    pub async fn acquire_query(&self) -> Result<(), RateLimitError> {
        self.query.acquire().await
    }

    /// Wait for a download token and a connection slot.
    ///
    /// The token is consumed up front (it replenishes on its own); the
    /// connection slot is held until the returned permit drops. The slot is
    /// acquired after the token so a caller parked on the bucket does not
    /// pin a connection it cannot use yet.
    pub async fn acquire_download(&self) -> Result<DownloadPermit, RateLimitError> {
        self.download.acquire().await?;
        let permit = self
            .connections
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| {
                RateLimitError::new(RateLimitErrorKind::Closed(
                    "download connection semaphore closed".into(),
                ))
            })?;
        Ok(DownloadPermit { _permit: permit })
    }

    /// The query bucket, for tests and introspection.
    pub fn query_bucket(&self) -> &TokenBucket {
        &self.query
    }

    /// The download bucket, for tests and introspection.
    pub fn download_bucket(&self) -> &TokenBucket {
        &self.download
    }

    /// Execute a query operation with rate limiting and automatic retry.
    ///
    /// For each attempt:
    /// 1. Acquires a query token (waits if needed)
    /// 2. Executes the operation
    /// 3. On a retryable error (timeout, 429, 5xx) retries with exponential
    ///    backoff and jitter; permanent errors return immediately
    ///
    /// The retry strategy: 2s initial backoff, 2x per attempt, capped at
    /// 60s, 5 attempts.
    pub async fn execute<F, Fut, R, E>(&self, operation: F) -> Result<R, E>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<R, E>>,
        E: RetryableError + From<RateLimitError> + std::fmt::Display,
    {
        use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};

        let retry_strategy = ExponentialBackoff::from_millis(2000)
            .factor(2)
            .max_delay(Duration::from_secs(60))
            .map(jitter)
            .take(5);

        Retry::spawn(retry_strategy, || async {
            // Acquire rate limit permission before each attempt
            if let Err(e) = self.acquire_query().await {
                return Err(RetryError::Permanent(E::from(e)));
            }

            match operation().await {
                Ok(value) => Ok(value),
                Err(e) => {
                    if e.is_retryable() {
                        warn!("Transient error, will retry: {}", e);
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    } else {
                        warn!("Permanent error, failing immediately: {}", e);
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await
    }
}

/// Process-wide map of source id to limiter.
///
/// The pool owns replenishment timing for every bucket; source clients hold
/// the pool read/acquire-only. Construct once per application session and
/// share via `Arc`.
///
/// # Examples
///
/// ```
/// use vermeer_core::ScraperConfig;
/// use vermeer_core::SourceId;
/// use vermeer_rate_limit::LimiterPool;
///
/// let pool = LimiterPool::from_config(&ScraperConfig::default());
/// let igdb = pool.limiter(SourceId::Igdb);
/// ```
#[derive(Debug)]
pub struct LimiterPool {
    limiters: HashMap<SourceId, Arc<SourceLimiter>>,
}

impl LimiterPool {
    /// Build one limiter pair per remote source from the configuration.
    ///
    /// Sources without an explicit `[sources.<id>.limits]` block get
    /// [`LimitSettings::default`].
    #[instrument(skip(config))]
    pub fn from_config(config: &ScraperConfig) -> Self {
        use strum::IntoEnumIterator;

        let limiters = SourceId::iter()
            .filter(SourceId::is_remote)
            .map(|id| {
                let settings = config.source(id).limits;
                (id, Arc::new(SourceLimiter::new(&settings)))
            })
            .collect();

        Self { limiters }
    }

    /// The limiter for one source.
    ///
    /// # Panics
    ///
    /// Never panics for remote sources; [`LimiterPool::from_config`] seeds
    /// an entry for each of them. Non-remote sources fall back to a
    /// default-limits entry created on the spot.
    pub fn limiter(&self, source: SourceId) -> Arc<SourceLimiter> {
        self.limiters
            .get(&source)
            .cloned()
            .unwrap_or_else(|| Arc::new(SourceLimiter::new(&LimitSettings::default())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn download_permit_caps_open_connections() {
        let settings = LimitSettings {
            query_capacity: 10,
            query_interval_ms: 1000,
            download_capacity: 10,
            download_interval_ms: 1000,
            max_download_connections: 1,
        };
        let limiter = Arc::new(SourceLimiter::new(&settings));

        let held = limiter.acquire_download().await.unwrap();

        // Tokens remain, but the single connection slot is taken.
        let second = limiter.clone();
        let pending = tokio::spawn(async move { second.acquire_download().await });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        drop(held);
        assert!(pending.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn pool_serves_every_remote_source() {
        use strum::IntoEnumIterator;

        let pool = LimiterPool::from_config(&ScraperConfig::default());
        for id in SourceId::iter().filter(SourceId::is_remote) {
            // Default settings always grant the first token immediately.
            assert!(pool.limiter(id).query_bucket().try_acquire());
        }
    }
}
