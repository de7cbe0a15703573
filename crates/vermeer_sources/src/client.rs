//! The source client trait and shared fetch plumbing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};
use vermeer_core::{AssetKind, Media, SourceConfig, SourceId};
use vermeer_error::{FetchError, FetchErrorKind};
use vermeer_rate_limit::SourceLimiter;

/// Timeout budget for metadata/query calls.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout budget for binary downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Candidates one source produced for one title.
#[derive(Debug, Clone, Default)]
pub struct SourceResult {
    candidates: HashMap<AssetKind, Vec<Media>>,
}

impl SourceResult {
    /// An empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate for one asset kind.
    pub fn push(&mut self, kind: AssetKind, media: Media) {
        self.candidates.entry(kind).or_default().push(media);
    }

    /// Candidates for one asset kind, in arrival order.
    pub fn get(&self, kind: AssetKind) -> &[Media] {
        self.candidates.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove and return the candidates for one asset kind.
    pub fn take(&mut self, kind: AssetKind) -> Vec<Media> {
        self.candidates.remove(&kind).unwrap_or_default()
    }

    /// True when no kind has any candidate.
    pub fn is_empty(&self) -> bool {
        self.candidates.values().all(Vec::is_empty)
    }
}

/// One provider of game media.
///
/// Implementations declare a static capability set and translate their
/// provider's protocol into [`Media`] candidates. A `fetch` error means the
/// whole source failed for this title; the aggregator treats it as an empty
/// contribution rather than failing the batch.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Which source this client speaks for.
    fn id(&self) -> SourceId;

    /// The asset kinds this provider can supply at all.
    fn capabilities(&self) -> &'static [AssetKind];

    /// Fetch candidates for a title.
    ///
    /// `kinds` is already filtered to enabled, capability-matching kinds;
    /// `config` supplies style lists and the platform-name translation
    /// table for this source.
    async fn fetch(
        &self,
        platform: &str,
        title: &str,
        kinds: &[AssetKind],
        config: &SourceConfig,
    ) -> Result<SourceResult, FetchError>;
}

/// Download an asset's bytes through the source's download limiter.
///
/// Holds a connection permit for the duration of the transfer, so the
/// per-source cap on open connections applies no matter how many downloads
/// are queued behind the token bucket.
#[instrument(skip(client, limiter), fields(url = %url))]
pub async fn download_bytes(
    client: &reqwest::Client,
    limiter: &SourceLimiter,
    url: &str,
) -> Result<Vec<u8>, FetchError> {
    let _permit = limiter.acquire_download().await.map_err(FetchError::from)?;

    debug!("Downloading asset bytes");
    let response = client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                FetchError::new(FetchErrorKind::Timeout(DOWNLOAD_TIMEOUT.as_secs()))
            } else {
                FetchError::new(FetchErrorKind::Http(format!("Download failed: {}", e)))
            }
        })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        return Err(FetchError::new(FetchErrorKind::Status {
            status,
            message: format!("download of {} refused", url),
        }));
    }

    let bytes = response.bytes().await.map_err(|e| {
        FetchError::new(FetchErrorKind::Http(format!("Body read failed: {}", e)))
    })?;
    Ok(bytes.to_vec())
}

/// Map a reqwest error from a query call into a fetch error.
pub(crate) fn query_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::new(FetchErrorKind::Timeout(QUERY_TIMEOUT.as_secs()))
    } else {
        FetchError::new(FetchErrorKind::Http(format!("Request failed: {}", e)))
    }
}

/// Reject non-success statuses, consuming the response body for context.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(FetchError::new(FetchErrorKind::Status { status, message }))
}
