//! Fan-out orchestration over the source clients.

use crate::merge::merge_context;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument, warn};
use vermeer_core::{AssetKind, MediaContext, MediaStorage, ScraperConfig, SourceId};
use vermeer_error::{AggregateError, AggregateErrorKind, VermeerResult};
use vermeer_rate_limit::LimiterPool;
use vermeer_sources::{download_bytes, SourceClient, SourceResult};

/// Produces one ranked [`MediaContext`] per title from all enabled sources.
///
/// The aggregator owns the source clients and shares the process-wide
/// limiter pool with them. A failing source contributes an empty result;
/// the aggregation as a whole fails only when every enabled source failed.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use vermeer_aggregate::Aggregator;
/// use vermeer_core::ScraperConfig;
/// # use std::path::{Path, PathBuf};
/// # struct NullStorage;
/// # #[async_trait::async_trait]
/// # impl vermeer_core::MediaStorage for NullStorage {
/// #     async fn read_bytes(&self, _: &Path) -> Result<Vec<u8>, vermeer_error::StorageError> { Ok(vec![]) }
/// #     async fn save_bytes(&self, p: &Path, _: &[u8]) -> Result<PathBuf, vermeer_error::StorageError> { Ok(p.into()) }
/// #     async fn file_exists(&self, _: &Path) -> bool { false }
/// # }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ScraperConfig::load()?;
/// let aggregator = Aggregator::from_config(config, Arc::new(NullStorage));
/// let mut context = aggregator.get_media("Sega Genesis", "Comix Zone").await?;
/// aggregator.download_missing_media(&mut context).await;
/// # Ok(())
/// # }
/// ```
pub struct Aggregator {
    config: ScraperConfig,
    pool: Arc<LimiterPool>,
    clients: Vec<Arc<dyn SourceClient>>,
    storage: Arc<dyn MediaStorage>,
    download_client: reqwest::Client,
}

impl Aggregator {
    /// Assemble an aggregator from pre-built clients.
    ///
    /// Useful when the caller wants to supply its own client set (tests do
    /// this with stub clients).
    pub fn new(
        config: ScraperConfig,
        pool: Arc<LimiterPool>,
        clients: Vec<Arc<dyn SourceClient>>,
        storage: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            config,
            pool,
            clients,
            storage,
            download_client: reqwest::Client::new(),
        }
    }

    /// Build the standard client set from the configuration's auth blocks.
    ///
    /// A source without usable credentials is skipped (and logged) rather
    /// than constructed in a state that can only fail.
    #[instrument(skip_all)]
    pub fn from_config(config: ScraperConfig, storage: Arc<dyn MediaStorage>) -> Self {
        use vermeer_sources::{IgdbClient, SteamGridDbClient, YoutubeClient};

        let pool = Arc::new(LimiterPool::from_config(&config));
        let mut clients: Vec<Arc<dyn SourceClient>> = Vec::new();

        let igdb_auth = config.source(SourceId::Igdb).auth;
        match (igdb_auth.client_id, igdb_auth.client_secret) {
            (Some(id), Some(secret)) => {
                clients.push(Arc::new(IgdbClient::new(
                    pool.limiter(SourceId::Igdb),
                    id,
                    secret,
                )));
            }
            _ => debug!("IGDB credentials missing; source disabled"),
        }

        match config.source(SourceId::SteamGridDb).auth.api_key {
            Some(key) => clients.push(Arc::new(SteamGridDbClient::new(
                pool.limiter(SourceId::SteamGridDb),
                key,
            ))),
            None => debug!("SteamGridDB api key missing; source disabled"),
        }

        match config.source(SourceId::Youtube).auth.api_key {
            Some(key) => clients.push(Arc::new(YoutubeClient::new(
                pool.limiter(SourceId::Youtube),
                key,
            ))),
            None => debug!("YouTube api key missing; source disabled"),
        }

        Self::new(config, pool, clients, storage)
    }

    /// The asset kinds a client should be asked for: its capabilities
    /// intersected with the enabled kinds in its source configuration.
    fn requested_kinds(&self, client: &dyn SourceClient) -> Vec<AssetKind> {
        let source_config = self.config.source(client.id());
        client
            .capabilities()
            .iter()
            .copied()
            .filter(|&kind| source_config.is_enabled(kind))
            .collect()
    }

    /// Fetch and merge media for one title.
    ///
    /// Fans out one concurrent query per enabled, capability-matching
    /// source (bounded by `max_concurrent_sources` when configured), merges
    /// the results, and ranks each asset kind's candidates. Partial results
    /// are normal: a title with three of five asset kinds found is a
    /// success.
    ///
    /// # Errors
    ///
    /// - [`AggregateErrorKind::NoSources`] when no enabled source can
    ///   supply anything for this title
    /// - [`AggregateErrorKind::Exhausted`] when every queried source failed
    #[instrument(skip(self), fields(platform = %platform, title = %title))]
    pub async fn get_media(&self, platform: &str, title: &str) -> VermeerResult<MediaContext> {
        let tasks: Vec<(Arc<dyn SourceClient>, Vec<AssetKind>)> = self
            .clients
            .iter()
            .map(|c| (c.clone(), self.requested_kinds(c.as_ref())))
            .filter(|(_, kinds)| !kinds.is_empty())
            .collect();

        if tasks.is_empty() {
            return Err(AggregateError::new(AggregateErrorKind::NoSources(
                title.to_string(),
            )))?;
        }

        let queried = tasks.len();
        let fetches = tasks.into_iter().map(|(client, kinds)| {
            let source_config = self.config.source(client.id());
            async move {
                let id = client.id();
                let outcome = client
                    .fetch(platform, title, &kinds, &source_config)
                    .await;
                (id, outcome)
            }
        });

        // buffered() preserves task order, so merge input order (and with
        // it the final ranking) is deterministic regardless of which source
        // answers first.
        let concurrency = self.config.max_concurrent_sources.unwrap_or(usize::MAX);
        let outcomes: Vec<_> = futures::stream::iter(fetches)
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut results: Vec<(SourceId, SourceResult)> = Vec::with_capacity(outcomes.len());
        let mut failures = 0usize;
        for (id, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push((id, result)),
                Err(e) => {
                    // A failing source is an empty contribution, never a
                    // failed batch.
                    warn!("Source {} failed for '{}': {}", id, title, e);
                    failures += 1;
                    results.push((id, SourceResult::new()));
                }
            }
        }

        if failures == queried {
            return Err(AggregateError::new(AggregateErrorKind::Exhausted {
                sources: queried,
                title: title.to_string(),
            }))?;
        }

        let context = merge_context(&self.config, &results);
        info!(
            candidates = context.len(),
            failed_sources = failures,
            "Aggregated media for '{}'",
            title
        );
        Ok(context)
    }

    /// Download bytes for every candidate that has none yet.
    ///
    /// Each transfer goes through its source's download bucket and
    /// connection cap, and the bytes are persisted through the storage
    /// collaborator; the returned path lands in the candidate's
    /// `local_path`. Individual failures are logged and skipped so one dead
    /// URL cannot abort the rest of the set.
    #[instrument(skip_all)]
    pub async fn download_missing_media(&self, context: &mut MediaContext) {
        for kind in AssetKind::iter() {
            for media in context.list_mut(kind).iter_mut() {
                if media.record().local_path.is_some() {
                    continue;
                }
                let source = media.record().source;
                if !source.is_remote() {
                    continue;
                }

                let limiter = self.pool.limiter(source);
                let url = media.record().url.clone();
                let bytes = match download_bytes(&self.download_client, &limiter, &url).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Download of {} failed: {}", url, e);
                        continue;
                    }
                };

                let suggested = suggested_path(kind, media.record().url.as_str(), &media.record().extension);
                match self.storage.save_bytes(&suggested, &bytes).await {
                    Ok(path) => media.record_mut().local_path = Some(path),
                    Err(e) => warn!("Persisting {} failed: {}", url, e),
                }
            }
        }
    }
}

/// Storage path suggestion: one directory per asset kind, file name taken
/// from the URL's last segment.
fn suggested_path(kind: AssetKind, url: &str, extension: &str) -> PathBuf {
    let stem = url
        .rsplit('/')
        .next()
        .and_then(|segment| segment.split(['?', '#']).next())
        .filter(|s| !s.is_empty())
        .unwrap_or("asset");
    let file = if stem.ends_with(&format!(".{}", extension)) {
        stem.to_string()
    } else {
        format!("{}.{}", stem, extension)
    };
    PathBuf::from(kind.to_string()).join(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggested_path_groups_by_kind() {
        let path = suggested_path(AssetKind::Hero, "https://cdn.x/abc.jpg?w=1", "jpg");
        assert_eq!(path, PathBuf::from("hero/abc.jpg"));
    }

    #[test]
    fn suggested_path_appends_missing_extension() {
        let path = suggested_path(AssetKind::Icon, "https://cdn.x/abc", "png");
        assert_eq!(path, PathBuf::from("icon/abc.png"));
    }
}
