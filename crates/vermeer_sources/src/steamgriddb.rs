//! SteamGridDB artwork API client.

use crate::client::{check_status, query_error, SourceClient, SourceResult, QUERY_TIMEOUT};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use vermeer_core::{AssetKind, Image, Media, MediaRecord, SourceConfig, SourceId};
use vermeer_error::{FetchError, FetchErrorKind};
use vermeer_rate_limit::SourceLimiter;

const BASE_URL: &str = "https://www.steamgriddb.com/api/v2";

/// SteamGridDB client.
///
/// Community artwork database with style-tagged grids, heroes, logos and
/// icons. Authentication is a static bearer token.
pub struct SteamGridDbClient {
    client: reqwest::Client,
    limiter: Arc<SourceLimiter>,
    api_key: String,
}

impl SteamGridDbClient {
    /// Create a client from an API key.
    pub fn new(limiter: Arc<SourceLimiter>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            limiter,
            api_key: api_key.into(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        self.limiter
            .execute(|| async {
                let response = self
                    .client
                    .get(url)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .timeout(QUERY_TIMEOUT)
                    .send()
                    .await
                    .map_err(query_error)?;
                let response = check_status(response).await?;
                response.json::<T>().await.map_err(|e| {
                    FetchError::new(FetchErrorKind::Decode(format!(
                        "Failed to parse response: {}",
                        e
                    )))
                })
            })
            .await
    }

    /// Resolve a title to the provider's game id via autocomplete search.
    async fn search_game(&self, title: &str) -> Result<Option<u64>, FetchError> {
        let url = format!("{}/search/autocomplete/{}", BASE_URL, urlencode(title));
        let dto: Envelope<Vec<SearchHitDto>> = self.get_json(&url).await?;
        Ok(dto.data.first().map(|hit| hit.id))
    }

    /// Fetch one asset-kind listing for a resolved game id.
    async fn assets_for(
        &self,
        game_id: u64,
        kind: AssetKind,
    ) -> Result<Vec<AssetDto>, FetchError> {
        let endpoint = match kind {
            AssetKind::Icon => "icons",
            AssetKind::Logo => "logos",
            AssetKind::Title => "grids",
            AssetKind::Hero => "heroes",
            _ => return Ok(Vec::new()),
        };
        let url = format!("{}/{}/game/{}", BASE_URL, endpoint, game_id);
        let dto: Envelope<Vec<AssetDto>> = self.get_json(&url).await?;
        Ok(dto.data)
    }
}

#[async_trait]
impl SourceClient for SteamGridDbClient {
    fn id(&self) -> SourceId {
        SourceId::SteamGridDb
    }

    fn capabilities(&self) -> &'static [AssetKind] {
        &[
            AssetKind::Icon,
            AssetKind::Logo,
            AssetKind::Title,
            AssetKind::Hero,
        ]
    }

    #[instrument(skip(self, _config), fields(title = %title))]
    async fn fetch(
        &self,
        _platform: &str,
        title: &str,
        kinds: &[AssetKind],
        _config: &SourceConfig,
    ) -> Result<SourceResult, FetchError> {
        let Some(game_id) = self.search_game(title).await? else {
            debug!("No SteamGridDB entry for '{}'", title);
            return Ok(SourceResult::new());
        };

        let mut result = SourceResult::new();
        for &kind in kinds {
            // Failures on one asset kind don't spoil the others from this
            // source; they just contribute nothing.
            match self.assets_for(game_id, kind).await {
                Ok(assets) => {
                    for asset in assets {
                        result.push(kind, asset.into_media());
                    }
                }
                Err(e) => debug!("SteamGridDB {} listing failed: {}", kind, e),
            }
        }
        Ok(result)
    }
}

/// Percent-encode the characters SteamGridDB's path segments care about.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '&' => out.push_str("%26"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            '/' => out.push_str("%2F"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
struct SearchHitDto {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct AssetDto {
    url: String,
    style: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    mime: Option<String>,
}

impl AssetDto {
    fn into_media(self) -> Media {
        let extension = match self.mime.as_deref() {
            Some("image/png") => "png",
            Some("image/webp") => "webp",
            _ => extension_from_url(&self.url).unwrap_or("png"),
        };
        let mut record = MediaRecord::new(self.url.clone(), extension, SourceId::SteamGridDb);
        if let Some(style) = self.style {
            record = record.with_style(style);
        }
        Media::Image(Image::new(
            record,
            self.width.unwrap_or(0),
            self.height.unwrap_or(0),
        ))
    }
}

fn extension_from_url(url: &str) -> Option<&str> {
    url.rsplit('.').next().filter(|ext| ext.len() <= 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_separators() {
        assert_eq!(urlencode("Fez II & Friends"), "Fez%20II%20%26%20Friends");
    }

    #[test]
    fn extension_falls_back_to_url_suffix() {
        assert_eq!(extension_from_url("https://x/y/z.webp"), Some("webp"));
        assert_eq!(extension_from_url("https://x/y/noext"), None);
    }
}
