//! IGDB metadata API client.
//!
//! IGDB authenticates with Twitch client credentials: the access token and
//! its expiry are cached, and an expired or absent token triggers one
//! refresh that concurrent callers share (the cache lock is held across the
//! refresh, so nobody issues a redundant one).

use crate::client::{check_status, query_error, SourceClient, SourceResult, QUERY_TIMEOUT};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use vermeer_core::{AssetKind, Image, Media, MediaRecord, SourceConfig, SourceId};
use vermeer_error::{FetchError, FetchErrorKind};
use vermeer_rate_limit::SourceLimiter;

const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const GAMES_URL: &str = "https://api.igdb.com/v4/games";
const IMAGE_URL: &str = "https://images.igdb.com/igdb/image/upload";

/// Safety margin subtracted from the reported token lifetime.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

/// IGDB client.
///
/// Supplies covers (icons/titles), artworks (heros) and screenshots
/// (slides) for a title.
pub struct IgdbClient {
    client: reqwest::Client,
    limiter: Arc<SourceLimiter>,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl IgdbClient {
    /// Create a client from client-credentials material.
    pub fn new(
        limiter: Arc<SourceLimiter>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            limiter,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: Mutex::new(None),
        }
    }

    /// Get a valid access token, refreshing it if needed.
    ///
    /// The cache lock is held across the refresh so concurrent callers wait
    /// for one refresh instead of each triggering their own.
    async fn ensure_token(&self) -> Result<String, FetchError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_valid() {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Refreshing IGDB access token");
        let response = self
            .client
            .post(TOKEN_URL)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .timeout(QUERY_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                FetchError::new(FetchErrorKind::Auth(format!("Token request failed: {}", e)))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(FetchError::new(FetchErrorKind::Auth(format!(
                "Token endpoint returned: {}",
                status
            ))));
        }

        let dto: TokenDto = response.json().await.map_err(|e| {
            FetchError::new(FetchErrorKind::Auth(format!(
                "Failed to parse token response: {}",
                e
            )))
        })?;

        let lifetime = Duration::from_secs(dto.expires_in)
            .saturating_sub(TOKEN_EXPIRY_MARGIN);
        let token = CachedToken {
            access_token: dto.access_token,
            expires_at: Instant::now() + lifetime,
        };
        let access = token.access_token.clone();
        *cached = Some(token);
        Ok(access)
    }

    /// Query the games endpoint with an APICalypse body.
    async fn query_games(
        &self,
        token: &str,
        platform: &str,
        title: &str,
    ) -> Result<Vec<GameDto>, FetchError> {
        let mut body = format!(
            "search \"{}\"; fields name, \
             cover.image_id, cover.width, cover.height, \
             artworks.image_id, artworks.width, artworks.height, \
             screenshots.image_id, screenshots.width, screenshots.height; \
             limit 5;",
            title.replace('"', "")
        );
        if !platform.is_empty() {
            body.push_str(&format!(" where platforms.name = \"{}\";", platform));
        }

        self.limiter
            .execute(|| async {
                let response = self
                    .client
                    .post(GAMES_URL)
                    .header("Client-ID", &self.client_id)
                    .header("Authorization", format!("Bearer {}", token))
                    .body(body.clone())
                    .timeout(QUERY_TIMEOUT)
                    .send()
                    .await
                    .map_err(query_error)?;
                let response = check_status(response).await?;
                response.json::<Vec<GameDto>>().await.map_err(|e| {
                    FetchError::new(FetchErrorKind::Decode(format!(
                        "Failed to parse games response: {}",
                        e
                    )))
                })
            })
            .await
    }
}

#[async_trait]
impl SourceClient for IgdbClient {
    fn id(&self) -> SourceId {
        SourceId::Igdb
    }

    fn capabilities(&self) -> &'static [AssetKind] {
        &[
            AssetKind::Icon,
            AssetKind::Title,
            AssetKind::Hero,
            AssetKind::Slide,
        ]
    }

    #[instrument(skip(self, config), fields(platform = %platform, title = %title))]
    async fn fetch(
        &self,
        platform: &str,
        title: &str,
        kinds: &[AssetKind],
        config: &SourceConfig,
    ) -> Result<SourceResult, FetchError> {
        let token = self.ensure_token().await?;
        let provider_platform = config.translate_platform(platform);
        let games = self.query_games(&token, provider_platform, title).await?;

        let mut result = SourceResult::new();
        for game in &games {
            if let Some(cover) = &game.cover {
                // Covers serve both the icon and the title slot.
                if kinds.contains(&AssetKind::Icon) {
                    result.push(AssetKind::Icon, cover.to_media("t_cover_big"));
                }
                if kinds.contains(&AssetKind::Title) {
                    result.push(AssetKind::Title, cover.to_media("t_cover_big_2x"));
                }
            }
            if kinds.contains(&AssetKind::Hero) {
                for art in game.artworks.as_deref().unwrap_or(&[]) {
                    result.push(AssetKind::Hero, art.to_media("t_1080p"));
                }
            }
            if kinds.contains(&AssetKind::Slide) {
                for shot in game.screenshots.as_deref().unwrap_or(&[]) {
                    result.push(AssetKind::Slide, shot.to_media("t_1080p"));
                }
            }
        }

        if result.is_empty() {
            warn!("IGDB returned no usable media for '{}'", title);
        }
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
struct TokenDto {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct GameDto {
    #[allow(dead_code)]
    name: Option<String>,
    cover: Option<ImageDto>,
    artworks: Option<Vec<ImageDto>>,
    screenshots: Option<Vec<ImageDto>>,
}

#[derive(Debug, Deserialize)]
struct ImageDto {
    image_id: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl ImageDto {
    fn to_media(&self, size: &str) -> Media {
        let url = format!("{}/{}/{}.jpg", IMAGE_URL, size, self.image_id);
        let record = MediaRecord::new(url, "jpg", SourceId::Igdb);
        Media::Image(Image::new(
            record,
            self.width.unwrap_or(0),
            self.height.unwrap_or(0),
        ))
    }
}
