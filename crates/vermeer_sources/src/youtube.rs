//! YouTube data API client for trailers and theme music.

use crate::client::{check_status, query_error, SourceClient, SourceResult, QUERY_TIMEOUT};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use vermeer_core::{AssetKind, Image, Media, MediaRecord, Music, SourceConfig, SourceId, Video};
use vermeer_error::{FetchError, FetchErrorKind};
use vermeer_rate_limit::SourceLimiter;

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// YouTube client.
///
/// Searches the platform for trailers (video candidates) and soundtrack
/// uploads (music candidates). Authentication is an API key.
pub struct YoutubeClient {
    client: reqwest::Client,
    limiter: Arc<SourceLimiter>,
    api_key: String,
}

impl YoutubeClient {
    /// Create a client from an API key.
    pub fn new(limiter: Arc<SourceLimiter>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            limiter,
            api_key: api_key.into(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        self.limiter
            .execute(|| async {
                let response = self
                    .client
                    .get(url)
                    .query(query)
                    .query(&[("key", self.api_key.as_str())])
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

    /// Search for videos and hydrate duration/like counts.
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, FetchError> {
        let search: SearchListDto = self
            .get_json(
                SEARCH_URL,
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("maxResults", "5"),
                    ("q", query),
                ],
            )
            .await?;

        let ids: Vec<&str> = search
            .items
            .iter()
            .filter_map(|item| item.id.video_id.as_deref())
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_list = ids.join(",");

        let details: VideoListDto = self
            .get_json(
                VIDEOS_URL,
                &[
                    ("part", "snippet,contentDetails,statistics"),
                    ("id", &id_list),
                ],
            )
            .await?;

        Ok(details
            .items
            .into_iter()
            .map(|item| {
                let thumbnail = item
                    .snippet
                    .thumbnails
                    .and_then(|t| t.high.or(t.default))
                    .map(|t| {
                        let record = MediaRecord::new(t.url, "jpg", SourceId::Youtube);
                        Image::new(record, t.width.unwrap_or(0), t.height.unwrap_or(0))
                    });
                Track {
                    id: item.id,
                    title: item.snippet.title,
                    duration_secs: item
                        .content_details
                        .map(|d| parse_iso8601_duration(&d.duration))
                        .unwrap_or(0),
                    like_count: item
                        .statistics
                        .and_then(|s| s.like_count)
                        .and_then(|c| c.parse().ok())
                        .unwrap_or(0),
                    thumbnail,
                }
            })
            .collect())
    }
}

#[async_trait]
impl SourceClient for YoutubeClient {
    fn id(&self) -> SourceId {
        SourceId::Youtube
    }

    fn capabilities(&self) -> &'static [AssetKind] {
        &[AssetKind::Video, AssetKind::Music]
    }

    #[instrument(skip(self, _config), fields(title = %title))]
    async fn fetch(
        &self,
        _platform: &str,
        title: &str,
        kinds: &[AssetKind],
        _config: &SourceConfig,
    ) -> Result<SourceResult, FetchError> {
        let mut result = SourceResult::new();

        if kinds.contains(&AssetKind::Video) {
            let tracks = self.search_tracks(&format!("{} trailer", title)).await?;
            debug!("Found {} trailer candidates", tracks.len());
            for track in tracks {
                result.push(
                    AssetKind::Video,
                    Media::Video(Video {
                        music: track.into_music(),
                        apply_kind: AssetKind::Video,
                    }),
                );
            }
        }

        if kinds.contains(&AssetKind::Music) {
            let tracks = self.search_tracks(&format!("{} soundtrack", title)).await?;
            debug!("Found {} music candidates", tracks.len());
            for track in tracks {
                result.push(AssetKind::Music, Media::Music(track.into_music()));
            }
        }

        Ok(result)
    }
}

struct Track {
    id: String,
    title: String,
    duration_secs: u64,
    like_count: u64,
    thumbnail: Option<Image>,
}

impl Track {
    fn into_music(self) -> Music {
        Music {
            record: MediaRecord::new(
                format!("{}{}", WATCH_URL, self.id),
                "webm",
                SourceId::Youtube,
            ),
            duration_secs: self.duration_secs,
            like_count: self.like_count,
            title: self.title,
            thumbnail: self.thumbnail,
        }
    }
}

/// Parse an ISO 8601 duration of the form `PT#H#M#S` into seconds.
///
/// Unknown or malformed input parses to 0 rather than failing the whole
/// candidate.
fn parse_iso8601_duration(s: &str) -> u64 {
    let Some(rest) = s.strip_prefix("PT") else {
        return 0;
    };
    let mut total = 0u64;
    let mut number = 0u64;
    for c in rest.chars() {
        match c {
            '0'..='9' => number = number * 10 + u64::from(c as u8 - b'0'),
            'H' => {
                total += number * 3600;
                number = 0;
            }
            'M' => {
                total += number * 60;
                number = 0;
            }
            'S' => {
                total += number;
                number = 0;
            }
            _ => return 0,
        }
    }
    total
}

#[derive(Debug, Deserialize)]
struct SearchListDto {
    #[serde(default)]
    items: Vec<SearchItemDto>,
}

#[derive(Debug, Deserialize)]
struct SearchItemDto {
    id: SearchIdDto,
}

#[derive(Debug, Deserialize)]
struct SearchIdDto {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListDto {
    #[serde(default)]
    items: Vec<VideoItemDto>,
}

#[derive(Debug, Deserialize)]
struct VideoItemDto {
    id: String,
    snippet: SnippetDto,
    #[serde(rename = "contentDetails")]
    content_details: Option<ContentDetailsDto>,
    statistics: Option<StatisticsDto>,
}

#[derive(Debug, Deserialize)]
struct SnippetDto {
    title: String,
    thumbnails: Option<ThumbnailsDto>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailsDto {
    high: Option<ThumbnailDto>,
    default: Option<ThumbnailDto>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailDto {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ContentDetailsDto {
    duration: String,
}

#[derive(Debug, Deserialize)]
struct StatisticsDto {
    #[serde(rename = "likeCount")]
    like_count: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso8601_durations() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), 3723);
        assert_eq!(parse_iso8601_duration("PT4M20S"), 260);
        assert_eq!(parse_iso8601_duration("PT59S"), 59);
        assert_eq!(parse_iso8601_duration("nonsense"), 0);
    }
}
