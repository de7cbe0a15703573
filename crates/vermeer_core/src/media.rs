//! Media candidate types.
//!
//! The original data model is a class hierarchy (image, music, video all
//! extending a media base). Here the shared fields live in [`MediaRecord`]
//! and the variants compose it; candidates travel as the [`Media`] enum.

use crate::{Crop, SourceId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A role a media item can fill for a title.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
    /// Square-ish launcher icon
    Icon,
    /// Transparent logo overlay
    Logo,
    /// Title/boxart image
    Title,
    /// Wide hero/banner image
    Hero,
    /// Screenshot/slide image
    Slide,
    /// Trailer video
    Video,
    /// Theme music
    Music,
}

/// Fields shared by every media candidate.
///
/// Immutable once downloaded except for `crop` and `local_path`, which the
/// apply stage adjusts after the bytes are on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Where the asset can be downloaded from
    pub url: String,
    /// File extension without the dot ("png", "webm", ...)
    pub extension: String,
    /// Which provider supplied this candidate
    pub source: SourceId,
    /// Provider style tag, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Path of the downloaded bytes, set by the download stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// Crop rectangle relative to the current pixel dimensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Crop>,
}

impl MediaRecord {
    /// Create a record for a candidate that has not been downloaded yet.
    pub fn new(url: impl Into<String>, extension: impl Into<String>, source: SourceId) -> Self {
        Self {
            url: url.into(),
            extension: extension.into(),
            source,
            style: None,
            local_path: None,
            crop: None,
        }
    }

    /// Attach a provider style tag.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// An image candidate with its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Shared candidate fields
    pub record: MediaRecord,
    /// Pixel width as reported by the provider
    pub width: u32,
    /// Pixel height as reported by the provider
    pub height: u32,
}

impl Image {
    /// Create an image candidate.
    pub fn new(record: MediaRecord, width: u32, height: u32) -> Self {
        Self {
            record,
            width,
            height,
        }
    }

    /// True when width equals height; used for square-icon promotion.
    pub fn is_square(&self) -> bool {
        self.width == self.height && self.width > 0
    }
}

/// A music candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Music {
    /// Shared candidate fields
    pub record: MediaRecord,
    /// Track length in seconds
    pub duration_secs: u64,
    /// Provider like count, used as a popularity signal
    pub like_count: u64,
    /// Track title as reported by the provider
    pub title: String,
    /// Provider thumbnail, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Image>,
}

/// A video candidate.
///
/// Videos carry the music fields (they share the provider's track shape)
/// plus the asset role the video is meant to fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// The track-shaped fields
    pub music: Music,
    /// Which asset role this video fills when applied
    pub apply_kind: AssetKind,
}

/// Any media candidate.
///
/// # Examples
///
/// ```
/// use vermeer_core::{Image, Media, MediaRecord, SourceId};
///
/// let record = MediaRecord::new("https://cdn.example/cover.png", "png", SourceId::Igdb);
/// let media = Media::Image(Image::new(record, 600, 800));
/// assert_eq!(media.record().source, SourceId::Igdb);
/// assert_eq!(media.dimensions(), Some((600, 800)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::From)]
pub enum Media {
    /// An image candidate
    Image(Image),
    /// A music candidate
    Music(Music),
    /// A video candidate
    Video(Video),
}

impl Media {
    /// The shared candidate fields.
    pub fn record(&self) -> &MediaRecord {
        match self {
            Media::Image(i) => &i.record,
            Media::Music(m) => &m.record,
            Media::Video(v) => &v.music.record,
        }
    }

    /// Mutable access to the shared candidate fields.
    pub fn record_mut(&mut self) -> &mut MediaRecord {
        match self {
            Media::Image(i) => &mut i.record,
            Media::Music(m) => &mut m.record,
            Media::Video(v) => &mut v.music.record,
        }
    }

    /// Pixel dimensions for image candidates, `None` otherwise.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Media::Image(i) => Some((i.width, i.height)),
            _ => None,
        }
    }

    /// True for square image candidates.
    pub fn is_square(&self) -> bool {
        matches!(self, Media::Image(i) if i.is_square())
    }
}
