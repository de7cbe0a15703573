//! Per-title aggregation context.

use crate::{AssetKind, Media};
use serde::{Deserialize, Serialize};

/// The merged candidate set for one title.
///
/// Owns seven ordered candidate lists, one per [`AssetKind`]. During
/// aggregation the order is arrival order from the sources; after the merge
/// it is the final rank order, so index 0 of each list is the preferred
/// candidate. A context is created fresh per title-processing run and
/// discarded after the apply stage; it is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaContext {
    /// Icon candidates
    pub icons: Vec<Media>,
    /// Logo candidates
    pub logos: Vec<Media>,
    /// Title/boxart candidates
    pub titles: Vec<Media>,
    /// Hero/banner candidates
    pub heros: Vec<Media>,
    /// Slide/screenshot candidates
    pub slides: Vec<Media>,
    /// Video candidates
    pub videos: Vec<Media>,
    /// Music candidates
    pub music: Vec<Media>,
}

impl MediaContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The candidate list for one asset kind.
    pub fn list(&self, kind: AssetKind) -> &[Media] {
        match kind {
            AssetKind::Icon => &self.icons,
            AssetKind::Logo => &self.logos,
            AssetKind::Title => &self.titles,
            AssetKind::Hero => &self.heros,
            AssetKind::Slide => &self.slides,
            AssetKind::Video => &self.videos,
            AssetKind::Music => &self.music,
        }
    }

    /// Mutable candidate list for one asset kind.
    pub fn list_mut(&mut self, kind: AssetKind) -> &mut Vec<Media> {
        match kind {
            AssetKind::Icon => &mut self.icons,
            AssetKind::Logo => &mut self.logos,
            AssetKind::Title => &mut self.titles,
            AssetKind::Hero => &mut self.heros,
            AssetKind::Slide => &mut self.slides,
            AssetKind::Video => &mut self.videos,
            AssetKind::Music => &mut self.music,
        }
    }

    /// The preferred candidate for one asset kind, if any.
    pub fn best(&self, kind: AssetKind) -> Option<&Media> {
        self.list(kind).first()
    }

    /// Total number of candidates across all asset kinds.
    pub fn len(&self) -> usize {
        use strum::IntoEnumIterator;
        AssetKind::iter().map(|k| self.list(k).len()).sum()
    }

    /// True when no asset kind has any candidate.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
