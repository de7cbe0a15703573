//! Source identifiers for media providers.

use serde::{Deserialize, Serialize};

/// One external provider of game media.
///
/// The set is closed: each variant selects a configuration block and a
/// capability set. `Paste`, `Local` and `Previous` identify non-network
/// origins (clipboard, disk, an earlier run) whose candidates arrive through
/// the excluded collaborators rather than a source client.
///
/// # Examples
///
/// ```
/// use vermeer_core::SourceId;
/// use strum::IntoEnumIterator;
///
/// let network: Vec<_> = SourceId::iter().filter(|s| s.is_remote()).collect();
/// assert_eq!(network.len(), 4);
/// ```
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
pub enum SourceId {
    /// Game metadata database (client-credentials API)
    Igdb,
    /// Editorial games site
    Ign,
    /// Community artwork database
    SteamGridDb,
    /// Video platform (trailers and music)
    Youtube,
    /// Pasted in by the user
    Paste,
    /// Picked from the local filesystem
    Local,
    /// Carried over from a previous run
    Previous,
}

impl SourceId {
    /// True for sources reached over the network through a source client.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SourceId::Igdb | SourceId::Ign | SourceId::SteamGridDb | SourceId::Youtube
        )
    }
}
