//! Scraper configuration.
//!
//! This module provides TOML-based configuration for sources. The
//! configuration system supports:
//! - Bundled defaults (include_str! from vermeer.toml)
//! - User overrides (./vermeer.toml or ~/.config/vermeer/vermeer.toml)
//! - Automatic merging with user values taking precedence

use crate::{AssetKind, SourceId};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};
use vermeer_error::{ConfigError, VermeerError, VermeerResult};

/// Per-asset-kind scraping rule for one source.
///
/// # Example
///
/// ```toml
/// [sources.steam_grid_db.rules.icon]
/// enabled = true
/// priority = 1
/// styles = ["official", "white"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KindRule {
    /// Whether this source fetches this asset kind at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Contribute candidates only when no other source found any
    #[serde(default)]
    pub only_if_none_found: bool,

    /// Rank among sources for this asset kind; lower is preferred
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Allowed provider style tags; empty allows every style
    #[serde(default)]
    pub styles: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> u32 {
    10
}

impl Default for KindRule {
    fn default() -> Self {
        Self {
            enabled: true,
            only_if_none_found: false,
            priority: default_priority(),
            styles: Vec::new(),
        }
    }
}

/// Authentication material for one source.
///
/// Which fields apply depends on the provider: client-credentials sources
/// use `client_id`/`client_secret`, simple bearer or key sources use
/// `api_key`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// OAuth client id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Static API key / bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Rate limit parameters for one source.
///
/// Query and download traffic get independent token buckets so a burst of
/// binary downloads can never starve metadata lookups, and vice versa.
///
/// # Example
///
/// ```toml
/// [sources.igdb.limits]
/// query_capacity = 4
/// query_interval_ms = 1000
/// download_capacity = 2
/// download_interval_ms = 1000
/// max_download_connections = 4
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct LimitSettings {
    /// Tokens per interval for metadata/query calls
    #[serde(default = "default_query_capacity")]
    pub query_capacity: u32,

    /// Replenishment interval for query tokens, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub query_interval_ms: u64,

    /// Tokens per interval for binary downloads
    #[serde(default = "default_download_capacity")]
    pub download_capacity: u32,

    /// Replenishment interval for download tokens, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub download_interval_ms: u64,

    /// Hard cap on simultaneously open download connections
    #[serde(default = "default_download_connections")]
    pub max_download_connections: u32,
}

fn default_query_capacity() -> u32 {
    4
}

fn default_download_capacity() -> u32 {
    2
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_download_connections() -> u32 {
    4
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            query_capacity: default_query_capacity(),
            query_interval_ms: default_interval_ms(),
            download_capacity: default_download_capacity(),
            download_interval_ms: default_interval_ms(),
            max_download_connections: default_download_connections(),
        }
    }
}

/// Configuration block for one source.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Per-asset-kind rules; a missing kind uses [`KindRule::default`]
    #[serde(default)]
    pub rules: HashMap<AssetKind, KindRule>,

    /// Promote square icons ahead of non-square ones from this source
    #[serde(default)]
    pub square_icon_priority: bool,

    /// Library platform name -> provider platform name
    #[serde(default)]
    pub platform_names: HashMap<String, String>,

    /// Authentication material
    #[serde(default)]
    pub auth: AuthConfig,

    /// Rate limit parameters
    #[serde(default)]
    pub limits: LimitSettings,
}

impl SourceConfig {
    /// The rule for one asset kind, falling back to the default rule.
    pub fn rule(&self, kind: AssetKind) -> KindRule {
        self.rules.get(&kind).cloned().unwrap_or_default()
    }

    /// Whether this source fetches the given asset kind.
    pub fn is_enabled(&self, kind: AssetKind) -> bool {
        self.rule(kind).enabled
    }

    /// Rank of this source for the given asset kind; lower is preferred.
    pub fn priority(&self, kind: AssetKind) -> u32 {
        self.rule(kind).priority
    }

    /// Whether this source is fallback-only for the given asset kind.
    pub fn only_if_none_found(&self, kind: AssetKind) -> bool {
        self.rule(kind).only_if_none_found
    }

    /// Whether a candidate's style tag passes this source's style list.
    ///
    /// An empty style list allows everything, as does a candidate without a
    /// style tag (not every provider reports styles).
    pub fn allows_style(&self, kind: AssetKind, style: Option<&str>) -> bool {
        let rule = self.rule(kind);
        match (style, rule.styles.is_empty()) {
            (_, true) | (None, _) => true,
            (Some(s), false) => rule.styles.iter().any(|allowed| allowed == s),
        }
    }

    /// Translate a library platform name into this provider's naming.
    ///
    /// Unmapped names pass through unchanged.
    pub fn translate_platform<'a>(&'a self, platform: &'a str) -> &'a str {
        self.platform_names
            .get(platform)
            .map(String::as_str)
            .unwrap_or(platform)
    }
}

/// Top-level scraper configuration.
///
/// Loads source configurations from TOML files with a precedence system:
/// 1. Bundled defaults (include_str! from vermeer.toml)
/// 2. User override (./vermeer.toml or ~/.config/vermeer/vermeer.toml)
///
/// # Example
///
/// ```no_run
/// use vermeer_core::{AssetKind, ScraperConfig, SourceId};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ScraperConfig::load()?;
/// let grid = config.source(SourceId::SteamGridDb);
/// println!("grid icon priority: {}", grid.priority(AssetKind::Icon));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Map of source id to source configuration
    #[serde(default)]
    pub sources: HashMap<SourceId, SourceConfig>,

    /// Duplicate the best Title into an empty icon list
    #[serde(default)]
    pub title_as_icon: bool,

    /// Cap on concurrently queried sources per title; `None` leaves each
    /// source's own limiter as the only bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_sources: Option<usize>,
}

impl ScraperConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> VermeerResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                VermeerError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                VermeerError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override
    /// earlier):
    /// 1. Bundled defaults (vermeer.toml shipped with the library)
    /// 2. User config in home directory (~/.config/vermeer/vermeer.toml)
    /// 3. User config in current directory (./vermeer.toml)
    ///
    /// User config files are optional and will be silently skipped if not
    /// found.
    #[instrument]
    pub fn load() -> VermeerResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        // Bundled default configuration
        const DEFAULT_CONFIG: &str = include_str!("../../../vermeer.toml");

        let mut builder = Config::builder()
            // Start with bundled defaults
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        // Add user config from home directory (optional)
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/vermeer/vermeer.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        // Add user config from current directory (optional, highest precedence)
        builder = builder.add_source(File::with_name("vermeer").required(false));

        builder
            .build()
            .map_err(|e| {
                VermeerError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                VermeerError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Configuration for one source, falling back to defaults for sources
    /// the file does not mention.
    pub fn source(&self, id: SourceId) -> SourceConfig {
        self.sources.get(&id).cloned().unwrap_or_default()
    }

    /// Sources with an explicit configuration block.
    pub fn configured_sources(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.sources.keys().copied()
    }
}
