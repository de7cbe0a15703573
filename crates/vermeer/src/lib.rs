//! Vermeer - game media acquisition, aggregation and upscaling.
//!
//! Vermeer fetches box-art, logos, hero/slide images, trailers and music
//! for a local game library from several independent remote sources,
//! reconciles the results into one ranked asset set per title, and drives
//! an external image-enhancement server as a supervised child process.
//!
//! # Architecture
//!
//! - **Rate Limiter Pool**: per-source token buckets, separate for query
//!   and download traffic, so one slow provider cannot starve the others
//! - **Source Clients**: one per provider, translating each protocol into
//!   domain media candidates; failures are absorbed per source
//! - **Aggregator**: concurrent fan-out and deterministic merge with
//!   priority, fallback, style and square-icon rules
//! - **Geometry**: crop rectangles remap across resolution changes
//! - **Upscale Supervisor**: install, start, health-poll, serialize
//!   requests to, and shut down the enhancement server
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vermeer::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScraperConfig::load()?;
//!     let aggregator = Aggregator::from_config(config, storage);
//!
//!     let mut context = aggregator.get_media("Sega Genesis", "Comix Zone").await?;
//!     aggregator.download_missing_media(&mut context).await;
//!
//!     if let Some(best_icon) = context.best(AssetKind::Icon) {
//!         println!("icon: {}", best_icon.record().url);
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod telemetry;

pub use telemetry::init_tracing;
pub use vermeer_aggregate::Aggregator;
pub use vermeer_core::{
    AssetKind, AuthConfig, Crop, Image, KindRule, LimitSettings, Media, MediaContext, MediaRecord,
    MediaStorage, Music, ScraperConfig, SourceConfig, SourceId, Video,
};
pub use vermeer_error::{
    AggregateError, AggregateErrorKind, ConfigError, FetchError, FetchErrorKind, GeometryError,
    GeometryErrorKind, JsonError, RateLimitError, RateLimitErrorKind, RetryableError,
    StorageError, StorageErrorKind, UpscaleError, UpscaleErrorKind, VermeerError,
    VermeerErrorKind, VermeerResult,
};
pub use vermeer_rate_limit::{DownloadPermit, LimiterPool, SourceLimiter, TokenBucket};
pub use vermeer_sources::{
    download_bytes, IgdbClient, SourceClient, SourceResult, SteamGridDbClient, YoutubeClient,
};
pub use vermeer_upscale::{
    CommandSpec, EnhanceDefaults, Supervisor, SupervisorState, UpscaleClient, UpscaleConfig,
    UpscaleOutcome,
};

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::{
        Aggregator, AssetKind, Crop, Media, MediaContext, MediaStorage, ScraperConfig, SourceId,
        Supervisor, UpscaleConfig, VermeerResult,
    };
}
