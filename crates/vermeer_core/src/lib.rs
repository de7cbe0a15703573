//! Core data types for the vermeer game media library.
//!
//! This crate provides the foundation data types used across all vermeer
//! interfaces: media candidate records, crop geometry, the per-title
//! aggregation context, source identifiers, and scraper configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod crop;
mod media;
mod source;
mod storage;

pub use config::{AuthConfig, KindRule, LimitSettings, ScraperConfig, SourceConfig};
pub use context::MediaContext;
pub use crop::Crop;
pub use media::{AssetKind, Image, Media, MediaRecord, Music, Video};
pub use source::SourceId;
pub use storage::MediaStorage;
