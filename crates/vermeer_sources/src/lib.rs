//! Remote source clients.
//!
//! One client per provider, each translating that provider's protocol into
//! domain media candidates. Every network call passes through the source's
//! rate limiter first; HTTP-level failures are converted into
//! [`vermeer_error::FetchError`] and absorbed at the aggregation boundary
//! as "no result from this source".

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod igdb;
mod steamgriddb;
mod youtube;

pub use client::{SourceClient, SourceResult, download_bytes, DOWNLOAD_TIMEOUT, QUERY_TIMEOUT};
pub use igdb::IgdbClient;
pub use steamgriddb::SteamGridDbClient;
pub use youtube::YoutubeClient;
