//! Error types for the vermeer library.
//!
//! This crate provides the foundation error types used throughout the vermeer
//! ecosystem.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use vermeer_error::{VermeerResult, ConfigError};
//!
//! fn load_settings() -> VermeerResult<String> {
//!     Err(ConfigError::new("missing [sources] table"))?
//! }
//!
//! match load_settings() {
//!     Ok(s) => println!("Got: {}", s),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregate;
mod config;
mod error;
mod fetch;
mod geometry;
mod json;
mod rate_limit;
mod storage;
mod upscale;

pub use aggregate::{AggregateError, AggregateErrorKind};
pub use config::ConfigError;
pub use error::{VermeerError, VermeerErrorKind, VermeerResult};
pub use fetch::{FetchError, FetchErrorKind, RetryableError};
pub use geometry::{GeometryError, GeometryErrorKind};
pub use json::JsonError;
pub use rate_limit::{RateLimitError, RateLimitErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use upscale::{UpscaleError, UpscaleErrorKind};
