//! Rate limiting for remote media sources.
//!
//! Each source gets two independent token buckets, one for metadata queries
//! and one for binary downloads, plus a hard cap on simultaneously open
//! download connections. Buckets serve waiters strictly oldest-first and a
//! cancelled waiter never consumes a token, so one slow or rate-limited
//! provider can neither starve the others nor leak permits.
//!
//! The bucket itself is a generic primitive parametrized by capacity and
//! refill interval; it knows nothing about HTTP and is testable without any
//! network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bucket;
mod pool;

pub use bucket::TokenBucket;
pub use pool::{DownloadPermit, LimiterPool, SourceLimiter};
pub use vermeer_error::{RateLimitError, RateLimitErrorKind};
