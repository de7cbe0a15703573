//! Error types for rate limiting.

/// Kinds of rate limiter failures.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// The limiter cannot grant a permit in its current configuration
    #[display("Rate limiter saturated: {}", _0)]
    Saturated(String),
    /// The limiter was shut down while callers were waiting
    #[display("Rate limiter closed: {}", _0)]
    Closed(String),
}

/// Rate limit error with location tracking.
///
/// Surfaced as a transient failure to the caller; a request that cannot
/// acquire a permit is never silently dropped.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    /// The error kind
    pub kind: RateLimitErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl RateLimitError {
    /// Create a new RateLimitError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
