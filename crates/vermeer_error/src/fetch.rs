//! Error types for remote source fetches.

/// Kinds of per-source fetch failures.
///
/// All of these are transient from the aggregation's point of view: a source
/// that fails contributes an empty result set and the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum FetchErrorKind {
    /// Transport-level failure (connect, TLS, protocol)
    #[display("HTTP request failed: {}", _0)]
    Http(String),
    /// The call exceeded its timeout budget
    #[display("Request timed out after {}s", _0)]
    Timeout(u64),
    /// The server answered with a non-success status
    #[display("Server returned status {}: {}", status, message)]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },
    /// Token acquisition or refresh failed
    #[display("Authentication failed: {}", _0)]
    Auth(String),
    /// The response body could not be mapped into domain records
    #[display("Failed to decode response: {}", _0)]
    Decode(String),
    /// The source's rate limiter refused the request
    #[display("Rate limited: {}", _0)]
    RateLimited(String),
}

impl From<crate::RateLimitError> for FetchError {
    #[track_caller]
    fn from(err: crate::RateLimitError) -> Self {
        FetchError::new(FetchErrorKind::RateLimited(err.kind.to_string()))
    }
}

/// Fetch error with location tracking.
///
/// # Examples
///
/// ```
/// use vermeer_error::{FetchError, FetchErrorKind};
///
/// let err = FetchError::new(FetchErrorKind::Timeout(10));
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Fetch Error: {} at line {} in {}", kind, line, file)]
pub struct FetchError {
    /// The error kind
    pub kind: FetchErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl FetchError {
    /// Create a new FetchError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FetchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Classifies errors as retryable (transient) or permanent.
///
/// Retry loops consult this before re-issuing a request: a 429 or 503 is
/// worth retrying with backoff, a 401 is not.
pub trait RetryableError {
    /// Returns true if the operation may succeed on retry.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for FetchError {
    fn is_retryable(&self) -> bool {
        match &self.kind {
            FetchErrorKind::Http(_) | FetchErrorKind::Timeout(_) => true,
            FetchErrorKind::Status { status, .. } => {
                *status == 429 || (500..600).contains(status)
            }
            FetchErrorKind::Auth(_)
            | FetchErrorKind::Decode(_)
            | FetchErrorKind::RateLimited(_) => false,
        }
    }
}
