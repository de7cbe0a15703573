//! Error types for the upscale process supervisor.

/// Kinds of supervisor failures.
///
/// Each lifecycle phase reports its own kind so callers can distinguish an
/// installation problem from a crashed server or a health-poll timeout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum UpscaleErrorKind {
    /// The one-shot setup command exited non-zero or failed to run
    #[display("Installation failed: {}", _0)]
    InstallFailed(String),
    /// The server process could not be spawned
    #[display("Failed to start server: {}", _0)]
    StartFailed(String),
    /// The server never answered its health probe within the timeout
    #[display("Server did not become healthy within {}s", _0)]
    HealthTimeout(u64),
    /// The server process exited while it was expected to be running
    #[display("Server process exited unexpectedly: {}", _0)]
    Crashed(String),
    /// HTTP-level failure talking to the running server
    #[display("HTTP request failed: {}", _0)]
    Http(String),
    /// The server answered but reported a failure
    #[display("Server error: {}", _0)]
    Api(String),
    /// The response payload could not be decoded
    #[display("Failed to decode response: {}", _0)]
    Decode(String),
    /// An enhancement request was made with no running server
    #[display("Server is not running (state: {})", _0)]
    NotRunning(String),
}

/// Supervisor error with location tracking.
///
/// # Examples
///
/// ```
/// use vermeer_error::{UpscaleError, UpscaleErrorKind};
///
/// let err = UpscaleError::new(UpscaleErrorKind::HealthTimeout(600));
/// assert!(format!("{}", err).contains("healthy"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Upscale Error: {} at line {} in {}", kind, line, file)]
pub struct UpscaleError {
    /// The error kind
    pub kind: UpscaleErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl UpscaleError {
    /// Create a new UpscaleError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: UpscaleErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
