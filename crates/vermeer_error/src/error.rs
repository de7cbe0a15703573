//! Top-level error wrapper types.

use crate::{
    AggregateError, ConfigError, FetchError, GeometryError, JsonError, RateLimitError,
    StorageError, UpscaleError,
};

/// This is the foundation error enum. Each vermeer crate contributes its
/// domain error as a variant.
///
/// # Examples
///
/// ```
/// use vermeer_error::{VermeerError, ConfigError};
///
/// let cfg_err = ConfigError::new("missing field");
/// let err: VermeerError = cfg_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VermeerErrorKind {
    /// Per-source fetch error
    #[from(FetchError)]
    Fetch(FetchError),
    /// Rate limiter error
    #[from(RateLimitError)]
    RateLimit(RateLimitError),
    /// Crop geometry error
    #[from(GeometryError)]
    Geometry(GeometryError),
    /// Aggregation error
    #[from(AggregateError)]
    Aggregate(AggregateError),
    /// Upscale supervisor error
    #[from(UpscaleError)]
    Upscale(UpscaleError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
}

/// Vermeer error with kind discrimination.
///
/// # Examples
///
/// ```
/// use vermeer_error::{VermeerResult, ConfigError};
///
/// fn might_fail() -> VermeerResult<()> {
///     Err(ConfigError::new("missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vermeer Error: {}", _0)]
pub struct VermeerError(Box<VermeerErrorKind>);

impl VermeerError {
    /// Create a new error from a kind.
    pub fn new(kind: VermeerErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VermeerErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to VermeerErrorKind
impl<T> From<T> for VermeerError
where
    T: Into<VermeerErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for vermeer operations.
///
/// # Examples
///
/// ```
/// use vermeer_error::{VermeerResult, JsonError};
///
/// fn decode() -> VermeerResult<String> {
///     Err(JsonError::new("unexpected end of input"))?
/// }
/// ```
pub type VermeerResult<T> = std::result::Result<T, VermeerError>;
