//! Error types for crop geometry remapping.

/// Kinds of geometry errors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum GeometryErrorKind {
    /// A source dimension was zero; the crop cannot be scaled
    #[display("Cannot remap crop from zero-sized image ({}x{})", _0, _1)]
    ZeroDimension(u32, u32),
}

/// Geometry error with location tracking.
///
/// Unlike fetch failures, geometry errors are propagated to the caller:
/// a degenerate remap input is a programming error, not a transient fault.
///
/// # Examples
///
/// ```
/// use vermeer_error::{GeometryError, GeometryErrorKind};
///
/// let err = GeometryError::new(GeometryErrorKind::ZeroDimension(0, 600));
/// assert!(format!("{}", err).contains("zero-sized"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Geometry Error: {} at line {} in {}", kind, line, file)]
pub struct GeometryError {
    /// The error kind
    pub kind: GeometryErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl GeometryError {
    /// Create a new GeometryError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GeometryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
