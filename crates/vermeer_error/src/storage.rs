//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to read a stored asset
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Failed to persist downloaded bytes
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// The requested asset does not exist
    #[display("Media not found: {}", _0)]
    NotFound(String),
}

/// Storage error with location tracking.
///
/// Raised by `MediaStorage` implementations; the core itself never touches
/// the filesystem.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new StorageError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
