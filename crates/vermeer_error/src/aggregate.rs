//! Error types for media aggregation.

/// Kinds of aggregation failures.
///
/// Per-source failures are absorbed at the source-client boundary; only the
/// conditions below cross the aggregator's public surface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum AggregateErrorKind {
    /// Every enabled source failed for this title
    #[display("All {} enabled sources failed for '{}'", sources, title)]
    Exhausted {
        /// Number of sources that were queried
        sources: usize,
        /// The title being aggregated
        title: String,
    },
    /// No source is enabled or capable for the requested media
    #[display("No enabled source can supply media for '{}'", _0)]
    NoSources(String),
}

/// Aggregation error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Aggregate Error: {} at line {} in {}", kind, line, file)]
pub struct AggregateError {
    /// The error kind
    pub kind: AggregateErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl AggregateError {
    /// Create a new AggregateError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AggregateErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
