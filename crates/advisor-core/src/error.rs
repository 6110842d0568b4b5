//! Error types for advisor-core

use thiserror::Error;

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pipeline operations
///
/// `MissingFact` and `NonNumericFact` are hard failures: a rule that cannot
/// find its input must not silently default, since that would corrupt the
/// weighted scores. `Unavailable` marks an upstream collection or capability
/// failure; downstream stages treat the affected field as never written.
#[derive(Debug, Error)]
pub enum Error {
    /// A required fact was absent from the facts snapshot
    #[error("missing fact: {0}")]
    MissingFact(String),

    /// A fact was present but not of the expected numeric type
    #[error("fact is not numeric: {0}")]
    NonNumericFact(String),

    /// Input to a component was empty or malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An upstream data source or capability failed or timed out
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error message
    #[error("{0}")]
    Other(String),
}
