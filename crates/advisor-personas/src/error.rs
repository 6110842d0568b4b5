//! Error types for persona capabilities

use thiserror::Error;

/// Result type alias for capability calls
pub type Result<T> = std::result::Result<T, CapabilityError>;

/// Errors raised by a persona or narration capability
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// Network or HTTP error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote API returned an error payload
    #[error("API error: {0}")]
    Api(String),

    /// The response could not be parsed into a decision triple
    #[error("malformed capability response: {0}")]
    MalformedResponse(String),

    /// Missing API key or other configuration problem
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// A capability failure surfaces downstream as an unavailable field
impl From<CapabilityError> for advisor_core::Error {
    fn from(err: CapabilityError) -> Self {
        advisor_core::Error::Unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_unavailable() {
        let err = CapabilityError::Api("rate limited".to_string());
        let core: advisor_core::Error = err.into();
        assert!(matches!(core, advisor_core::Error::Unavailable(_)));
    }
}
