//! Error types for market data collection

use thiserror::Error;

/// Data provider specific errors
#[derive(Debug, Error)]
pub enum ProviderError {
    /// API request failed
    #[error("API error: {0}")]
    Api(String),

    /// Ticker symbol could not be resolved
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    /// Data not available for the requested ticker
    #[error("Data not available for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Convert ProviderError to advisor_core::Error
impl From<ProviderError> for advisor_core::Error {
    fn from(err: ProviderError) -> Self {
        advisor_core::Error::Unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::InvalidTicker("NOPE".to_string());
        assert_eq!(err.to_string(), "Invalid ticker: NOPE");

        let err = ProviderError::DataUnavailable {
            ticker: "AAPL".to_string(),
            reason: "no daily series".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for AAPL: no daily series");
    }

    #[test]
    fn test_error_conversion() {
        let err = ProviderError::Api("bad gateway".to_string());
        let core_err: advisor_core::Error = err.into();

        match core_err {
            advisor_core::Error::Unavailable(msg) => assert!(msg.contains("API error")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
