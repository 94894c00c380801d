//! Error types for pipeline stages
//!
//! These errors never cross the pipeline boundary: each stage absorbs
//! them into its deterministic fallback output. They exist so the
//! capability clients (search, market data, LLM) can report failures
//! precisely enough for logging and fallback routing.

use thiserror::Error;

/// Errors raised by capability clients inside the pipeline stages
#[derive(Debug, Error)]
pub enum EngineError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Language-model provider error
    #[error("LLM error: {0}")]
    LlmError(#[from] memo_llm::LlmError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::ApiError("bad status".to_string());
        assert_eq!(err.to_string(), "API error: bad status");

        let err = EngineError::DataUnavailable {
            symbol: "AAPL".to_string(),
            reason: "No data found".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");
    }
}
