//! Configuration for analysis runs
//!
//! All model names, prompt budgets, and credentials flow through this
//! struct into the stage constructors; nothing is read from process
//! globals after startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How far back to request daily price history
    pub lookback_days: i64,

    /// Maximum price bars kept after trimming (most recent first out)
    pub max_bars: usize,

    /// Maximum news items returned per run
    pub max_news_items: usize,

    /// Character cap for a search-narrative snippet
    pub snippet_char_cap: usize,

    /// Character cap per serialized prompt section (news, data)
    pub prompt_char_cap: usize,

    /// Model used for report synthesis
    pub report_model: String,

    /// Output-length budget for report synthesis
    pub report_max_tokens: usize,

    /// Sampling temperature for report synthesis (low randomness)
    pub report_temperature: f32,

    /// Model used for the news search capability
    pub search_model: String,

    /// Output-length budget for the news search capability
    pub search_max_tokens: usize,

    /// Sampling temperature for the news search capability
    pub search_temperature: f32,

    /// Timeout for each outbound provider call
    pub request_timeout: Duration,

    /// OpenAI API key; report synthesis falls back to the template
    /// render when absent
    pub openai_api_key: Option<String>,

    /// Perplexity API key; the news stage falls back to the fixed
    /// placeholder set when absent
    pub perplexity_api_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_days: 400,
            max_bars: 400,
            max_news_items: 6,
            snippet_char_cap: 2000,
            prompt_char_cap: 4000,
            report_model: "gpt-4o-mini".to_string(),
            report_max_tokens: 1500,
            report_temperature: 0.1,
            search_model: "sonar".to_string(),
            search_max_tokens: 1000,
            search_temperature: 0.2,
            request_timeout: Duration::from_secs(30),
            openai_api_key: None,
            perplexity_api_key: None,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load provider API keys from the environment
    /// (`OPENAI_API_KEY`, `PERPLEXITY_API_KEY`)
    pub fn with_env_keys(mut self) -> Self {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("PERPLEXITY_API_KEY") {
            self.perplexity_api_key = Some(key);
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_news_items == 0 {
            return Err(EngineError::ConfigError(
                "max_news_items must be greater than 0".to_string(),
            ));
        }

        if self.lookback_days <= 0 {
            return Err(EngineError::ConfigError(
                "lookback_days must be positive".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(EngineError::ConfigError(
                "request_timeout must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    lookback_days: Option<i64>,
    max_bars: Option<usize>,
    max_news_items: Option<usize>,
    report_model: Option<String>,
    search_model: Option<String>,
    request_timeout: Option<Duration>,
    openai_api_key: Option<String>,
    perplexity_api_key: Option<String>,
    load_env_keys: bool,
}

impl EngineConfigBuilder {
    /// Set the price-history lookback window
    pub fn lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Set the maximum number of price bars kept
    pub fn max_bars(mut self, bars: usize) -> Self {
        self.max_bars = Some(bars);
        self
    }

    /// Set the maximum news items per run
    pub fn max_news_items(mut self, items: usize) -> Self {
        self.max_news_items = Some(items);
        self
    }

    /// Set the report-synthesis model
    pub fn report_model(mut self, model: impl Into<String>) -> Self {
        self.report_model = Some(model.into());
        self
    }

    /// Set the search model
    pub fn search_model(mut self, model: impl Into<String>) -> Self {
        self.search_model = Some(model.into());
        self
    }

    /// Set the outbound request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the OpenAI API key
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Set the Perplexity API key
    pub fn perplexity_api_key(mut self, key: impl Into<String>) -> Self {
        self.perplexity_api_key = Some(key.into());
        self
    }

    /// Load missing API keys from the environment when building
    pub fn with_env_keys(mut self) -> Self {
        self.load_env_keys = true;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EngineConfig> {
        let defaults = EngineConfig::default();

        let mut config = EngineConfig {
            lookback_days: self.lookback_days.unwrap_or(defaults.lookback_days),
            max_bars: self.max_bars.unwrap_or(defaults.max_bars),
            max_news_items: self.max_news_items.unwrap_or(defaults.max_news_items),
            report_model: self.report_model.unwrap_or(defaults.report_model),
            search_model: self.search_model.unwrap_or(defaults.search_model),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            openai_api_key: self.openai_api_key,
            perplexity_api_key: self.perplexity_api_key,
            ..defaults
        };

        if self.load_env_keys {
            if config.openai_api_key.is_none() {
                config.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
            }
            if config.perplexity_api_key.is_none() {
                config.perplexity_api_key = std::env::var("PERPLEXITY_API_KEY").ok();
            }
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.lookback_days, 400);
        assert_eq!(config.max_bars, 400);
        assert_eq!(config.max_news_items, 6);
        assert_eq!(config.report_model, "gpt-4o-mini");
        assert_eq!(config.search_model, "sonar");
        assert!(config.openai_api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .max_news_items(4)
            .report_model("gpt-4o")
            .request_timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        assert_eq!(config.max_news_items, 4);
        assert_eq!(config.report_model, "gpt-4o");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validation_rejects_zero_news_items() {
        let result = EngineConfig::builder().max_news_items(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_nonpositive_lookback() {
        let result = EngineConfig::builder().lookback_days(0).build();
        assert!(result.is_err());
    }
}
