//! Market-data stage
//!
//! Fetches a bounded daily price history and a valuation/descriptive
//! snapshot for one ticker. Provider failures never propagate: they are
//! normalized into a snapshot whose summary carries a single `error`
//! field, so downstream stages always receive a well-formed input.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::error;

use memo_core::{MarketSnapshot, OhlcBar, SummaryFields};

use crate::error::Result;

/// One raw daily bar as returned by a provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    /// UNIX timestamp, seconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Descriptive/valuation fields from a provider's company lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyProfile {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
    pub current_price: Option<f64>,
    pub target_high_price: Option<f64>,
    pub target_low_price: Option<f64>,
    pub recommendation_key: Option<String>,
}

/// Market-data provider capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily price bars covering at least `lookback_days` back from now
    async fn daily_history(&self, ticker: &str, lookback_days: i64) -> Result<Vec<PriceBar>>;

    /// Descriptive/valuation lookup for the ticker
    async fn company_profile(&self, ticker: &str) -> Result<CompanyProfile>;
}

/// Fetches and normalizes market data; never fails
pub struct MarketDataFetcher {
    source: Arc<dyn MarketDataSource>,
    max_bars: usize,
}

impl MarketDataFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>, max_bars: usize) -> Self {
        Self { source, max_bars }
    }

    /// Fetch a snapshot for `ticker`
    ///
    /// Any provider or normalization error is surfaced as data in the
    /// summary (`{ohlc: [], summary: {error: ...}}`), not propagated.
    pub async fn fetch(&self, ticker: &str, lookback_days: i64) -> MarketSnapshot {
        match self.fetch_inner(ticker, lookback_days).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Error fetching price data for {ticker}: {e}");
                MarketSnapshot::from_error(format!("Failed to fetch data for {ticker}: {e}"))
            }
        }
    }

    async fn fetch_inner(&self, ticker: &str, lookback_days: i64) -> Result<MarketSnapshot> {
        let bars = self.source.daily_history(ticker, lookback_days).await?;
        let profile = self.source.company_profile(ticker).await?;

        // Keep only the most recent bars
        let skip = bars.len().saturating_sub(self.max_bars);
        let ohlc = bars[skip..].iter().map(normalize_bar).collect();

        Ok(MarketSnapshot {
            ohlc,
            summary: build_summary(ticker, &profile),
        })
    }
}

/// Convert a raw bar to its transport form (ISO date, plain scalars)
fn normalize_bar(bar: &PriceBar) -> OhlcBar {
    let date = DateTime::from_timestamp(bar.timestamp, 0)
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();

    OhlcBar {
        date,
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close: bar.close,
        volume: bar.volume,
    }
}

/// Populate the fixed summary key set, defaulting absent fields to null
/// and `longName` to the ticker itself
fn build_summary(ticker: &str, profile: &CompanyProfile) -> SummaryFields {
    fn num(value: Option<f64>) -> Value {
        value.map_or(Value::Null, |v| {
            serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
        })
    }

    fn text(value: &Option<String>) -> Value {
        value
            .as_ref()
            .map_or(Value::Null, |v| Value::String(v.clone()))
    }

    let mut summary = SummaryFields::new();
    summary.insert("trailingPE".to_string(), num(profile.trailing_pe));
    summary.insert("forwardPE".to_string(), num(profile.forward_pe));
    summary.insert("marketCap".to_string(), num(profile.market_cap));
    summary.insert("sector".to_string(), text(&profile.sector));
    summary.insert("beta".to_string(), num(profile.beta));
    summary.insert(
        "longName".to_string(),
        Value::String(
            profile
                .long_name
                .clone()
                .unwrap_or_else(|| ticker.to_string()),
        ),
    );
    summary.insert("currentPrice".to_string(), num(profile.current_price));
    summary.insert("targetHighPrice".to_string(), num(profile.target_high_price));
    summary.insert("targetLowPrice".to_string(), num(profile.target_low_price));
    summary.insert(
        "recommendationKey".to_string(),
        text(&profile.recommendation_key),
    );
    summary
}
