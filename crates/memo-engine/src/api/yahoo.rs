//! Yahoo Finance market-data source
//!
//! Daily history comes from the `yahoo_finance_api` client; the rust
//! client has no company-info endpoint, so the descriptive profile is
//! read from the public quoteSummary endpoint directly.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

use crate::error::{EngineError, Result};
use crate::market::{CompanyProfile, MarketDataSource, PriceBar};

const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const QUOTE_SUMMARY_MODULES: &str = "assetProfile,summaryDetail,price,financialData";

/// Yahoo Finance market-data source
pub struct YahooMarketData {
    client: Client,
    timeout: Duration,
}

impl YahooMarketData {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl MarketDataSource for YahooMarketData {
    async fn daily_history(&self, ticker: &str, lookback_days: i64) -> Result<Vec<PriceBar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| EngineError::YahooFinanceError(e.to_string()))?;

        let end = Utc::now();
        let start = end - chrono::Duration::days(lookback_days);

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| EngineError::YahooFinanceError(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| EngineError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(ticker, start_odt, end_odt)
            .await
            .map_err(|e| EngineError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| EngineError::YahooFinanceError(e.to_string()))?;

        Ok(quotes
            .iter()
            .map(|q| PriceBar {
                timestamp: q.timestamp as i64,
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }

    async fn company_profile(&self, ticker: &str) -> Result<CompanyProfile> {
        let url = format!("{QUOTE_SUMMARY_URL}/{ticker}?modules={QUOTE_SUMMARY_MODULES}");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header("User-Agent", "Mozilla/5.0 (compatible; memo-rs)")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::ApiError(format!(
                "quoteSummary error {status}: {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| EngineError::ApiError(format!("Failed to parse quoteSummary: {e}")))?;

        let result = payload["quoteSummary"]["result"]
            .get(0)
            .ok_or_else(|| EngineError::DataUnavailable {
                symbol: ticker.to_string(),
                reason: "empty quoteSummary result".to_string(),
            })?;

        Ok(parse_profile(result))
    }
}

fn parse_profile(result: &Value) -> CompanyProfile {
    CompanyProfile {
        long_name: string_field(result, "price", "longName"),
        sector: string_field(result, "assetProfile", "sector"),
        trailing_pe: raw_field(result, "summaryDetail", "trailingPE"),
        forward_pe: raw_field(result, "summaryDetail", "forwardPE"),
        market_cap: raw_field(result, "price", "marketCap"),
        beta: raw_field(result, "summaryDetail", "beta"),
        current_price: raw_field(result, "financialData", "currentPrice"),
        target_high_price: raw_field(result, "financialData", "targetHighPrice"),
        target_low_price: raw_field(result, "financialData", "targetLowPrice"),
        recommendation_key: string_field(result, "financialData", "recommendationKey"),
    }
}

/// Numeric fields arrive either as `{raw: n, fmt: "..."}` or as a bare
/// number depending on the module
fn raw_field(result: &Value, module: &str, field: &str) -> Option<f64> {
    let value = &result[module][field];
    value["raw"].as_f64().or_else(|| value.as_f64())
}

fn string_field(result: &Value, module: &str, field: &str) -> Option<String> {
    result[module][field].as_str().map(str::to_string)
}
