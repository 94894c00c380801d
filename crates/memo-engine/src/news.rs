//! News-search stage
//!
//! One best-effort call to a search capability; on any failure
//! (missing credential, transport error, bad status, malformed
//! payload) the stage substitutes a fixed, deterministic set of
//! placeholder items so downstream stages never see an empty or
//! erroring input. No retries: the first failure routes to fallback.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use memo_core::NewsItem;

use crate::error::Result;

/// Search/answer-generation capability scoped to recent financial news
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// One narrative answer about recent news for `ticker`
    async fn financial_news(&self, ticker: &str) -> Result<String>;
}

/// Fetches news items for a ticker; never fails
pub struct NewsFetcher {
    backend: Option<Arc<dyn SearchBackend>>,
    snippet_char_cap: usize,
}

impl NewsFetcher {
    /// `backend` is `None` when no search credential is configured;
    /// every fetch then uses the fallback set directly.
    pub fn new(backend: Option<Arc<dyn SearchBackend>>, snippet_char_cap: usize) -> Self {
        Self {
            backend,
            snippet_char_cap,
        }
    }

    /// Fetch up to `max_results` news items for `ticker`
    pub async fn fetch(&self, ticker: &str, max_results: usize) -> Vec<NewsItem> {
        let Some(backend) = &self.backend else {
            warn!("No search credential configured. Using fallback news for {ticker}");
            return fallback_news(ticker, max_results);
        };

        match backend.financial_news(ticker).await {
            Ok(narrative) => {
                let trimmed = narrative.trim();
                let snippet = if trimmed.is_empty() {
                    format!("Recent financial information about {ticker}")
                } else {
                    truncate_at_whitespace(trimmed, self.snippet_char_cap)
                };

                vec![NewsItem::new(format!("Financial News for {ticker}"), "", snippet)]
                    .into_iter()
                    .take(max_results)
                    .collect()
            }
            Err(e) => {
                error!("News search failed for {ticker}: {e}. Using fallback news.");
                fallback_news(ticker, max_results)
            }
        }
    }
}

/// The fixed fallback set: canonical public filing/market-data sites,
/// synthesized from the ticker alone
fn fallback_news(ticker: &str, max_results: usize) -> Vec<NewsItem> {
    [
        NewsItem::new(
            format!("{ticker} - Recent Earnings Report"),
            format!("https://finance.yahoo.com/quote/{ticker}"),
            format!("Latest quarterly earnings and financial performance for {ticker}"),
        ),
        NewsItem::new(
            format!("{ticker} - Market Analysis"),
            format!(
                "https://www.marketwatch.com/investing/stock/{}",
                ticker.to_lowercase()
            ),
            format!("Current market analysis and price movements for {ticker}"),
        ),
        NewsItem::new(
            format!("{ticker} - Analyst Ratings"),
            format!("https://www.reuters.com/companies/{ticker}"),
            format!("Analyst recommendations and price targets for {ticker}"),
        ),
        NewsItem::new(
            format!("{ticker} - SEC Filings"),
            format!("https://www.sec.gov/edgar/search/#/q={ticker}"),
            format!("Recent SEC filings and regulatory documents for {ticker}"),
        ),
    ]
    .into_iter()
    .take(max_results)
    .collect()
}

/// Truncate at the last whitespace at-or-before `cap` characters and
/// append an ellipsis; text at or under the cap passes through
fn truncate_at_whitespace(text: &str, cap: usize) -> String {
    let byte_cap = match text.char_indices().nth(cap) {
        Some((idx, _)) => idx,
        None => return text.to_string(),
    };

    let head = &text[..byte_cap];
    let cutoff = head.rfind(char::is_whitespace).unwrap_or(byte_cap);
    format!("{}…", text[..cutoff].trim_end())
}
