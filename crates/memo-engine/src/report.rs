//! Report-synthesis stage
//!
//! Two-variant strategy behind one `synthesize` call: attempt one
//! generative completion, and on any failure result (no credential,
//! provider error, empty response) render the same five-section memo
//! deterministically from the snapshot fields already fetched. The
//! failure never crosses the interface and the primary path is never
//! retried.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use memo_core::{MarketSnapshot, NewsItem, SummaryFields};
use memo_llm::{CompletionRequest, LlmProvider, Message};

use crate::error::Result;
use crate::prompts;

/// Produces the memo text; never fails, always non-empty
pub struct ReportSynthesizer {
    provider: Option<Arc<dyn LlmProvider>>,
    model: String,
    max_tokens: usize,
    temperature: f32,
    prompt_char_cap: usize,
}

impl ReportSynthesizer {
    /// `provider` is `None` when no LLM credential is configured;
    /// every run then renders the template directly.
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        model: impl Into<String>,
        max_tokens: usize,
        temperature: f32,
        prompt_char_cap: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            temperature,
            prompt_char_cap,
        }
    }

    /// Synthesize a Markdown memo from the news and market stages
    pub async fn synthesize(
        &self,
        ticker: &str,
        news: &[NewsItem],
        snapshot: &MarketSnapshot,
    ) -> String {
        if let Some(provider) = &self.provider {
            info!("Generating AI analysis for {ticker}");
            match self.generate(provider.as_ref(), ticker, news, snapshot).await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => warn!("Empty synthesis response for {ticker}. Using template report."),
                Err(e) => error!("Error generating AI report for {ticker}: {e}"),
            }
        } else {
            warn!("No LLM credential configured. Using template report for {ticker}");
        }

        template_report(ticker, &snapshot.summary)
    }

    async fn generate(
        &self,
        provider: &dyn LlmProvider,
        ticker: &str,
        news: &[NewsItem],
        snapshot: &MarketSnapshot,
    ) -> Result<String> {
        // Bounded-size serializations to respect provider payload limits
        let data_summary = bounded_json(snapshot, self.prompt_char_cap)?;
        let news_summary = bounded_json(&news, self.prompt_char_cap)?;

        let request = CompletionRequest::builder(&self.model)
            .add_message(Message::user(prompts::report_prompt(
                ticker,
                &data_summary,
                &news_summary,
            )))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        let response = provider.complete(request).await?;
        Ok(response.text().to_string())
    }
}

fn bounded_json<T: serde::Serialize>(value: &T, cap: usize) -> Result<String> {
    let mut serialized = serde_json::to_string_pretty(value)?;
    if let Some((idx, _)) = serialized.char_indices().nth(cap) {
        serialized.truncate(idx);
    }
    Ok(serialized)
}

/// Deterministic five-section memo rendered from the snapshot summary
fn template_report(ticker: &str, summary: &SummaryFields) -> String {
    let long_name = display_field(summary, "longName").unwrap_or_else(|| ticker.to_string());
    let sector = display_field(summary, "sector").unwrap_or_else(|| "N/A".to_string());
    let sector_or_industry = display_field(summary, "sector").unwrap_or_else(|| "Industry".to_string());
    let sector_lower = display_field(summary, "sector").unwrap_or_else(|| "industry".to_string());
    let beta = display_field(summary, "beta").unwrap_or_else(|| "N/A".to_string());
    let trailing_pe = display_field(summary, "trailingPE").unwrap_or_else(|| "N/A".to_string());
    let forward_pe = display_field(summary, "forwardPE").unwrap_or_else(|| "N/A".to_string());
    let target_high = display_field(summary, "targetHighPrice").unwrap_or_else(|| "N/A".to_string());
    let target_low = display_field(summary, "targetLowPrice").unwrap_or_else(|| "N/A".to_string());
    let market_cap = format_market_cap(summary.get("marketCap"));
    let price = format_price(summary.get("currentPrice"));
    let stance = summary
        .get("recommendationKey")
        .and_then(Value::as_str)
        .unwrap_or("HOLD")
        .to_uppercase();
    let generated = Utc::now().format("%Y-%m-%d %H:%M:%S");

    format!(
        r"# {ticker} - Equity Analysis Report

## Company Overview
- **Company**: {long_name}
- **Sector**: {sector}
- **Market Cap**: {market_cap}
- **Beta**: {beta}
- **Current Price**: {price}

## Technical Signals
- **Trailing P/E**: {trailing_pe}
- **Forward P/E**: {forward_pe}
- **Target High**: ${target_high}
- **Target Low**: ${target_low}

## Key Risks
1. **Market Volatility**: Current beta of {beta} indicates sensitivity to market movements
2. **Valuation Concerns**: P/E ratios suggest potential overvaluation risks
3. **Sector-Specific Risks**: {sector_or_industry}-related regulatory and competitive pressures

## Catalysts & Monitors
1. **Earnings Reports**: Monitor quarterly results and guidance updates
2. **Technical Levels**: Watch for breaks of recent support/resistance
3. **Sector News**: Keep track of {sector_lower}-wide developments

## Investment Stance
**{stance}** - Monitor technical trends and upcoming catalysts for entry/exit opportunities.

---
*Generated on {generated}*
"
    )
}

/// Render a scalar summary field for display; `None` when null/absent
fn display_field(summary: &SummaryFields, key: &str) -> Option<String> {
    match summary.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Comma-grouped, currency-prefixed market cap, or "N/A"
fn format_market_cap(value: Option<&Value>) -> String {
    match value.and_then(Value::as_f64) {
        Some(cap) if cap >= 0.0 => format!("${}", group_thousands(cap as u128)),
        _ => "N/A".to_string(),
    }
}

/// Two-decimal, currency-prefixed price when numeric, otherwise "N/A"
fn format_price(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .map_or_else(|| "N/A".to_string(), |p| format!("${p:.2}")),
        Some(Value::String(s)) => s.clone(),
        _ => "N/A".to_string(),
    }
}

fn group_thousands(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut groups = Vec::new();
    while n > 0 {
        groups.push((n % 1000) as u16);
        n /= 1000;
    }
    let mut out = groups
        .pop()
        .map(|g| g.to_string())
        .unwrap_or_default();
    for group in groups.into_iter().rev() {
        out.push_str(&format!(",{group:03}"));
    }
    out
}
