//! Analysis payload types shared across pipeline stages

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named valuation fields with nullable scalar values.
///
/// On the success path this holds the fixed key set populated by the
/// market-data stage; on failure it holds a single `error` entry. A
/// JSON map rather than a struct so both shapes serialize exactly as
/// the wire protocol expects.
pub type SummaryFields = serde_json::Map<String, Value>;

/// A single news/context item, in fetch order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline or synthesized title
    pub title: String,
    /// Source URL; empty for synthesized narrative items
    pub url: String,
    /// Bounded-length summary text
    pub snippet: String,
}

impl NewsItem {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// One transport-normalized daily price bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    /// Bar date, ISO-8601 with second precision
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Price history plus valuation snapshot for one ticker
///
/// Invariant: `summary` is always present (possibly containing only an
/// `error` field); `ohlc` may be empty but is never absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ohlc: Vec<OhlcBar>,
    pub summary: SummaryFields,
}

impl MarketSnapshot {
    /// Snapshot carrying an error as data instead of a price series
    pub fn from_error(message: impl Into<String>) -> Self {
        let mut summary = SummaryFields::new();
        summary.insert("error".to_string(), Value::String(message.into()));
        Self {
            ohlc: Vec::new(),
            summary,
        }
    }

    /// Whether the snapshot degraded to an error payload
    pub fn is_error(&self) -> bool {
        self.summary.contains_key("error")
    }
}

/// Aggregated output of one pipeline run
///
/// Invariant: all three fields are always populated with real data or a
/// documented fallback, never absent - the pipeline is total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub news: Vec<NewsItem>,
    pub data: MarketSnapshot,
    pub report: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_item_wire_shape() {
        let item = NewsItem::new("AAPL - Market Analysis", "", "Price movements for AAPL");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["title"], "AAPL - Market Analysis");
        assert_eq!(json["url"], "");
        assert_eq!(json["snippet"], "Price movements for AAPL");
    }

    #[test]
    fn test_error_snapshot() {
        let snapshot = MarketSnapshot::from_error("Failed to fetch data for XYZ");
        assert!(snapshot.ohlc.is_empty());
        assert!(snapshot.is_error());
        assert_eq!(
            snapshot.summary.get("error").and_then(Value::as_str),
            Some("Failed to fetch data for XYZ")
        );
    }

    #[test]
    fn test_summary_nullable_fields_serialize_as_null() {
        let mut summary = SummaryFields::new();
        summary.insert("trailingPE".to_string(), Value::Null);
        summary.insert("sector".to_string(), Value::String("Technology".into()));
        let snapshot = MarketSnapshot {
            ohlc: vec![],
            summary,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains(r#""trailingPE":null"#));
        assert!(json.contains(r#""sector":"Technology""#));
    }
}
