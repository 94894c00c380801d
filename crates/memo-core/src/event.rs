//! Typed progress events streamed to callers while a run is in flight
//!
//! Event order is a correctness property of the protocol, not an
//! incidental detail: a successful run always emits
//! `status, status, news x N, status, data_summary, report, done`, and
//! a run that fails while being driven emits a strict prefix of that
//! sequence followed by exactly one `error` event.

use serde::{Deserialize, Serialize};

use crate::types::{NewsItem, SummaryFields};

/// One discrete progress message
///
/// Serializes to the wire envelope `{"event": <kind>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Human-readable stage transition
    Status { message: String },
    /// One news item, emitted per item in fetch order
    News(NewsItem),
    /// The valuation summary mapping from the market-data stage
    DataSummary(SummaryFields),
    /// The final memo text
    Report { markdown: String },
    /// Completion marker; always the last event on the success path
    Done { ok: bool },
    /// Terminal failure while driving the pipeline; replaces the
    /// remainder of the sequence, `done` is not emitted after it
    Error { message: String },
}

impl ProgressEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// The wire-level event kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::News(_) => "news",
            Self::DataSummary(_) => "data_summary",
            Self::Report { .. } => "report",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Render the event as one server-sent-events frame:
    /// `data: <JSON>\n\n`
    pub fn to_sse_frame(&self) -> serde_json::Result<String> {
        let payload = serde_json::to_string(self)?;
        Ok(format!("data: {payload}\n\n"))
    }
}
