//! Shared data model for the memo-rs workspace
//!
//! This crate defines the types that cross stage and transport
//! boundaries:
//!
//! - `NewsItem`, `OhlcBar`, `MarketSnapshot`, `AnalysisResult` - the
//!   per-request analysis payloads
//! - `ProgressEvent` - the typed, ordered events streamed to callers
//!   while a pipeline run is in flight
//!
//! Every entity is constructed fresh per request and discarded when the
//! response completes; nothing here holds cross-request state.

pub mod event;
pub mod logging;
pub mod types;

// Re-export main types for convenience
pub use event::ProgressEvent;
pub use types::{AnalysisResult, MarketSnapshot, NewsItem, OhlcBar, SummaryFields};
