//! Staged equity-analysis pipeline
//!
//! This crate implements the core of memo-rs: a three-stage pipeline
//! (news search, market data, report synthesis) where every stage can
//! independently fail or be unavailable and falls back to a
//! deterministic substitute, so a run always completes with a usable
//! result.
//!
//! # Architecture
//!
//! - [`NewsFetcher`] - best-effort search lookup with a fixed fallback
//!   news set
//! - [`MarketDataFetcher`] - price history plus valuation snapshot;
//!   provider failures become an `error` field in the summary, never a
//!   propagated error
//! - [`ReportSynthesizer`] - generative memo first, deterministic
//!   template render on any failure
//! - [`AnalysisPipeline`] - sequences the stages and converts any
//!   escaping defect into a best-effort partial result
//! - [`EventEmitter`] - drives one run and delivers typed, ordered
//!   progress events over a channel while the pipeline executes
//!
//! External capabilities (search backend, market-data provider, LLM)
//! sit behind traits so they can be mocked in tests and swapped in
//! deployment.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod market;
pub mod news;
pub mod pipeline;
pub mod prompts;
pub mod report;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use events::EventEmitter;
pub use market::{MarketDataFetcher, MarketDataSource};
pub use news::{NewsFetcher, SearchBackend};
pub use pipeline::{Analyzer, AnalysisPipeline};
pub use report::ReportSynthesizer;
