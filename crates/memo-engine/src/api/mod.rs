//! External capability clients
//!
//! Concrete implementations of the traits the pipeline stages consume:
//! a Perplexity-backed search client and a Yahoo Finance market-data
//! source. Every call here is single-attempt with a bounded timeout;
//! retry and fallback policy live in the stages, not in the clients.

pub mod perplexity;
pub mod yahoo;

pub use perplexity::PerplexityClient;
pub use yahoo::YahooMarketData;
