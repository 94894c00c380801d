//! Pipeline orchestration
//!
//! Sequences the three stages strictly (the synthesis stage consumes
//! the outputs of the first two) and guarantees totality: each stage
//! already absorbs its own failures, and a defect escaping the
//! sequencing itself is caught here and converted into a best-effort
//! partial result.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, warn};

use memo_core::{AnalysisResult, MarketSnapshot};
use memo_llm::{OpenAiConfig, OpenAiProvider};

use crate::api::{PerplexityClient, YahooMarketData};
use crate::config::EngineConfig;
use crate::market::{MarketDataFetcher, MarketDataSource};
use crate::news::{NewsFetcher, SearchBackend};
use crate::report::ReportSynthesizer;

/// One full analysis run for a ticker
///
/// Behind a trait so the event emitter can be tested against a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Run the staged analysis; total for any ticker
    async fn run(&self, ticker: &str) -> AnalysisResult;
}

/// The staged news -> market-data -> synthesis pipeline
pub struct AnalysisPipeline {
    news: NewsFetcher,
    market: MarketDataFetcher,
    report: ReportSynthesizer,
    max_news_items: usize,
    lookback_days: i64,
}

impl AnalysisPipeline {
    pub fn new(
        news: NewsFetcher,
        market: MarketDataFetcher,
        report: ReportSynthesizer,
        max_news_items: usize,
        lookback_days: i64,
    ) -> Self {
        Self {
            news,
            market,
            report,
            max_news_items,
            lookback_days,
        }
    }

    /// Wire the pipeline from configuration: live Yahoo market data,
    /// plus search/LLM capabilities for whichever credentials are
    /// present. Missing credentials select the deterministic fallbacks
    /// rather than failing construction.
    pub fn from_config(config: &EngineConfig) -> Self {
        let search: Option<Arc<dyn SearchBackend>> =
            config.perplexity_api_key.as_ref().map(|key| {
                Arc::new(PerplexityClient::new(
                    key.clone(),
                    config.search_model.clone(),
                    config.search_max_tokens,
                    config.search_temperature,
                    config.request_timeout,
                )) as Arc<dyn SearchBackend>
            });

        let provider = config.openai_api_key.as_ref().and_then(|key| {
            let llm_config =
                OpenAiConfig::new(key.clone()).with_timeout(config.request_timeout.as_secs());
            match OpenAiProvider::with_config(llm_config) {
                Ok(provider) => Some(Arc::new(provider) as Arc<dyn memo_llm::LlmProvider>),
                Err(e) => {
                    warn!("Failed to construct LLM provider: {e}. Using template reports.");
                    None
                }
            }
        });

        let source: Arc<dyn MarketDataSource> =
            Arc::new(YahooMarketData::new(config.request_timeout));

        Self::new(
            NewsFetcher::new(search, config.snippet_char_cap),
            MarketDataFetcher::new(source, config.max_bars),
            ReportSynthesizer::new(
                provider,
                config.report_model.clone(),
                config.report_max_tokens,
                config.report_temperature,
                config.prompt_char_cap,
            ),
            config.max_news_items,
            config.lookback_days,
        )
    }

    async fn run_stages(&self, ticker: &str) -> AnalysisResult {
        info!("Starting analysis for {ticker}");

        let news = self.news.fetch(ticker, self.max_news_items).await;
        let data = self.market.fetch(ticker, self.lookback_days).await;
        let report = self.report.synthesize(ticker, &news, &data).await;

        info!("Analysis completed for {ticker}");
        AnalysisResult { news, data, report }
    }
}

#[async_trait]
impl Analyzer for AnalysisPipeline {
    async fn run(&self, ticker: &str) -> AnalysisResult {
        match AssertUnwindSafe(self.run_stages(ticker)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Error in analysis for {ticker}: {message}");
                AnalysisResult {
                    news: Vec::new(),
                    data: MarketSnapshot::from_error(format!("Analysis failed: {message}")),
                    report: format!("# Analysis Error\n\nFailed to analyze {ticker}: {message}"),
                }
            }
        }
    }
}

/// Best-effort extraction of a panic payload's message
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected internal error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::market::MockMarketDataSource;
    use crate::news::MockSearchBackend;

    fn failing_pipeline() -> AnalysisPipeline {
        let mut source = MockMarketDataSource::new();
        source
            .expect_daily_history()
            .returning(|_, _| Err(EngineError::YahooFinanceError("offline".into())));

        AnalysisPipeline::new(
            NewsFetcher::new(None, 2000),
            MarketDataFetcher::new(Arc::new(source), 400),
            ReportSynthesizer::new(None, "gpt-4o-mini", 1500, 0.1, 4000),
            6,
            400,
        )
    }

    fn healthy_pipeline() -> AnalysisPipeline {
        let mut backend = MockSearchBackend::new();
        backend
            .expect_financial_news()
            .returning(|t| Ok(format!("Recent coverage of {t} was broadly positive.")));

        let mut source = MockMarketDataSource::new();
        source.expect_daily_history().returning(|_, _| {
            Ok(vec![crate::market::PriceBar {
                timestamp: 1_700_000_000,
                open: 99.0,
                high: 101.0,
                low: 98.0,
                close: 100.0,
                volume: 10_000,
            }])
        });
        source.expect_company_profile().returning(|_| {
            Ok(crate::market::CompanyProfile {
                sector: Some("Technology".to_string()),
                recommendation_key: Some("buy".to_string()),
                ..Default::default()
            })
        });

        AnalysisPipeline::new(
            NewsFetcher::new(Some(Arc::new(backend)), 2000),
            MarketDataFetcher::new(Arc::new(source), 400),
            ReportSynthesizer::new(None, "gpt-4o-mini", 1500, 0.1, 4000),
            6,
            400,
        )
    }

    #[tokio::test]
    async fn test_run_is_total_when_every_provider_fails() {
        let pipeline = failing_pipeline();

        for ticker in ["AAPL", "", "BRK.B", "NO_SUCH_SYMBOL_123", "特斯拉"] {
            let result = pipeline.run(ticker).await;
            assert_eq!(result.news.len(), 4, "ticker {ticker:?}");
            assert!(result.data.is_error());
            assert!(!result.report.is_empty());
        }
    }

    #[tokio::test]
    async fn test_run_aggregates_all_stage_outputs() {
        let pipeline = healthy_pipeline();

        let result = pipeline.run("AAPL").await;

        assert_eq!(result.news.len(), 1);
        assert!(result.news[0].snippet.contains("AAPL"));
        assert_eq!(result.data.ohlc.len(), 1);
        assert!(!result.data.is_error());
        assert!(result.report.contains("**BUY**"));
    }

    #[tokio::test]
    async fn test_runs_are_idempotent_under_fixed_providers() {
        let first = healthy_pipeline().run("AAPL").await;
        let second = healthy_pipeline().run("AAPL").await;

        assert_eq!(first.news, second.news);
        assert_eq!(first.data, second.data);
        // The template report embeds a generation timestamp; compare
        // everything above the footer.
        let strip = |report: &str| {
            report
                .lines()
                .filter(|line| !line.starts_with("*Generated on"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert_eq!(strip(&first.report), strip(&second.report));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new("boom".to_string());
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(payload.as_ref()), "unexpected internal error");
    }
}
