//! Incremental event emission for an analysis run
//!
//! Drives an [`Analyzer`] and emits the ordered progress sequence over
//! a channel. The success sequence is fixed; any panic while driving
//! is caught and replaced by a single terminal `error` event, so a
//! consumer never sees a hung or half-finished stream without a
//! terminal marker.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{error, info};

use memo_core::ProgressEvent;

use crate::pipeline::{Analyzer, panic_message};

const CHANNEL_CAPACITY: usize = 32;

/// Turns one analysis run into an ordered stream of progress events
pub struct EventEmitter {
    analyzer: Arc<dyn Analyzer>,
}

impl EventEmitter {
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self { analyzer }
    }

    /// Start a run for `ticker` and return the receiving end of its
    /// event sequence. The run executes on a background task; dropping
    /// the receiver stops emission at the next send.
    pub fn stream(&self, ticker: impl Into<String>) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let analyzer = Arc::clone(&self.analyzer);
        let ticker = ticker.into();

        tokio::spawn(async move {
            let run = emit_run(analyzer.as_ref(), &ticker, &tx);
            if let Err(panic) = AssertUnwindSafe(run).catch_unwind().await {
                let message = panic_message(panic.as_ref());
                error!("Error in stream analysis for {ticker}: {message}");
                let _ = tx.send(ProgressEvent::error(message)).await;
            }
        });

        rx
    }
}

async fn emit_run(analyzer: &dyn Analyzer, ticker: &str, tx: &mpsc::Sender<ProgressEvent>) {
    if tx
        .send(ProgressEvent::status(format!(
            "Starting analysis for {ticker}"
        )))
        .await
        .is_err()
    {
        return;
    }

    info!("Starting search phase for {ticker}");
    if tx
        .send(ProgressEvent::status("Searching recent filings/news..."))
        .await
        .is_err()
    {
        return;
    }

    let result = analyzer.run(ticker).await;

    info!("Found {} news items for {ticker}", result.news.len());
    for item in result.news {
        if tx.send(ProgressEvent::News(item)).await.is_err() {
            return;
        }
    }

    if tx
        .send(ProgressEvent::status("Fetched market data"))
        .await
        .is_err()
    {
        return;
    }
    if tx
        .send(ProgressEvent::DataSummary(result.data.summary))
        .await
        .is_err()
    {
        return;
    }

    info!("Emitting final report for {ticker}");
    if tx
        .send(ProgressEvent::Report {
            markdown: result.report,
        })
        .await
        .is_err()
    {
        return;
    }

    let _ = tx.send(ProgressEvent::Done { ok: true }).await;
    info!("Analysis completed for {ticker}, terminating stream");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::MockAnalyzer;
    use memo_core::{AnalysisResult, MarketSnapshot, NewsItem};

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            news: vec![
                NewsItem::new("AAPL - Recent Earnings Report", "https://example.com/1", "s1"),
                NewsItem::new("AAPL - Market Analysis", "https://example.com/2", "s2"),
            ],
            data: MarketSnapshot::default(),
            report: "# AAPL memo".to_string(),
        }
    }

    async fn collect(mut rx: mpsc::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_success_sequence_is_ordered_and_terminated() {
        let mut analyzer = MockAnalyzer::new();
        analyzer.expect_run().returning(|_| sample_result());
        let emitter = EventEmitter::new(Arc::new(analyzer));

        let events = collect(emitter.stream("AAPL")).await;

        let kinds: Vec<&str> = events.iter().map(ProgressEvent::kind).collect();
        assert_eq!(
            kinds,
            [
                "status",
                "status",
                "news",
                "news",
                "status",
                "data_summary",
                "report",
                "done"
            ]
        );
        assert_eq!(
            events[0],
            ProgressEvent::status("Starting analysis for AAPL")
        );
        assert_eq!(
            events[1],
            ProgressEvent::status("Searching recent filings/news...")
        );
        assert_eq!(events[4], ProgressEvent::status("Fetched market data"));
        assert_eq!(*events.last().unwrap(), ProgressEvent::Done { ok: true });
    }

    #[tokio::test]
    async fn test_news_events_preserve_fetch_order() {
        let mut analyzer = MockAnalyzer::new();
        analyzer.expect_run().returning(|_| sample_result());
        let emitter = EventEmitter::new(Arc::new(analyzer));

        let events = collect(emitter.stream("AAPL")).await;

        let titles: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::News(item) => Some(item.title.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            titles,
            ["AAPL - Recent Earnings Report", "AAPL - Market Analysis"]
        );
    }

    #[tokio::test]
    async fn test_empty_news_skips_news_events() {
        let mut analyzer = MockAnalyzer::new();
        analyzer.expect_run().returning(|_| AnalysisResult {
            news: vec![],
            data: MarketSnapshot::from_error("Failed to fetch data for X: offline"),
            report: "# X memo".to_string(),
        });
        let emitter = EventEmitter::new(Arc::new(analyzer));

        let events = collect(emitter.stream("X")).await;

        let kinds: Vec<&str> = events.iter().map(ProgressEvent::kind).collect();
        assert_eq!(
            kinds,
            ["status", "status", "status", "data_summary", "report", "done"]
        );
    }

    #[tokio::test]
    async fn test_panic_yields_prefix_then_single_error() {
        let mut analyzer = MockAnalyzer::new();
        analyzer
            .expect_run()
            .returning(|_| panic!("emitter defect"));
        let emitter = EventEmitter::new(Arc::new(analyzer));

        let events = collect(emitter.stream("AAPL")).await;

        let kinds: Vec<&str> = events.iter().map(ProgressEvent::kind).collect();
        assert_eq!(kinds, ["status", "status", "error"]);
        assert_eq!(events[2], ProgressEvent::error("emitter defect"));
    }

    #[tokio::test]
    async fn test_data_summary_carries_snapshot_summary() {
        let mut analyzer = MockAnalyzer::new();
        analyzer.expect_run().returning(|_| AnalysisResult {
            news: vec![],
            data: MarketSnapshot::from_error("Failed to fetch data for Z: offline"),
            report: "# Z memo".to_string(),
        });
        let emitter = EventEmitter::new(Arc::new(analyzer));

        let events = collect(emitter.stream("Z")).await;

        let summary = events
            .iter()
            .find_map(|e| match e {
                ProgressEvent::DataSummary(summary) => Some(summary),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            summary.get("error").and_then(|v| v.as_str()),
            Some("Failed to fetch data for Z: offline")
        );
    }
}
