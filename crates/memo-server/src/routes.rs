//! HTTP routes
//!
//! `/api/stream` relays the pipeline's progress events as one SSE
//! frame per event, in emission order, and closes the stream after the
//! terminal `done` or `error` event. The other two routes are a health
//! probe and a root banner.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::{self, HeaderName};
use axum::response::sse::{Event, Sse};
use axum::response::{AppendHeaders, IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use futures::{stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use memo_engine::EventEmitter;

/// Sources consulted when the caller does not narrow the search
const DEFAULT_SITES: [&str; 4] = [
    "sec.gov",
    "investor.gov",
    "finance.yahoo.com",
    "marketwatch.com",
];

#[derive(Clone)]
struct AppState {
    emitter: Arc<EventEmitter>,
}

pub fn router(emitter: Arc<EventEmitter>) -> Router {
    Router::new()
        .route("/api/stream", get(stream_analysis))
        .route("/api/health", get(health))
        .route("/", get(root))
        .layer(CorsLayer::very_permissive())
        .with_state(AppState { emitter })
}

#[derive(Deserialize)]
struct StreamQuery {
    ticker: String,
    /// Comma-separated site filter; defaults to the reliable public
    /// financial sources
    sites: Option<String>,
}

async fn stream_analysis(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> impl IntoResponse {
    let sites = parse_sites(query.sites.as_deref());
    info!(
        "Starting stream analysis for ticker: {} (sites: {})",
        query.ticker,
        sites.join(", ")
    );

    let rx = state.emitter.stream(query.ticker);
    let frames = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    })
    .filter_map(|event| async move {
        match serde_json::to_string(&event) {
            Ok(payload) => Some(Ok::<_, Infallible>(Event::default().data(payload))),
            Err(e) => {
                error!("Failed to serialize progress event: {e}");
                None
            }
        }
    });

    (
        AppendHeaders([
            (header::CACHE_CONTROL, "no-cache"),
            // Disable proxy buffering so frames reach the client promptly
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ]),
        Sse::new(frames),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"ok": true}))
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({"message": "Equity Memo API", "status": "running"}))
}

fn parse_sites(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => {
            raw.split(',').map(|s| s.trim().to_string()).collect()
        }
        _ => DEFAULT_SITES.iter().map(|s| (*s).to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use memo_core::{AnalysisResult, MarketSnapshot, NewsItem};
    use memo_engine::Analyzer;
    use serde_json::Value;
    use tower::util::ServiceExt;

    struct StubAnalyzer(AnalysisResult);

    #[async_trait::async_trait]
    impl Analyzer for StubAnalyzer {
        async fn run(&self, _ticker: &str) -> AnalysisResult {
            self.0.clone()
        }
    }

    fn test_router() -> Router {
        let analyzer = StubAnalyzer(AnalysisResult {
            news: vec![NewsItem::new(
                "AAPL - Recent Earnings Report",
                "https://example.com",
                "snippet",
            )],
            data: MarketSnapshot::default(),
            report: "# AAPL memo".to_string(),
        });
        router(Arc::new(EventEmitter::new(Arc::new(analyzer))))
    }

    async fn body_json(body: Body) -> Value {
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_root_banner() {
        let response = test_router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["status"], "running");
    }

    #[tokio::test]
    async fn test_stream_requires_ticker() {
        let response = test_router()
            .oneshot(Request::get("/api/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stream_emits_ordered_sse_frames() {
        let response = test_router()
            .oneshot(
                Request::get("/api/stream?ticker=AAPL")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/event-stream")
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();

        let kinds: Vec<String> = body
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .map(|payload| {
                let value: Value = serde_json::from_str(payload).unwrap();
                value["event"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(
            kinds,
            [
                "status",
                "status",
                "news",
                "status",
                "data_summary",
                "report",
                "done"
            ]
        );
    }

    #[test]
    fn test_parse_sites_defaults_when_absent_or_blank() {
        assert_eq!(parse_sites(None), DEFAULT_SITES);
        assert_eq!(parse_sites(Some("  ")), DEFAULT_SITES);
    }

    #[test]
    fn test_parse_sites_splits_and_trims() {
        assert_eq!(
            parse_sites(Some("sec.gov, reuters.com")),
            ["sec.gov", "reuters.com"]
        );
    }
}
