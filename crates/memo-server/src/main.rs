//! Streaming HTTP API for memo-rs
//!
//! Exposes the analysis pipeline over three routes: a server-sent-events
//! stream that relays pipeline progress incrementally, a health probe,
//! and a root banner.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use memo_engine::{AnalysisPipeline, EngineConfig, EventEmitter};

mod routes;

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before anything reads credentials
    dotenvy::dotenv().ok();
    memo_core::logging::init_tracing();

    let config = EngineConfig::default().with_env_keys();
    config.validate()?;

    let pipeline = AnalysisPipeline::from_config(&config);
    let emitter = Arc::new(EventEmitter::new(Arc::new(pipeline)));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Equity memo API listening on {addr}");

    axum::serve(listener, routes::router(emitter)).await?;
    Ok(())
}
