mod archive;
mod config;
mod corpus;
mod errors;
mod formulation;
mod llm_client;
mod normalizer;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::corpus::retrieval::KeywordRetriever;
use crate::corpus::CorpusSnapshot;
use crate::llm_client::LlmClient;
use crate::normalizer::ResponseNormalizer;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MGA API v{}", env!("CARGO_PKG_VERSION"));

    // Load the reference corpus once; PDF extraction is blocking
    let data_dir = config.data_dir.clone();
    let chunking = config.chunking;
    let corpus = tokio::task::spawn_blocking(move || CorpusSnapshot::load(&data_dir, chunking))
        .await
        .context("Corpus loading task panicked")??;
    if corpus.is_empty() {
        info!(
            "Corpus under {} is empty; prompts will carry no reference passages",
            config.data_dir.display()
        );
    }

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let normalizer = ResponseNormalizer::new(config.no_payload_policy);
    info!("Response normalizer policy: {:?}", normalizer.policy());

    // Build app state
    let state = AppState {
        config: config.clone(),
        generator: Arc::new(llm),
        retriever: Arc::new(KeywordRetriever),
        corpus: Arc::new(corpus),
        normalizer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the form is served from a fixed domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
