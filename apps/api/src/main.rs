mod config;
mod errors;
mod extract;
mod intake;
mod llm_client;
mod models;
mod report;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, ExtractionMode};
use crate::extract::llm::LlmFieldExtractor;
use crate::extract::{FieldExtractor, HeuristicFieldExtractor};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration errors stop startup before anything else runs
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-intake v{}", env!("CARGO_PKG_VERSION"));

    let db = store::create_pool(&config.database_url).await?;
    store::migrate(&db).await?;
    info!("Database schema ready");

    let extractor = build_extractor(&config)?;
    info!("Field extractor: {}", extractor.name());

    let state = AppState {
        db,
        config: config.clone(),
        extractor,
    };

    // Local single-user tool; the review page is served from the same origin
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_extractor(config: &Config) -> Result<Arc<dyn FieldExtractor>> {
    match config.extraction_mode {
        ExtractionMode::Heuristic => Ok(Arc::new(HeuristicFieldExtractor)),
        ExtractionMode::Llm => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required when EXTRACTION_MODE=llm")?;
            let client = LlmClient::new(api_key)?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Ok(Arc::new(LlmFieldExtractor(client)))
        }
    }
}
