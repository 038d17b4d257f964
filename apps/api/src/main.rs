mod auth;
mod config;
mod db;
mod errors;
mod exams;
mod gamification;
mod llm_client;
mod metrics;
mod models;
mod photo;
mod reflex;
mod routes;
mod state;
mod storage;
mod tutor;
mod users;
mod video;
mod vizyon;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::photo::ocr::OcrEngine;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::ObjectStore;
use crate::video::renderer::{HeyGenRenderer, MockRenderer, VideoRenderer};
use crate::video::scenario::{LlmScenarioGenerator, ScenarioGenerator, TemplateScenarioGenerator};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first; missing required env vars abort start-up
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Macigscool API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;

    let llm = match &config.openai_api_key {
        Some(key) => {
            let client = LlmClient::new(key.clone()).context("failed to build LLM client")?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(client)
        }
        None => {
            warn!("OPENAI_API_KEY not set: canned scenarios, speech synthesis disabled");
            None
        }
    };

    let scenarios: Arc<dyn ScenarioGenerator> = match &llm {
        Some(client) => Arc::new(LlmScenarioGenerator::new(client.clone())),
        None => Arc::new(TemplateScenarioGenerator),
    };

    let renderer: Arc<dyn VideoRenderer> = match &config.heygen_api_key {
        Some(key) => Arc::new(HeyGenRenderer::new(
            key.clone(),
            config.heygen_avatar_id.clone(),
            config.heygen_voice_id.clone(),
        )?),
        None => {
            warn!("HEYGEN_API_KEY not set: videos get mock render ids");
            Arc::new(MockRenderer)
        }
    };
    info!(
        "Video pipeline: scenario={}, renderer={}",
        scenarios.backend(),
        renderer.backend()
    );

    let storage = match &config.s3 {
        Some(s3) => {
            let store = ObjectStore::connect(s3).await?;
            info!("S3 mirror enabled (bucket: {})", s3.bucket);
            Some(store)
        }
        None => None,
    };

    let state = AppState {
        db,
        llm,
        scenarios,
        renderer,
        storage,
        ocr: OcrEngine::new(config.tesseract_cmd.clone()),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &Config) -> Result<CorsLayer> {
    if config.cors_is_permissive() {
        return Ok(CorsLayer::permissive());
    }
    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
