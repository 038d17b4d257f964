use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::photo::ocr::OcrEngine;
use crate::storage::ObjectStore;
use crate::video::renderer::VideoRenderer;
use crate::video::scenario::ScenarioGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// `None` when `OPENAI_API_KEY` is unset; speech synthesis then answers 503.
    pub llm: Option<LlmClient>,
    /// Template generator without an OpenAI key, LLM-backed otherwise.
    pub scenarios: Arc<dyn ScenarioGenerator>,
    /// Mock renderer without a HeyGen key.
    pub renderer: Arc<dyn VideoRenderer>,
    pub storage: Option<ObjectStore>,
    pub ocr: OcrEngine,
}
