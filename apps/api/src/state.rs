use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::speech::SpeechRecognizer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    /// Pluggable speech backend. Default: HTTP recognizer against SPEECH_API_URL.
    pub speech: Arc<dyn SpeechRecognizer>,
    pub config: Config,
}
