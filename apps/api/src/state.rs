use std::sync::Arc;

use crate::llm_client::Inference;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Model backend. `LlmClient` in production, a stub in tests.
    pub llm: Arc<dyn Inference>,
}
