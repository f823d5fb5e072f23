use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus the size of the loaded corpus.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "mga-api",
        "corpus_chunks": state.corpus.chunks().len(),
        "format_templates": state.corpus.formats().len(),
    }))
}
