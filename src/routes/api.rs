use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{answer, artifacts, narrate};
use crate::state::AppState;
use std::sync::Arc;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/narrate", post(narrate::narrate_handler))
        .route("/api/narration/{key}", get(narrate::lookup_narration))
        .route("/api/answer", post(answer::answer_handler))
        .route("/api/artifacts/{id}", get(artifacts::get_artifact))
        .layer(TraceLayer::new_for_http())
}
