use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::core::store::ArtifactRef;
use crate::errors::AppError;
use crate::state::AppState;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Handler for the /api/artifacts/{id} endpoint
///
/// Serves stored narration bytes (audio or answer text) under the content
/// type they were generated with.
pub async fn get_artifact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let artifact = ArtifactRef::new(id);
    if !artifact.is_well_formed() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid artifact id"})),
        )
            .into_response();
    }

    let blob = match state.blobs().read(&artifact).await {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            return AppError::NotFound(format!("Artifact not found: {}", artifact.id()))
                .into_response();
        }
        Err(e) => {
            return AppError::InternalServerError(format!(
                "Failed to read artifact {}: {}",
                artifact.id(),
                e
            ))
            .into_response();
        }
    };

    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(&blob.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Ok(len) = HeaderValue::from_str(&blob.bytes.len().to_string()) {
        headers.insert(header::CONTENT_LENGTH, len);
    }

    (StatusCode::OK, headers, blob.bytes).into_response()
}
