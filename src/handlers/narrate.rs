use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::core::narration::NarrationPayload;
use crate::core::store::ArtifactRef;
use crate::core::tier::Tier;
use crate::state::AppState;

/// Request body for the narrate endpoint
#[derive(Debug, Deserialize)]
pub struct NarrateRequest {
    /// Stable narration key, by convention `<tier>:<content-id>`
    pub key: String,
    /// Narration tier: narrator, appraiser or chat
    pub tier: String,
    /// Editorial text to speak
    pub text: String,
    /// Session identifier used as the admission subject
    pub session: Option<String>,
}

/// JSON body shared by the narrate and lookup responses.
///
/// A missing artifact is `{"artifact": null}` regardless of whether the
/// cause was admission, a provider failure or simply an unknown key.
pub(crate) fn artifact_body(state: &AppState, artifact: Option<ArtifactRef>) -> Value {
    match artifact {
        Some(artifact) => json!({
            "artifact": {
                "id": artifact.id(),
                "url": state.narration().resolve_url(&artifact),
            }
        }),
        None => json!({ "artifact": null }),
    }
}

/// Handler for the /api/narrate endpoint
///
/// Generates (or replays from cache) spoken narration for a key and returns
/// the artifact reference, or `null` when narration is unavailable.
pub async fn narrate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NarrateRequest>,
) -> Response {
    if request.key.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Narration key cannot be empty"})),
        )
            .into_response();
    }
    if request.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Text cannot be empty"})),
        )
            .into_response();
    }
    let tier = match request.tier.parse::<Tier>() {
        Ok(tier) => tier,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": e}))).into_response();
        }
    };
    let session = request.session.as_deref().unwrap_or("anonymous");

    info!(
        "Narrate request - key: {}, tier: {}, text length: {}",
        request.key,
        tier,
        request.text.len()
    );

    let artifact = state
        .narration()
        .generate(
            &request.key,
            tier,
            NarrationPayload::Speech { text: request.text },
            session,
        )
        .await;

    Json(artifact_body(&state, artifact)).into_response()
}

/// Handler for the /api/narration/{key} endpoint
///
/// Pure cache probe for reactive polling: never generates and never counts
/// against any admission limit.
pub async fn lookup_narration(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    let artifact = state.narration().lookup(&key).await;
    Json(artifact_body(&state, artifact)).into_response()
}
