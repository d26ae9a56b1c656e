use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::narration::NarrationPayload;
use crate::core::provider::ChatMessage;
use crate::core::tier::Tier;
use crate::handlers::narrate::artifact_body;
use crate::state::AppState;

/// Request body for the answer endpoint
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// Stable narration key, by convention `chat:<message-id>`
    pub key: String,
    /// Editorial context the answer should draw on
    pub context: String,
    /// Conversation so far, newest message last
    pub messages: Vec<ChatMessage>,
    /// Session identifier used as the admission subject
    pub session: Option<String>,
}

fn build_preamble(context: &str) -> String {
    format!(
        "You are the narrator of a story atlas. Answer the visitor's question \
         in two or three spoken-style sentences, drawing only on this context:\n\n{context}"
    )
}

/// Handler for the /api/answer endpoint
///
/// Produces a conversational answer for a key (or replays a cached one) and
/// returns both the answer text and the artifact it is stored under. Both
/// fields are `null` when the answer is unavailable.
pub async fn answer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnswerRequest>,
) -> Response {
    if request.key.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Answer key cannot be empty"})),
        )
            .into_response();
    }
    if request.messages.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Messages cannot be empty"})),
        )
            .into_response();
    }
    let session = request.session.as_deref().unwrap_or("anonymous");

    info!(
        "Answer request - key: {}, messages: {}",
        request.key,
        request.messages.len()
    );

    let artifact = state
        .narration()
        .generate(
            &request.key,
            Tier::Chat,
            NarrationPayload::Answer {
                preamble: build_preamble(&request.context),
                messages: request.messages.clone(),
            },
            session,
        )
        .await;

    // The answer artifact is plain UTF-8 text; read it back for the reply.
    let answer = match &artifact {
        Some(artifact) => match state.blobs().read(artifact).await {
            Ok(Some(blob)) => String::from_utf8(blob.bytes.to_vec()).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read answer artifact {}: {}", artifact.id(), e);
                None
            }
        },
        None => None,
    };

    let mut body = artifact_body(&state, artifact);
    body["answer"] = json!(answer);
    Json(body).into_response()
}
