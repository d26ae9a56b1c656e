use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::get,
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use cicerone::core::tier::TierVoices;
use cicerone::{ServiceConfig, routes, state::AppState};

fn test_config() -> ServiceConfig {
    ServiceConfig {
        host: "127.0.0.1".to_string(),
        port: 3001,
        public_base_url: "http://localhost:3001".to_string(),
        speech_api_key: None,
        speech_base_url: "https://api.elevenlabs.io/v1/text-to-speech".to_string(),
        speech_model: "eleven_v3".to_string(),
        speech_output_format: "mp3_44100_128".to_string(),
        answer_api_key: None,
        answer_base_url: "https://api.openai.com/v1".to_string(),
        answer_model: "gpt-4o-mini".to_string(),
        answer_max_tokens: 512,
        request_timeout_seconds: 5,
        retry_max_retries: 2,
        retry_base_delay_ms: 10,
        max_text_len: 5000,
        safe_truncate_len: 4500,
        answers_per_minute: 5,
        answers_per_hour: 30,
        answers_per_day: 100,
        speech_per_minute: 10,
        speech_per_hour: 50,
        voices: TierVoices::default(),
        data_path: None,
    }
}

async fn test_app(config: ServiceConfig) -> Router {
    let app_state = AppState::new(config).await.unwrap();

    Router::new()
        .route("/api/health", get(cicerone::handlers::api::health_check))
        .merge(routes::api::create_api_router())
        .with_state(app_state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app(test_config()).await;

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "OK");
}

#[tokio::test]
async fn test_narrate_rejects_empty_text() {
    let app = test_app(test_config()).await;

    let request_body = json!({
        "key": "appraiser:zone-9",
        "tier": "appraiser",
        "text": ""
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/narrate")
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Text cannot be empty");
}

#[tokio::test]
async fn test_narrate_rejects_empty_key() {
    let app = test_app(test_config()).await;

    let request_body = json!({
        "key": "  ",
        "tier": "appraiser",
        "text": "The harbor district."
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/narrate")
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Narration key cannot be empty");
}

#[tokio::test]
async fn test_narrate_rejects_unknown_tier() {
    let app = test_app(test_config()).await;

    let request_body = json!({
        "key": "alto:zone-1",
        "tier": "alto",
        "text": "The harbor district."
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/narrate")
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Unknown tier"));
}

#[tokio::test]
async fn test_narrate_without_provider_degrades_to_null() {
    // No SPEECH_API_KEY configured: generation fails softly, never a 5xx.
    let app = test_app(test_config()).await;

    let request_body = json!({
        "key": "appraiser:zone-1",
        "tier": "appraiser",
        "text": "The harbor district."
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/narrate")
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["artifact"].is_null());
}

#[tokio::test]
async fn test_lookup_unknown_key_returns_null() {
    let app = test_app(test_config()).await;

    let request = Request::builder()
        .uri("/api/narration/appraiser:zone-404")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["artifact"].is_null());
}

#[tokio::test]
async fn test_artifact_unknown_returns_404() {
    let app = test_app(test_config()).await;

    let request = Request::builder()
        .uri("/api/artifacts/00112233445566778899aabbccddeeff")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_artifact_rejects_malformed_id() {
    let app = test_app(test_config()).await;

    let request = Request::builder()
        .uri("/api/artifacts/not-a-hash")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid artifact id");
}

#[tokio::test]
async fn test_answer_rejects_empty_messages() {
    let app = test_app(test_config()).await;

    let request_body = json!({
        "key": "chat:q-1",
        "context": "Zone 7 holds the reliquary.",
        "messages": []
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/answer")
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Messages cannot be empty");
}
