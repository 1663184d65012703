//! Generation clients against a local stand-in provider

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vibedj_dj::generation::{ChatCompletionClient, GeminiClient, GenerationError, GenerationService};

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(String, HeaderMap, Value)>>>,
}

/// Serve `router` on an ephemeral port and return its base URL
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn gemini_ok(
    State(captured): State<Captured>,
    Path(model_action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    captured
        .requests
        .lock()
        .unwrap()
        .push((model_action, headers, body));
    Json(json!({
        "candidates": [{"content": {"parts": [{"text": "lofi hip hop "}, {"text": "radio"}]}}]
    }))
}

async fn chat_ok(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    captured
        .requests
        .lock()
        .unwrap()
        .push(("chat".to_string(), headers, body));
    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": "synthwave night drive"}}]
    }))
}

#[tokio::test]
async fn test_gemini_request_and_response() {
    let captured = Captured::default();
    let base_url = serve(
        Router::new()
            .route("/v1beta/models/:model_action", post(gemini_ok))
            .with_state(captured.clone()),
    )
    .await;

    let client = GeminiClient::new(
        "test-key".to_string(),
        None,
        Some(base_url),
        Duration::from_secs(5),
    )
    .unwrap();

    let text = client
        .generate("Return ONLY the query.", "late night coding")
        .await
        .unwrap();
    assert_eq!(text, "lofi hip hop radio");

    let requests = captured.requests.lock().unwrap();
    let (model_action, headers, body) = &requests[0];
    assert_eq!(model_action, "gemini-pro:generateContent");
    assert_eq!(headers["x-goog-api-key"], "test-key");
    assert_eq!(
        body["contents"][0]["parts"][0]["text"],
        "Return ONLY the query. User's vibe: late night coding"
    );
}

#[tokio::test]
async fn test_chat_completion_request_and_response() {
    let captured = Captured::default();
    let base_url = serve(
        Router::new()
            .route("/chat/completions", post(chat_ok))
            .with_state(captured.clone()),
    )
    .await;

    let client = ChatCompletionClient::new(
        "sk-test".to_string(),
        Some("local-model".to_string()),
        Some(format!("{}/", base_url)),
        Duration::from_secs(5),
    )
    .unwrap();

    let text = client.generate("instruction", "night drive").await.unwrap();
    assert_eq!(text, "synthwave night drive");

    let requests = captured.requests.lock().unwrap();
    let (_, headers, body) = &requests[0];
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert_eq!(body["model"], "local-model");
    assert_eq!(body["messages"][0]["content"], "instruction");
    assert_eq!(body["messages"][1]["content"], "night drive");
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let base_url = serve(
        Router::new()
            .route(
                "/v1beta/models/:model_action",
                post(|| async { StatusCode::UNAUTHORIZED }),
            )
            .route(
                "/chat/completions",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
            ),
    )
    .await;

    let gemini = GeminiClient::new(
        "bad".to_string(),
        None,
        Some(base_url.clone()),
        Duration::from_secs(5),
    )
    .unwrap();
    assert!(matches!(
        gemini.generate("i", "v").await,
        Err(GenerationError::InvalidApiKey)
    ));

    let chat =
        ChatCompletionClient::new("k".to_string(), None, Some(base_url), Duration::from_secs(5))
            .unwrap();
    match chat.generate("i", "v").await {
        Err(GenerationError::ApiError(503, text)) => assert_eq!(text, "overloaded"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let base_url = serve(Router::new().route(
        "/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK
        }),
    ))
    .await;

    let chat = ChatCompletionClient::new(
        "k".to_string(),
        None,
        Some(base_url),
        Duration::from_millis(200),
    )
    .unwrap();
    assert!(matches!(
        chat.generate("i", "v").await,
        Err(GenerationError::Timeout)
    ));
}
