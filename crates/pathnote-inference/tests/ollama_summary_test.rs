//! Ollama summary backend tests against a mock HTTP server.

use std::time::Duration;

use pathnote_inference::{OllamaSummaryBackend, SummaryBackend, SummaryConfig};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> OllamaSummaryBackend {
    OllamaSummaryBackend::new(
        SummaryConfig::default()
            .with_base_url(server.uri())
            .with_model("llama3")
            .with_timeout(Duration::from_secs(5)),
    )
}

#[tokio::test]
async fn test_summarize_posts_non_streaming_generate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({
            "model": "llama3",
            "prompt": "Summarize: pT3 N0 adenocarcinoma",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "llama3",
            "created_at": "2025-03-14T09:30:00Z",
            "response": "Locally advanced tumor without nodal spread.",
            "done": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let summary = backend(&mock_server)
        .summarize("Summarize: pT3 N0 adenocarcinoma")
        .await
        .unwrap();

    assert_eq!(summary.response, "Locally advanced tumor without nodal spread.");
    assert_eq!(summary.model, "llama3");
}

#[tokio::test]
async fn test_summarize_maps_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
        .mount(&mock_server)
        .await;

    let err = backend(&mock_server).summarize("Summarize").await.unwrap_err();

    assert_eq!(err.kind(), "summary");
    assert!(err.to_string().contains("model not found"));
}

#[tokio::test]
async fn test_summarize_rejects_unexpected_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"done": true})))
        .mount(&mock_server)
        .await;

    let err = backend(&mock_server).summarize("Summarize").await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse response"));
}

#[tokio::test]
async fn test_health_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
        .mount(&mock_server)
        .await;

    assert!(backend(&mock_server).health_check().await.unwrap());
}

#[tokio::test]
async fn test_health_check_unreachable() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    drop(mock_server);

    let backend = OllamaSummaryBackend::new(SummaryConfig::default().with_base_url(uri));
    assert!(!backend.health_check().await.unwrap());
}
