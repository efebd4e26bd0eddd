//! HTTP-level tests for the `/api/ehr` routes.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`, backed
//! by the in-memory repository, a `sh -c` extractor and the mock summary
//! backend.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use pathnote_api::{build_router, AppState, ServerConfig};
use pathnote_db::InMemoryClinicalNoteRepository;
use pathnote_inference::MockSummaryBackend;
use pathnote_ingest::{ExtractionOrchestrator, ExtractorConfig, IngestionConfig};

const BOUNDARY: &str = "pathnote-test-boundary";

struct TestApp {
    router: Router,
    summary: MockSummaryBackend,
    _staging: tempfile::TempDir,
}

fn app(script: &str) -> TestApp {
    app_with_summary(script, MockSummaryBackend::new().with_response("Stage III."))
}

fn app_with_summary(script: &str, summary: MockSummaryBackend) -> TestApp {
    let staging = tempfile::tempdir().unwrap();
    let extractor = ExtractorConfig::default()
        .with_command("sh", vec!["-c".to_string(), script.to_string()])
        .with_timeout(Duration::from_secs(10))
        .with_staging_dir(staging.path());
    let state = AppState::new(
        ExtractionOrchestrator::from_config(&extractor),
        Arc::new(InMemoryClinicalNoteRepository::new()),
        IngestionConfig::default().with_require_metadata(true),
        Arc::new(summary.clone()),
    );
    TestApp {
        router: build_router(state, &ServerConfig::default()),
        summary,
        _staging: staging,
    }
}

fn printing(json: &str) -> String {
    format!("cat <<'EOF'\n{}\nEOF", json)
}

const EXTRACTED: &str =
    r#"{"Tumor Size": "3.2 cm", "pT Stage": "pT3", "Specimen Length": "25 cm"}"#;

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/ehr/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(fields, file)))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn upload(router: &Router, patient: &str, doctor: &str) -> Value {
    let (status, body) = send(
        router,
        upload_request(
            &[("patient_name", patient), ("user_id", doctor)],
            Some(("report.pdf", b"%PDF-1.7 report")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
    body["note"].clone()
}

#[tokio::test]
async fn test_upload_stores_extracted_note() {
    let app = app(&printing(EXTRACTED));

    let (status, body) = send(
        &app.router,
        upload_request(
            &[("patient_name", "Jane Roe"), ("user_id", "dr-42")],
            Some(("report.pdf", b"%PDF-1.7 report")),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Note saved");
    let note = &body["note"];
    assert_eq!(note["patient_name"], "Jane Roe");
    assert_eq!(note["doctor_id"], "dr-42");
    assert_eq!(note["status"], "draft");
    assert_eq!(note["tumor"]["size_cm"], "3.2 cm");
    assert_eq!(note["staging"]["pT"], "pT3");
    assert_eq!(note["specimen"]["length_cm"], 25.0);
    assert!(note["id"].is_string());
}

#[tokio::test]
async fn test_upload_without_file_is_bad_request() {
    let app = app(&printing(EXTRACTED));

    let (status, body) = send(
        &app.router,
        upload_request(&[("patient_name", "Jane Roe"), ("user_id", "dr-42")], None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn test_upload_without_metadata_is_bad_request() {
    let app = app(&printing(EXTRACTED));

    let (status, body) = send(
        &app.router,
        upload_request(&[], Some(("report.pdf", b"%PDF-1.7 report"))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn test_extractor_failure_is_bad_gateway() {
    let app = app("echo 'corrupt file' >&2; exit 1");

    let (status, body) = send(
        &app.router,
        upload_request(
            &[("patient_name", "Jane Roe"), ("user_id", "dr-42")],
            Some(("report.pdf", b"%PDF-1.7 report")),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "extraction_process");
    assert!(body["detail"].as_str().unwrap().contains("corrupt file"));
}

#[tokio::test]
async fn test_malformed_output_returns_raw_output() {
    let app = app("echo 'Traceback (most recent call last)'");

    let (status, body) = send(
        &app.router,
        upload_request(
            &[("patient_name", "Jane Roe"), ("user_id", "dr-42")],
            Some(("report.pdf", b"%PDF-1.7 report")),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "malformed_output");
    assert!(body["raw_output"]
        .as_str()
        .unwrap()
        .contains("Traceback"));

    let (_, list) = send(&app.router, get("/api/ehr")).await;
    assert_eq!(list["notes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_get_update_delete_round() {
    let app = app(&printing(EXTRACTED));
    let note = upload(&app.router, "Jane Roe", "dr-42").await;
    let id = note["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app.router, get(&format!("/api/ehr/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note"]["id"], id.as_str());

    let (status, body) = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/api/ehr/{}", id),
            serde_json::json!({"status": "finalized"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "finalized");
    assert_eq!(body["patient_name"], "Jane Roe");

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/ehr/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Note deleted successfully");

    let (status, _) = send(&app.router, get(&format!("/api/ehr/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_with_empty_body_is_bad_request() {
    let app = app(&printing(EXTRACTED));
    let note = upload(&app.router, "Jane Roe", "dr-42").await;
    let id = note["id"].as_str().unwrap();

    let (status, body) = send(
        &app.router,
        json_request("PATCH", &format!("/api/ehr/{}", id), serde_json::json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing updates");
}

#[tokio::test]
async fn test_unknown_and_invalid_ids() {
    let app = app(&printing(EXTRACTED));

    let (status, body) = send(&app.router, get(&format!("/api/ehr/{}", uuid::Uuid::nil()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, _) = send(&app.router, get("/api/ehr/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/ehr/{}", uuid::Uuid::nil()))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_by_user_filters_and_orders_newest_first() {
    let app = app(&printing(EXTRACTED));
    let first = upload(&app.router, "Jane Roe", "dr-42").await;
    upload(&app.router, "John Doe", "dr-7").await;
    let third = upload(&app.router, "Ann Poe", "dr-42").await;

    let (status, body) = send(&app.router, get("/api/ehr/user/dr-42")).await;
    assert_eq!(status, StatusCode::OK);
    let notes = body["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0]["id"], third["id"]);
    assert_eq!(notes[1]["id"], first["id"]);

    let (_, all) = send(&app.router, get("/api/ehr?limit=2")).await;
    assert_eq!(all["notes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_generate_summary() {
    let app = app(&printing(EXTRACTED));

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/ehr/generate-summary",
            serde_json::json!({"prompt": "Summarize pT3 N0"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Stage III.");
    assert_eq!(app.summary.prompts(), vec!["Summarize pT3 N0".to_string()]);
}

#[tokio::test]
async fn test_generate_summary_rejects_missing_prompt() {
    let app = app(&printing(EXTRACTED));

    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/ehr/generate-summary", serde_json::json!({"text": "x"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing or invalid 'prompt' field");
    assert!(app.summary.prompts().is_empty());
}

#[tokio::test]
async fn test_generate_summary_backend_failure_is_bad_gateway() {
    let app = app_with_summary(
        &printing(EXTRACTED),
        MockSummaryBackend::new().failing("model not loaded"),
    );

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/ehr/generate-summary",
            serde_json::json!({"prompt": "Summarize"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "summary");
}

#[tokio::test]
async fn test_health_reports_components() {
    let app = app(&printing(EXTRACTED));

    let (status, body) = send(&app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["storage"], "connected");
    assert_eq!(body["components"]["extractor"], "connected");
}

#[tokio::test]
async fn test_health_degraded_when_summary_down() {
    let app = app_with_summary(&printing(EXTRACTED), MockSummaryBackend::new().failing("down"));

    let (status, body) = send(&app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["summary"], "disconnected");
}

#[tokio::test]
async fn test_request_id_header_is_set() {
    let app = app(&printing(EXTRACTED));

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let app = app(&printing(EXTRACTED));

    let (status, body) = send(&app.router, get("/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/ehr/upload"].is_object());
    assert!(body["paths"]["/api/ehr/{id}"]["patch"].is_object());
}
