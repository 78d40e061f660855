use super::*;
use crate::testutil::{harness, FakeChat, FakeEmbedder};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

// ── Helpers ─────────────────────────────────────────────────────────

const BOUNDARY: &str = "docqa-test-boundary";

struct TestApp {
    router: Router,
    embedder: Arc<FakeEmbedder>,
    chat: Arc<FakeChat>,
    _dir: tempfile::TempDir,
}

fn test_app() -> TestApp {
    let h = harness();
    let state = Arc::new(AppState::new(h.orchestrator));
    TestApp {
        router: build_router(state),
        embedder: h.embedder,
        chat: h.chat,
        _dir: h.dir,
    }
}

fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn upload(app: &TestApp, path: &str, file_name: &str, content_type: &str, data: &[u8]) -> Response {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body("file", file_name, content_type, data)))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn upload_document(app: &TestApp, data: &[u8]) -> UploadResponse {
    let response = upload(app, "/api/upload-documents", "manual.pdf", "application/pdf", data).await;
    assert_eq!(response.status(), StatusCode::OK);
    json(response).await
}

async fn post_query(app: &TestApp, query: &str) -> Response {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/query")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::json!({ "query": query }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &TestApp, uri: &str, range: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(range) = range {
        builder = builder.header(header::RANGE, range);
    }
    app.router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

const MANUAL: &str = "Installation guide for the rooftop solar inverter. \
    Mount the inverter on a north facing wall away from direct sunlight and rain. \
    Keep at least thirty centimetres of clearance on every side for airflow. \
    Grounding must be completed before any DC cable is connected to the unit.";

/// 250 printable bytes.
fn ascii_payload() -> Vec<u8> {
    (0..250u32).map(|i| b'a' + (i % 26) as u8).collect()
}

// ── Upload & query ──────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_then_query_uses_uploaded_text() {
    let app = test_app();
    let uploaded = upload_document(&app, MANUAL.as_bytes()).await;
    assert!(uploaded.chunks_indexed > 0);
    assert_eq!(uploaded.message, "Document uploaded and indexed successfully");

    let response = post_query(&app, "Grounding must be completed before any DC cable is connected").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: QueryResponse = json(response).await;
    assert_eq!(body.response, "<p>fake answer</p>");

    let prompts = app.chat.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].1.contains("Grounding must be completed before any DC cable"));
}

#[tokio::test]
async fn test_blank_query_is_400_without_embedding() {
    let app = test_app();

    let response = post_query(&app, "   ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = json(response).await;
    assert_eq!(body["transient"], false);
    assert!(body["error"].as_str().unwrap().contains("empty"));

    assert_eq!(app.embedder.calls(), 0);
    assert!(app.chat.prompts().is_empty());
}

#[tokio::test]
async fn test_query_before_upload_is_409_and_server_keeps_serving() {
    let app = test_app();

    let response = post_query(&app, "what does the manual say?").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let health = get(&app, "/health", None).await;
    assert_eq!(health.status(), StatusCode::OK);
    let body: HealthResponse = json(health).await;
    assert_eq!(body.status, "ok");
    assert_eq!(body.indexed_chunks, 0);

    upload_document(&app, MANUAL.as_bytes()).await;
    assert_eq!(post_query(&app, "clearance").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_rejects_wrong_content_type() {
    let app = test_app();

    let response = upload(&app, "/api/upload-documents", "notes.txt", "text/plain", b"hello").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = upload(&app, "/api/upload-videos", "manual.pdf", "application/pdf", b"%PDF").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_without_file_field_is_400() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload-documents")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body("attachment", "a.pdf", "application/pdf", b"x")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_video_upload_and_listing() {
    let app = test_app();
    let response = upload(&app, "/api/upload-videos", "talk.mp4", "video/mp4", MANUAL.as_bytes()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let uploaded: UploadResponse = json(response).await;

    let listing: ListResponse = json(get(&app, "/api/videos", None).await).await;
    assert_eq!(listing.total, 1);
    assert_eq!(listing.page, 1);
    assert_eq!(listing.items[0].id, uploaded.id);
    assert_eq!(listing.items[0].file_name, "talk.mp4");

    let documents: ListResponse = json(get(&app, "/api/documents", None).await).await;
    assert_eq!(documents.total, 0);
}

#[tokio::test]
async fn test_listing_paginates() {
    let app = test_app();
    for _ in 0..3 {
        upload_document(&app, MANUAL.as_bytes()).await;
    }

    let page: ListResponse = json(get(&app, "/api/documents?page=2&page_size=2", None).await).await;
    assert_eq!(page.total, 3);
    assert_eq!(page.page, 2);
    assert_eq!(page.page_size, 2);
    assert_eq!(page.items.len(), 1);

    let bad = get(&app, "/api/documents?page=0", None).await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

// ── Download & view ─────────────────────────────────────────────────

#[tokio::test]
async fn test_download_is_attachment() {
    let app = test_app();
    let data = ascii_payload();
    let uploaded = upload_document(&app, &data).await;

    let response = get(&app, &format!("/api/documents/{}/download", uploaded.id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "application/pdf");
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "attachment; filename=\"manual.pdf\""
    );
    assert_eq!(body_bytes(response).await, data);
}

#[tokio::test]
async fn test_view_without_range_is_full_inline() {
    let app = test_app();
    let data = ascii_payload();
    let uploaded = upload_document(&app, &data).await;

    let response = get(&app, &format!("/api/documents/{}/view", uploaded.id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), "bytes");
    assert!(header_str(&response, header::CONTENT_DISPOSITION).starts_with("inline"));
    assert_eq!(body_bytes(response).await, data);
}

#[tokio::test]
async fn test_view_first_hundred_bytes() {
    let app = test_app();
    let data = ascii_payload();
    let uploaded = upload_document(&app, &data).await;

    let response = get(
        &app,
        &format!("/api/documents/{}/view", uploaded.id),
        Some("bytes=0-99"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 0-99/250");
    let body = body_bytes(response).await;
    assert_eq!(body.len(), 100);
    assert_eq!(body, &data[..100]);
}

#[tokio::test]
async fn test_view_open_range_and_clamping() {
    let app = test_app();
    let data = ascii_payload();
    let uploaded = upload_document(&app, &data).await;
    let uri = format!("/api/documents/{}/view", uploaded.id);

    let response = get(&app, &uri, Some("bytes=200-")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 200-249/250");
    assert_eq!(body_bytes(response).await, &data[200..]);

    let response = get(&app, &uri, Some("bytes=240-1000")).await;
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 240-249/250");
    assert_eq!(body_bytes(response).await.len(), 10);
}

#[tokio::test]
async fn test_view_range_past_end_is_416() {
    let app = test_app();
    let uploaded = upload_document(&app, &ascii_payload()).await;

    let response = get(
        &app,
        &format!("/api/documents/{}/view", uploaded.id),
        Some("bytes=250-"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes */250");
}

#[tokio::test]
async fn test_view_suffix_range_falls_back_to_full() {
    let app = test_app();
    let data = ascii_payload();
    let uploaded = upload_document(&app, &data).await;

    let response = get(
        &app,
        &format!("/api/documents/{}/view", uploaded.id),
        Some("bytes=-20"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.len(), data.len());
}

#[tokio::test]
async fn test_bad_and_unknown_ids() {
    let app = test_app();

    let response = get(&app, "/api/documents/not-a-uuid/download", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(&app, &format!("/api/videos/{}/view", uuid::Uuid::new_v4()), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = json(response).await;
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_document_id_not_served_from_videos() {
    let app = test_app();
    let uploaded = upload_document(&app, MANUAL.as_bytes()).await;

    let response = get(&app, &format!("/api/videos/{}/download", uploaded.id), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
