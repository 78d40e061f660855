//! Request handlers.

use super::error::ApiError;
use super::range::ByteRange;
use super::AppState;
use crate::error::{DocqaError, Result};
use crate::storage::{FileKind, FileMeta, StoredFile};
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

type ApiResult<T> = std::result::Result<T, ApiError>;

// === Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub id: Uuid,
    pub chunks_indexed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub items: Vec<FileMeta>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub indexed_chunks: usize,
}

// === Handlers ===

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        indexed_chunks: state.orchestrator.indexed_chunks().await,
    })
}

pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    upload(state, FileKind::Document, multipart).await
}

pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    upload(state, FileKind::Video, multipart).await
}

async fn upload(
    state: Arc<AppState>,
    kind: FileKind,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DocqaError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| DocqaError::InvalidInput(format!("Failed to read upload: {}", e)))?;

        info!("Received {} upload {} ({} bytes)", kind, file_name, content.len());

        let result = state
            .orchestrator
            .ingest(kind, &file_name, &content_type, Vec::from(content))
            .await?;

        let message = match kind {
            FileKind::Document => "Document uploaded and indexed successfully",
            FileKind::Video => "Video uploaded, transcribed and indexed successfully",
        };

        return Ok(Json(UploadResponse {
            message: message.to_string(),
            id: result.id,
            chunks_indexed: result.chunks_indexed,
        }));
    }

    Err(DocqaError::InvalidInput("Missing multipart field 'file'".to_string()).into())
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<Json<QueryResponse>> {
    let response = state.orchestrator.query(&req.query).await?;
    Ok(Json(QueryResponse {
        response: response.answer,
    }))
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse>> {
    list(state, FileKind::Document, params).await
}

pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse>> {
    list(state, FileKind::Video, params).await
}

async fn list(state: Arc<AppState>, kind: FileKind, params: ListParams) -> ApiResult<Json<ListResponse>> {
    let server = &state.orchestrator.settings().server;
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(server.page_size).min(server.max_page_size);

    let result = blocking(state.clone(), move |s| s.orchestrator.list(kind, page, page_size)).await?;

    Ok(Json(ListResponse {
        items: result.items,
        total: result.total,
        page: result.page,
        page_size: result.page_size,
    }))
}

pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    download(state, FileKind::Document, &id).await
}

pub async fn download_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    download(state, FileKind::Video, &id).await
}

async fn download(state: Arc<AppState>, kind: FileKind, id: &str) -> ApiResult<Response> {
    let file = fetch(state, kind, id).await?;
    let headers = file_headers(&file, "attachment");
    Ok((StatusCode::OK, headers, Body::from(file.content)).into_response())
}

pub async fn view_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    view(state, FileKind::Document, &id, &headers).await
}

pub async fn view_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    view(state, FileKind::Video, &id, &headers).await
}

async fn view(
    state: Arc<AppState>,
    kind: FileKind,
    id: &str,
    request_headers: &HeaderMap,
) -> ApiResult<Response> {
    let range_header = request_headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let file = fetch(state.clone(), kind, id).await?;
    let size = file.content.len() as u64;
    let range = state.range_parser.resolve(range_header.as_deref(), size);

    let mut headers = file_headers(&file, "inline");

    match range {
        ByteRange::Full => Ok((StatusCode::OK, headers, Body::from(file.content)).into_response()),
        ByteRange::Partial { start, end } => {
            if let Some(value) = range
                .content_range(size)
                .and_then(|v| HeaderValue::from_str(&v).ok())
            {
                headers.insert(header::CONTENT_RANGE, value);
            }
            let mut content = file.content;
            content.truncate(end as usize + 1);
            content.drain(..start as usize);
            Ok((StatusCode::PARTIAL_CONTENT, headers, Body::from(content)).into_response())
        }
        ByteRange::Unsatisfiable => Err(DocqaError::RangeNotSatisfiable { size }.into()),
    }
}

// === Helpers ===

async fn fetch(state: Arc<AppState>, kind: FileKind, id: &str) -> Result<StoredFile> {
    let id = Uuid::parse_str(id)
        .map_err(|_| DocqaError::InvalidInput(format!("Invalid {} id: {}", kind, id)))?;
    blocking(state, move |s| s.orchestrator.get_file(kind, id)).await
}

/// Run a SQLite-bound call off the async worker threads.
async fn blocking<T, F>(state: Arc<AppState>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| DocqaError::Storage(format!("Blocking task failed: {}", e)))?
}

fn file_headers(file: &StoredFile, disposition: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = HeaderValue::from_str(&file.meta.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);

    let file_name = header_safe_file_name(&file.meta.file_name);
    if let Ok(value) = HeaderValue::from_str(&format!("{}; filename=\"{}\"", disposition, file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers
}

/// Printable-ASCII rendition of a file name for a quoted header parameter.
fn header_safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_safe_file_name() {
        assert_eq!(header_safe_file_name("report.pdf"), "report.pdf");
        assert_eq!(header_safe_file_name("my \"best\" talk.mp4"), "my _best_ talk.mp4");
        assert_eq!(header_safe_file_name("résumé.pdf"), "r_sum_.pdf");
    }
}
