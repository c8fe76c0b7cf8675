//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::server::AppState;
use crate::dashboard::Dashboard;
use crate::error::{DashError, ErrorKind};
use crate::export::{CSV_CONTENT_TYPE, EXPORT_FILE_NAME};
use crate::ingest;
use crate::session::{upload_digest, SessionSummary, UploadOutcome};

/// Multipart field carrying the workbook
pub const UPLOAD_FIELD: &str = "file";

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error returned from a handler, rendered as an `ApiResponse` with a status
/// code matching the error kind.
#[derive(Debug)]
pub struct ApiError(pub DashError);

impl From<DashError> for ApiError {
    fn from(err: DashError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match (&self.0, self.0.kind()) {
            (DashError::NoTable, _) => StatusCode::CONFLICT,
            (_, ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            (_, ErrorKind::Parse) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::Validation) => StatusCode::UNPROCESSABLE_ENTITY,
            (_, ErrorKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        (status, Json(ApiResponse::<()>::err(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(method: &str, path: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Citystats API Server".to_string(),
        version: state.version.clone(),
        description: "Filter, summarize and export yearly values per city".to_string(),
        endpoints: vec![
            EndpointInfo::new("GET", "/health", "Health check endpoint"),
            EndpointInfo::new("GET", "/version", "Get server version"),
            EndpointInfo::new("POST", "/api/v1/sessions", "Create a session"),
            EndpointInfo::new("GET", "/api/v1/sessions/:id", "Session parameters"),
            EndpointInfo::new("DELETE", "/api/v1/sessions/:id", "Drop a session"),
            EndpointInfo::new(
                "POST",
                "/api/v1/sessions/:id/upload",
                "Upload an .xlsx workbook (multipart field 'file')",
            ),
            EndpointInfo::new("PUT", "/api/v1/sessions/:id/columns", "Select columns"),
            EndpointInfo::new("PUT", "/api/v1/sessions/:id/threshold", "Set Valor threshold"),
            EndpointInfo::new("PUT", "/api/v1/sessions/:id/city", "Select city"),
            EndpointInfo::new(
                "GET",
                "/api/v1/sessions/:id/dashboard",
                "Filtered view, aggregates and charts",
            ),
            EndpointInfo::new(
                "GET",
                "/api/v1/sessions/:id/export",
                "Download selected columns as CSV",
            ),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        sessions: state.sessions.len(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: ["upload", "filter", "aggregate", "export"]
            .iter()
            .map(|f| f.to_string())
            .collect(),
    }))
}

/// POST /api/v1/sessions - Create a session
pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(ApiResponse::ok(state.sessions.create())),
    )
}

/// GET /api/v1/sessions/:id - Session parameters and table shape
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionSummary> {
    let summary = state.sessions.with_session(id, |s| Ok(s.summary()))?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// Delete response
#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: String,
}

/// DELETE /api/v1/sessions/:id - Drop a session
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeleteResponse> {
    if !state.sessions.remove(id) {
        return Err(DashError::SessionNotFound(id).into());
    }
    Ok(Json(ApiResponse::ok(DeleteResponse {
        deleted: true,
        id: id.to_string(),
    })))
}

/// Upload response
#[derive(Serialize)]
pub struct UploadResponse {
    pub outcome: UploadOutcome,
    pub session: SessionSummary,
}

/// POST /api/v1/sessions/:id/upload - Load a workbook into the session
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DashError::Parse(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| DashError::Parse(format!("Failed to read upload: {}", e)))?;
            if !bytes.is_empty() {
                file_data = Some(bytes.to_vec());
            }
        }
    }

    let Some(bytes) = file_data else {
        let session = state.sessions.with_session(id, |s| Ok(s.summary()))?;
        return Ok(Json(ApiResponse::ok(UploadResponse {
            outcome: UploadOutcome::NoFile,
            session,
        })));
    };

    let digest = upload_digest(&bytes);
    if let Some(session) = state
        .sessions
        .with_session(id, |s| Ok(s.is_current(digest).then(|| s.summary())))?
    {
        return Ok(Json(ApiResponse::ok(UploadResponse {
            outcome: UploadOutcome::Unchanged,
            session,
        })));
    }

    // Parse off the async workers and without holding the session lock
    let table = tokio::task::spawn_blocking(move || ingest::load_bytes(&bytes))
        .await
        .map_err(|e| DashError::Internal(format!("Upload parser failed: {}", e)))??;

    let response = state.sessions.with_session_mut(id, |session| {
        let outcome = session.install_upload(table, digest);
        Ok(UploadResponse {
            outcome,
            session: session.summary(),
        })
    })?;
    Ok(Json(ApiResponse::ok(response)))
}

/// Column selection request
#[derive(Deserialize)]
pub struct ColumnsRequest {
    pub columns: Vec<String>,
}

/// PUT /api/v1/sessions/:id/columns - Select columns
pub async fn set_columns(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ColumnsRequest>,
) -> ApiResult<SessionSummary> {
    let summary = state.sessions.with_session_mut(id, |session| {
        session.select_columns(&req.columns)?;
        Ok(session.summary())
    })?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// Threshold request; the value is free text as typed by the user
#[derive(Deserialize)]
pub struct ThresholdRequest {
    pub threshold: String,
}

/// Threshold response. A threshold that is not a number is still stored,
/// so the reply carries the parse error next to the session state.
#[derive(Serialize)]
pub struct ThresholdResponse {
    pub session: SessionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_error: Option<String>,
}

/// PUT /api/v1/sessions/:id/threshold - Set the Valor threshold
pub async fn set_threshold(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ThresholdRequest>,
) -> ApiResult<ThresholdResponse> {
    let response = state.sessions.with_session_mut(id, |session| {
        let threshold_error = session.set_threshold(&req.threshold).err().map(|e| e.to_string());
        Ok(ThresholdResponse {
            session: session.summary(),
            threshold_error,
        })
    })?;
    Ok(Json(ApiResponse::ok(response)))
}

/// City selection request
#[derive(Deserialize)]
pub struct CityRequest {
    pub city: String,
}

/// PUT /api/v1/sessions/:id/city - Select the city for statistics
pub async fn set_city(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CityRequest>,
) -> ApiResult<SessionSummary> {
    let summary = state.sessions.with_session_mut(id, |session| {
        session.select_city(&req.city)?;
        Ok(session.summary())
    })?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// GET /api/v1/sessions/:id/dashboard - Render the dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Dashboard> {
    let dashboard = state.sessions.with_session(id, |session| session.render())?;
    Ok(Json(ApiResponse::ok(dashboard)))
}

/// GET /api/v1/sessions/:id/export - Download the selected columns as CSV
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let csv = state
        .sessions
        .with_session(id, |session| session.export_csv())?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                format!("{}; charset=utf-8", CSV_CONTENT_TYPE),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_ok_creates_success_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test data".to_string());

        assert!(response.success);
        assert_eq!(response.data, Some("test data".to_string()));
        assert!(response.error.is_none());
        // Verify UUID format (8-4-4-4-12)
        assert_eq!(response.request_id.len(), 36);
    }

    #[test]
    fn test_api_response_err_serializes_without_data() {
        let response: ApiResponse<String> = ApiResponse::err("error message");
        let json = serde_json::to_string(&response).unwrap();

        assert!(!json.contains("\"data\""));
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\":\"error message\""));
    }

    #[test]
    fn test_api_error_status_codes() {
        let status = |e: DashError| ApiError(e).status();

        assert_eq!(status(DashError::Parse("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(DashError::MissingColumns(vec!["ano".into()])),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(DashError::Validation("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(DashError::UnknownCity("Z".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(DashError::NoTable), StatusCode::CONFLICT);
        assert_eq!(
            status(DashError::SessionNotFound(Uuid::nil())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(DashError::Xlsx("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(DashError::Internal("join".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_threshold_request_keeps_text() {
        let req: ThresholdRequest = serde_json::from_str(r#"{"threshold": "abc"}"#).unwrap();
        assert_eq!(req.threshold, "abc");
    }

    #[test]
    fn test_columns_request_deserialize() {
        let req: ColumnsRequest =
            serde_json::from_str(r#"{"columns": ["cidades", "Valor"]}"#).unwrap();
        assert_eq!(req.columns, vec!["cidades", "Valor"]);
    }
}
