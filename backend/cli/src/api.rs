use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use uuid::Uuid;

use esprobe_core::{normalize_rating, CellEdit, Document, EsprobeError, COLUMN_LABELS};
use esprobe_export::{ExportFormat, Exporter};
use esprobe_logging::redact_sensitive_data;
use esprobe_planner::QuestionGenerator;
use esprobe_session::{generate_for_session, SessionHandle, SessionRegistry};

/// Shared application state for API handlers.
pub struct AppState {
    pub registry: SessionRegistry,
    pub generator: Arc<QuestionGenerator>,
    pub exporter: Exporter,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(end_session))
        .route(
            "/api/sessions/:id/document",
            put(upload_document).delete(clear_document),
        )
        .route("/api/sessions/:id/generate", post(generate))
        .route("/api/sessions/:id/table", get(get_table))
        .route("/api/sessions/:id/table/rows/:row", patch(edit_row))
        .route("/api/sessions/:id/export/csv", get(export_csv))
        .route("/api/sessions/:id/export/xlsx", get(export_xlsx))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// An [`EsprobeError`] rendered as a JSON response with a generic message.
#[derive(Debug)]
pub struct ApiError(EsprobeError);

impl From<EsprobeError> for ApiError {
    fn from(err: EsprobeError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &EsprobeError) -> StatusCode {
    match err {
        EsprobeError::Generation { .. } | EsprobeError::Parse(_) => StatusCode::BAD_GATEWAY,
        EsprobeError::ExportCapability(_) => StatusCode::NOT_IMPLEMENTED,
        EsprobeError::InvalidDocument(_) | EsprobeError::InvalidEdit(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EsprobeError::RowOutOfRange { .. }
        | EsprobeError::NoTable
        | EsprobeError::NoDocument
        | EsprobeError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        EsprobeError::SessionBusy => StatusCode::CONFLICT,
        EsprobeError::Configuration(_)
        | EsprobeError::Export(_)
        | EsprobeError::Io(_)
        | EsprobeError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let detail = redact_sensitive_data(&self.0.to_string());
        if status.is_server_error() {
            error!(status = %status, error = %detail, "Request failed");
        } else {
            debug!(status = %status, error = %detail, "Request rejected");
        }

        let message = self.0.user_message();
        let body = if self.0.is_warning() {
            json!({ "warning": message })
        } else {
            json!({ "error": message })
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Resolve a session id from the path. Ids that do not parse are reported
/// like any other unknown session.
async fn lookup(state: &AppState, raw_id: &str) -> Result<(Uuid, SessionHandle), EsprobeError> {
    let id = Uuid::parse_str(raw_id)
        .map_err(|_| EsprobeError::SessionNotFound(raw_id.to_string()))?;
    let handle = state.registry.get(&id).await?;
    Ok((id, handle))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "esprobe",
        "version": env!("CARGO_PKG_VERSION"),
        "xlsx": state.exporter.capability(),
    }))
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "sessions": state.registry.summaries().await }))
}

async fn create_session(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let (id, _) = state.registry.create().await;
    (StatusCode::CREATED, Json(json!({ "id": id })))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let (_, handle) = lookup(&state, &id).await?;
    let summary = handle.read().await.summary();
    Ok(Json(json!(summary)))
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let (id, _) = lookup(&state, &id).await?;
    state.registry.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    name: Option<String>,
}

/// Raw-body upload. The name falls back to `entry_sheet.pdf`.
async fn upload_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let (_, handle) = lookup(&state, &id).await?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let name = params.name.unwrap_or_else(|| "entry_sheet.pdf".to_string());
    let document = Document::from_upload(name, content_type, body.to_vec())?;

    let reply = json!({
        "file_name": document.file_name(),
        "bytes": document.len(),
    });
    handle.write().await.attach_document(document);
    Ok(Json(reply))
}

/// Start over: drop the uploaded document and its table.
async fn clear_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let (id, handle) = lookup(&state, &id).await?;
    let mut session = handle.write().await;
    if session.is_generating() {
        return Err(EsprobeError::SessionBusy.into());
    }
    session.clear();
    info!(session = %id, "Document and table cleared");
    Ok(StatusCode::NO_CONTENT)
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let (id, handle) = lookup(&state, &id).await?;
    let rows = generate_for_session(&handle, &state.generator).await?;
    info!(session = %id, rows, "Table ready");
    Ok(Json(json!({ "rows": rows })))
}

async fn get_table(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let (_, handle) = lookup(&state, &id).await?;
    let session = handle.read().await;
    let table = session.require_table()?;
    Ok(Json(json!({
        "headers": COLUMN_LABELS,
        "records": table.records(),
    })))
}

/// Edits to the interviewer columns of one row. Absent fields stay as they are.
#[derive(Debug, Deserialize)]
struct RowEdit {
    response_notes: Option<String>,
    /// A string, a bare integer such as `4`, or `null` to clear.
    #[serde(default, deserialize_with = "present")]
    rating: Option<Value>,
}

/// Distinguish an explicit `null` (`Some(Value::Null)`) from an absent field (`None`).
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn rating_text(value: Value) -> Result<String, EsprobeError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(EsprobeError::InvalidEdit(format!(
            "rating must be a string or an integer, got {other}"
        ))),
    }
}

async fn edit_row(
    State(state): State<Arc<AppState>>,
    Path((id, row)): Path<(String, String)>,
    Json(edit): Json<RowEdit>,
) -> ApiResult<Json<Value>> {
    let row: usize = row
        .parse()
        .map_err(|_| EsprobeError::InvalidEdit(format!("row must be a number, got {row}")))?;
    // Validate everything before touching the table so a bad rating leaves
    // the notes unchanged too.
    let rating = edit
        .rating
        .map(rating_text)
        .transpose()?
        .map(|raw| normalize_rating(&raw))
        .transpose()?;
    if edit.response_notes.is_none() && rating.is_none() {
        return Err(EsprobeError::InvalidEdit("no editable field given".to_string()).into());
    }

    let (_, handle) = lookup(&state, &id).await?;
    let mut session = handle.write().await;
    let len = session.require_table()?.len();
    if row >= len {
        return Err(EsprobeError::RowOutOfRange { row, len }.into());
    }

    if let Some(notes) = edit.response_notes {
        session.apply_edit(row, CellEdit::ResponseNotes(notes))?;
    }
    if let Some(rating) = rating {
        session.apply_edit(row, CellEdit::Rating(rating))?;
    }
    let record = session.require_table()?.get(row).cloned();
    Ok(Json(json!({ "row": row, "record": record })))
}

async fn export(state: &AppState, id: &str, format: ExportFormat) -> ApiResult<Response> {
    let (id, handle) = lookup(state, id).await?;
    let bytes = {
        let session = handle.read().await;
        state.exporter.render(session.require_table()?, format)?
    };
    info!(session = %id, format = %format, bytes = bytes.len(), "Export served");

    let disposition = format!("attachment; filename=\"{}\"", format.file_name());
    let content_type = match format {
        ExportFormat::Csv => format!("{}; charset=utf-8", format.mime_type()),
        ExportFormat::Xlsx => format.mime_type().to_string(),
    };
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn export_csv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    export(&state, &id, ExportFormat::Csv).await
}

async fn export_xlsx(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    export(&state, &id, ExportFormat::Xlsx).await
}
