//! Rowdeck HTTP server — upload, search and pagination over JSON / HTTP
//!
//! Thin transport around the ingest pipeline and the query layer. Handlers
//! translate [`IngestError`] and [`QueryError`] into status codes; all of the
//! actual work happens in [`crate::ingest`] and [`crate::query`].
//!
//! # Routes
//!
//! | Method | Path         | Purpose                                            |
//! |--------|--------------|----------------------------------------------------|
//! | `POST` | `/upload`    | Multipart upload (field `file`) replaces the data  |
//! | `GET`  | `/data`      | `?search=` substring search, optional `page/limit` |
//! | `GET`  | `/data/all`  | `?page=&limit=` windowed read of the whole dataset |
//! | `GET`  | `/data/info` | Source name, row count and size of current data    |
//! | `GET`  | `/health`    | Readiness probe                                    |
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  multipart  ┌──────────────┐  spool + parse  ┌──────────────┐
//! │   Browser    │────────────▶│  Axum Router │────────────────▶│ DatasetStore │
//! │     (UI)     │◀────────────│   (async)    │◀────────────────│  (snapshot)  │
//! └──────────────┘    JSON     └──────────────┘     queries     └──────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Query, State,
    },
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::data::DatasetStore;
use crate::ingest::{ingest, IngestError, Upload};
use crate::query::{self, QueryError};

/// Multipart field that carries the uploaded file.
pub const FILE_FIELD: &str = "file";

// ─── Shared state ───────────────────────────────────────────────────────────

/// State shared between the Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: DatasetStore,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: DatasetStore, config: ServerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

// ─── Wire types ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    Ingest(IngestError),
    Query(QueryError),
    /// Malformed or oversized multipart body
    Multipart(MultipartError),
    Internal(String),
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        ApiError::Ingest(e)
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        ApiError::Query(e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Multipart(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Ingest(e) => {
                let details = match &e {
                    IngestError::ReadFailure(cause) => Some(cause.to_string()),
                    _ => None,
                };
                (status_from(e.status_code()), e.to_string(), details)
            }
            ApiError::Query(e) => (status_from(e.status_code()), e.to_string(), None),
            ApiError::Multipart(e) => (e.status(), "Error processing file.".into(), Some(e.body_text())),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error.".into(),
                Some(msg),
            ),
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

// ─── Server bootstrap ──────────────────────────────────────────────────────

/// Build the router with CORS, tracing and body-limit layers applied.
pub fn router(state: AppState) -> Result<Router> {
    let origin = HeaderValue::from_str(&state.config.cors_origin)
        .with_context(|| format!("Invalid CORS origin: {}", state.config.cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true);

    let max_upload_bytes = state.config.max_upload_bytes;

    Ok(Router::new()
        .route("/upload", post(handle_upload))
        .route("/data", get(handle_search))
        .route("/data/all", get(handle_page))
        .route("/data/info", get(handle_info))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Bind the configured address and serve until the process exits.
pub async fn start_server(store: DatasetStore, config: ServerConfig) -> Result<()> {
    let addr = config.bind_addr();
    let app = router(AppState::new(store, config))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health-check endpoint (useful for readiness probes).
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok", "server": "rowdeck"})))
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    // A request that isn't multipart at all simply carries no file.
    let upload = match multipart {
        Ok(mut multipart) => spool_file_field(&mut multipart, &state.config.upload_dir).await?,
        Err(rejection) => {
            debug!("Upload without multipart body: {}", rejection);
            None
        }
    };

    let store = state.store.clone();
    let outcome = tokio::task::spawn_blocking(move || ingest(upload, &store))
        .await
        .map_err(|e| ApiError::Internal(format!("Task join error: {}", e)))?;

    match outcome {
        Ok(dataset) => {
            info!(
                "Ingested {} rows from {} ({})",
                dataset.row_count(),
                dataset.source,
                dataset.size_human()
            );
            Ok(Json(serde_json::json!({
                "message": "File uploaded and processed successfully.",
                "data": dataset.rows(),
            }))
            .into_response())
        }
        Err(IngestError::ReadFailure(cause)) => {
            error!("Upload failed while reading: {}", cause);
            Err(IngestError::ReadFailure(cause).into())
        }
        Err(e) => {
            warn!("Upload rejected: {:?}", e);
            Err(e.into())
        }
    }
}

/// Stream the `file` field into a fresh spool, one chunk at a time.
///
/// Returns `None` when the form has no file field.
async fn spool_file_field(multipart: &mut Multipart, dir: &Path) -> Result<Option<Upload>, ApiError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let mut upload = Upload::create_in(file_name, dir).map_err(IngestError::from)?;
        while let Some(chunk) = field.chunk().await? {
            upload.write_chunk(&chunk).map_err(IngestError::from)?;
        }
        debug!("Spooled {} bytes to {}", upload.size(), upload.path().display());
        return Ok(Some(upload));
    }

    Ok(None)
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    debug!(
        "Search request: search={:?}, page={:?}, limit={:?}",
        params.search, params.page, params.limit
    );

    // Offload the scan to the blocking threadpool
    let store = state.store.clone();
    let response = tokio::task::spawn_blocking(move || -> Result<Response, QueryError> {
        let SearchParams { search, page, limit } = params;
        if page.is_some() || limit.is_some() {
            let page = query::search_page(&store, search.as_deref(), page.as_deref(), limit.as_deref())?;
            Ok(Json(page).into_response())
        } else {
            let rows = query::search(&store, search.as_deref())?;
            Ok(Json(serde_json::json!({ "data": rows })).into_response())
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Task join error: {}", e)))??;

    Ok(response)
}

async fn handle_page(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<query::PageResult>, ApiError> {
    let page = query::paginate(&state.store, params.page.as_deref(), params.limit.as_deref())?;
    Ok(Json(page))
}

async fn handle_info(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let dataset = state.store.snapshot().ok_or(QueryError::NoData)?;
    Ok(Json(serde_json::json!({
        "source": dataset.source,
        "rows": dataset.row_count(),
        "size_bytes": dataset.size,
        "size_human": dataset.size_human(),
    })))
}
