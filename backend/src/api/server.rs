//! HTTP Server for the metabolon2maf API.
//!
//! Provides REST endpoints for sheet upload and conversion.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/convert`    | Upload a Metabolon sheet, get a MAF  |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::Value;
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, log_warning, LOG_BROADCASTER};
use super::types::{error_response, ConvertResponse, HealthResponse};
use crate::config::{MafConfig, StandardHeaderProvider};
use crate::error::{ServerError, ServerResult};
use crate::lookup::{IdentifierResolver, LookupBackend};
use crate::parser::load_grid_from_bytes;
use crate::transform::convert_grid;

/// Workbooks larger than this are rejected.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared by every request.
pub struct AppState {
    standard_headers: Vec<String>,
    resolver: IdentifierResolver<LookupBackend>,
}

impl AppState {
    pub fn new(config: &MafConfig, lookup: LookupBackend) -> Self {
        Self {
            standard_headers: config.standard_headers(),
            resolver: IdentifierResolver::new(lookup),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        let status = match err {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(error_response(&err.to_string())))
    }
}

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/convert", post(convert_upload))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(port: u16, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let lookup = state.resolver.service().describe();
    let app = router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("🚀 metabolon2maf server running on http://localhost:{}", port);
    eprintln!("   POST /api/convert - Upload Metabolon sheet");
    eprintln!("   GET  /api/logs    - SSE log stream");
    eprintln!("   GET  /health      - Health check");
    eprintln!();
    eprintln!("🔎 Identifier lookup: {}", lookup);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "metabolon2maf".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        lookup: state.resolver.service().describe(),
    })
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Uploaded sheet
struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?
            .to_vec();

        return Ok(Upload { file_name, bytes });
    }

    Err(ServerError::BadRequest("No file provided".to_string()))
}

/// Convert an uploaded Metabolon sheet
async fn convert_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let upload = read_upload(multipart).await?;

    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    ));

    let source = load_grid_from_bytes(&upload.bytes, &upload.file_name)
        .map_err(|e| ServerError::Pipeline(e.into()))?;

    let result = convert_grid(source, &state.standard_headers, &state.resolver).await;
    spawn_cache_flush(Arc::clone(&state));

    Ok(Json(ConvertResponse::from_result(result, Some(upload.file_name))))
}

/// Persist new lookup answers on a blocking worker, outside the request.
///
/// The cache only writes when an upload added or touched entries.
fn spawn_cache_flush(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        if let Err(e) = state.resolver.service().flush() {
            log_warning(format!("Could not save lookup cache: {}", e));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CachedLookup, LookupCache};
    use crate::lookup::{ChebiClient, OfflineLookup};
    use crate::models::MetaboliteRecord;
    use tempfile::tempdir;

    #[test]
    fn test_error_status_mapping() {
        let (status, body) = ApiError::from(ServerError::BadRequest("No file provided".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0["status"], "error");

        let grid_err = crate::error::GridError::UnsupportedFormat("pdf".into());
        let (status, _) = ApiError::from(ServerError::Pipeline(grid_err.into()));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_health_reports_lookup() {
        let state = AppState::new(&MafConfig::default(), LookupBackend::Offline(OfflineLookup));
        let Json(health) = health(State(Arc::new(state))).await;

        assert_eq!(health.status, "ok");
        assert_eq!(health.service, "metabolon2maf");
        assert!(health.lookup.starts_with("offline"));
    }

    #[tokio::test]
    async fn test_cache_flushed_in_background() {
        let dir = tempdir().unwrap();
        let mut cache = LookupCache::with_dir(dir.path());
        cache.insert(
            "id:C00031".into(),
            Some(MetaboliteRecord::with_identifier("CHEBI:4167")),
        );
        let lookup = CachedLookup::new(ChebiClient::new("http://127.0.0.1:9"), cache);
        let state = Arc::new(AppState::new(
            &MafConfig::default(),
            LookupBackend::Cached(lookup),
        ));

        spawn_cache_flush(state).await.unwrap();

        assert_eq!(LookupCache::with_dir(dir.path()).len(), 1);
    }
}
