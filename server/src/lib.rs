use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use govnav_core::persist::{load, IndexPaths};
use govnav_core::snippet::SnippetOptions;
use govnav_core::{Document, Error, OrdinanceService, SearchIndex, SearchResponse};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: i64,
    #[serde(default)]
    pub highlight: bool,
}
fn default_k() -> i64 { 5 }

#[derive(Deserialize)]
pub struct TitleParams {
    pub title: String,
}

#[derive(Serialize)]
pub struct TimedSearchResponse {
    #[serde(flatten)]
    pub response: SearchResponse,
    pub took_s: f64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Upper bound applied to `k` before it reaches the engine.
    pub max_k: i64,
    /// Allowed CORS origins; empty allows any.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self { Self { max_k: 100, cors_origins: Vec::new() } }
}

impl ServerConfig {
    /// Defaults plus CORS_ALLOW_ORIGIN (comma-separated) from the environment.
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("CORS_ALLOW_ORIGIN")
            .map(|val| val.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        Self { cors_origins, ..Self::default() }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: OrdinanceService,
    pub config: ServerConfig,
}

/// Engine errors rendered as `{"error": ...}` with a matching status.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self { ApiError(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Format(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Load the persisted index once and build the router around it.
pub fn build_app(index_dir: String, config: ServerConfig) -> Result<Router> {
    let index = load(&IndexPaths::new(&index_dir))?;
    tracing::info!(index_dir = %index_dir, num_docs = index.num_docs(), "index ready");
    Ok(build_app_with_index(index, config))
}

pub fn build_app_with_index(index: SearchIndex, config: ServerConfig) -> Router {
    let cors = {
        let origins: Vec<_> = config.cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        if origins.is_empty() {
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        } else {
            CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
        }
    };
    let state = AppState { service: OrdinanceService::new(index), config };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/ordinances", get(title_handler))
        .route("/ordinances/:id", get(doc_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<TimedSearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.min(state.config.max_k);
    let mut service = state.service;
    if params.highlight {
        service = service.with_snippets(SnippetOptions { highlight: true, ..SnippetOptions::default() });
    }
    let response = service.search_ordinance(&params.q, k)?;
    Ok(Json(TimedSearchResponse { response, took_s: start.elapsed().as_secs_f64() }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.service.get_ordinance_details(&id)?))
}

pub async fn title_handler(
    State(state): State<AppState>,
    Query(params): Query<TitleParams>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.service.find_ordinance_by_title(&params.title)?))
}
