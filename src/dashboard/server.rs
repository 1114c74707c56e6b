use std::collections::BTreeMap;

use axum::{
    routing::get,
    Json,
    Router,
    response::{IntoResponse, Response},
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use tower_http::compression::CompressionLayer;

use crate::dashboard::models::key_detail::KeyDetail;
use crate::dashboard::models::keyspace::KeyspaceSummary;
use crate::error::StoreError;
use crate::KeyscopeEngine;

pub fn router(engine: KeyscopeEngine) -> Router {
    Router::new()
        .route("/redis-keyspace", get(get_keyspace))
        .route("/redis-keyspace/counts", get(get_keyspace_counts))
        // catch-all so keys containing ':' or '/' arrive verbatim
        .route("/redis-key/{*key_name}", get(get_key))
        // the catch-all never matches an empty name
        .route("/redis-key/", get(get_empty_key))
        .route("/health", get(get_health))
        .layer(CompressionLayer::new())
        .with_state(engine)
}

pub async fn start_dashboard_server(engine: KeyscopeEngine, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 Keyspace API available at http://{}", addr);

    axum::serve(listener, router(engine)).await
}

// ========================================
// HANDLERS
// ========================================

pub async fn get_keyspace(State(engine): State<KeyscopeEngine>) -> Result<Json<KeyspaceSummary>, ApiError> {
    let summary = engine.keyspace.summarize().await?;
    Ok(Json(summary))
}

pub async fn get_keyspace_counts(
    State(engine): State<KeyscopeEngine>,
) -> Result<Json<BTreeMap<String, usize>>, ApiError> {
    let counts = engine.keyspace.counts_by_namespace().await?;
    Ok(Json(counts))
}

pub async fn get_key(
    State(engine): State<KeyscopeEngine>,
    Path(key_name): Path<String>,
) -> Result<Json<KeyDetail>, ApiError> {
    let detail = engine.keyspace.describe(&key_name).await?;
    Ok(Json(detail))
}

pub async fn get_empty_key(State(engine): State<KeyscopeEngine>) -> Result<Json<KeyDetail>, ApiError> {
    let detail = engine.keyspace.describe("").await?;
    Ok(Json(detail))
}

pub async fn get_health(State(engine): State<KeyscopeEngine>) -> Response {
    let uptime_seconds = engine.start_time.elapsed().as_secs();
    match engine.store.ping().await {
        Ok(()) => Json(json!({ "status": "ok", "uptime_seconds": uptime_seconds })).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "detail": e.to_string() })),
        )
            .into_response(),
    }
}

// ========================================
// ERROR MAPPING
// ========================================

/// Store failures as HTTP responses with a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Transient { .. } | StoreError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Malformed { .. } => StatusCode::BAD_GATEWAY,
            StoreError::ValueDecode { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}
