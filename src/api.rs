// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP API
 * Check endpoints and health surface over axum
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::checker::SiteChecker;

/// Shared request state: the fully-wired check pipeline
pub struct AppState {
    pub checker: SiteChecker,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchCheckRequest {
    #[serde(default)]
    urls: Option<Vec<String>>,
}

/// Build the service router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/check", post(check_handler))
        .route("/batch-check", post(batch_check_handler))
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .with_state(state)
}

async fn check_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckRequest>,
) -> impl IntoResponse {
    let Some(url) = request.url.filter(|u| !u.is_empty()) else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "URL is required"})));
    };

    info!(url = %url, "Check requested");
    let result = state.checker.check(&url).await;
    (StatusCode::OK, Json(result))
}

async fn batch_check_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchCheckRequest>,
) -> impl IntoResponse {
    let Some(urls) = request.urls else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "URLs array is required"})),
        );
    };

    info!(count = urls.len(), "Batch check requested");
    let results = state.checker.batch_check(&urls).await;
    (StatusCode::OK, Json(json!({"results": results})))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}

async fn liveness_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
