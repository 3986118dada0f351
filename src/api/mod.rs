use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::error::ExploreError;
use crate::explore::Explorer;
use crate::models::Catalog;
use crate::query::RawQuery;

pub struct AppState {
    pub explorer: Explorer,
    /// Reported by the health route, e.g. "rest" or "seed"
    pub store_kind: &'static str,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/explore", get(api_explore))
        .route("/api/facets", get(api_facets))
        .route("/api/health", get(api_health))
        .with_state(state)
}

async fn api_explore(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let raw = RawQuery::from_pairs(pairs);
    match state.explorer.search(&raw).await {
        Ok(page) => Json(page).into_response(),
        Err(err) => error_response(err),
    }
}

/// Internal diagnostics stay in the log, never in the body
fn error_response(err: ExploreError) -> Response {
    match err {
        ExploreError::Validation(invalid) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "validation_failed",
                "fields": invalid.fields,
            })),
        )
            .into_response(),
        ExploreError::Store(e) => {
            warn!("Search failed against the store: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "store_unavailable",
                    "retryable": true,
                })),
            )
                .into_response()
        }
    }
}

async fn api_facets() -> impl IntoResponse {
    Json(Catalog::new())
}

async fn api_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "store": state.store_kind,
    }))
}
