//! HTTP routes
//!
//! - `GET /health` - liveness probe
//! - `GET /search?number=<digits>` - run every configured source for one number

use crate::core::lookup::LookupEngine;
use crate::domain::model::LookupResponse;
use crate::utils::error::{ErrorCategory, LookupError};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LookupEngine>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub number: Option<String>,
}

pub fn create_router(engine: Arc<LookupEngine>, cors: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/search", get(search))
        .with_state(AppState { engine })
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http());

    if cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        )
    } else {
        router
    }
}

/// GET /health
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /search?number=919876543210
///
/// Always 200 once the number is valid, even if every source failed.
async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<LookupResponse>, ApiError> {
    let Query(params) = query.map_err(|rejection| LookupError::InvalidQuery {
        message: rejection.body_text(),
    })?;

    let raw = params
        .number
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| LookupError::MissingParameter {
            name: "number".to_string(),
        })?;

    let response = state.engine.lookup(&raw).await?;
    Ok(Json(response))
}

pub struct ApiError(LookupError);

impl From<LookupError> for ApiError {
    fn from(error: LookupError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0.category() {
            ErrorCategory::Input => {
                tracing::info!("Rejected search request: {}", self.0);
                (StatusCode::BAD_REQUEST, self.0.user_friendly_message())
            }
            _ => {
                tracing::error!("❌ Unhandled error while serving search: {}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    ApiError(LookupError::Internal {
        message: format!("handler panicked: {}", detail),
    })
    .into_response()
}
