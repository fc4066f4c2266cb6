use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::identity::{self, IdentityError, IdentityTokenConfig};
use crate::profile;
use crate::storage::StoreError;
use crate::sync::ProgressController;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ProgressController>,
    pub tokens: IdentityTokenConfig,
}

impl AppState {
    pub fn new(controller: Arc<ProgressController>, tokens: IdentityTokenConfig) -> Self {
        Self { controller, tokens }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error")]
    Internal,
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Store(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Store error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// All HTTP routes with tracing and CORS applied
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "geoprogress" }))
        .route("/profile", get(profile::get_profile))
        .route("/profile/tier", get(profile::get_tier_progress))
        .route("/profile/insights", get(profile::get_insights))
        .route("/profile/name", put(profile::update_display_name))
        .route("/profile/stats", put(profile::update_stats))
        .route("/games/results", post(profile::record_game_result))
        .route("/identity", post(identity::post_identity))
        .route("/sync", get(identity::get_sync_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
