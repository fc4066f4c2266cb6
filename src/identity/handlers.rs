use axum::{extract::State, Json};
use tracing::{info, instrument};

use super::IdentityRequest;
use crate::shared::{AppError, AppState};
use crate::sync::SyncStatus;

/// POST /identity
///
/// Pushes an identity transition from the provider integration. Responds once
/// the profile is resolved or the sync failsafe releases the caller.
#[instrument(name = "post_identity", skip(state, request), fields(initializing = request.initializing))]
pub async fn post_identity(
    State(state): State<AppState>,
    Json(request): Json<IdentityRequest>,
) -> Result<Json<SyncStatus>, AppError> {
    let identity = request
        .token
        .as_deref()
        .map(|token| state.tokens.decode(token))
        .transpose()?;

    let status = state
        .controller
        .on_identity_changed(identity, request.initializing)
        .await;

    info!(phase = %status.phase, "Identity transition handled");
    Ok(Json(status))
}

/// GET /sync
pub async fn get_sync_status(State(state): State<AppState>) -> Json<SyncStatus> {
    Json(state.controller.status())
}
