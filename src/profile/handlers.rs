use axum::{extract::State, Json};
use serde_json::Value;
use tracing::{info, instrument};

use super::{normalize_stats, DisplayNameRequest, GameResultResponse, UserProfile};
use crate::gamification::TierProgress;
use crate::shared::{AppError, AppState};
use crate::stats::{GameResultPayload, Insights};

/// GET /profile
#[instrument(name = "get_profile", skip(state))]
pub async fn get_profile(State(state): State<AppState>) -> Json<UserProfile> {
    Json(state.controller.profile())
}

/// GET /profile/tier
#[instrument(name = "get_tier_progress", skip(state))]
pub async fn get_tier_progress(State(state): State<AppState>) -> Json<TierProgress> {
    Json(state.controller.tier_progress())
}

/// GET /profile/insights
#[instrument(name = "get_insights", skip(state))]
pub async fn get_insights(State(state): State<AppState>) -> Json<Insights> {
    Json(state.controller.insights())
}

/// PUT /profile/name
#[instrument(name = "update_display_name", skip(state, request))]
pub async fn update_display_name(
    State(state): State<AppState>,
    Json(request): Json<DisplayNameRequest>,
) -> Result<Json<UserProfile>, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("Display name must not be empty".to_string()));
    }

    let profile = state.controller.update_display_name(&request.name);
    info!(profile_id = %profile.id, "Display name updated");
    Ok(Json(profile))
}

/// PUT /profile/stats
///
/// Bulk replacement. The body goes through the same lenient normalization as
/// stored documents, so partial stat objects are accepted.
#[instrument(name = "update_stats", skip(state, body))]
pub async fn update_stats(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<UserProfile>, AppError> {
    if !body.is_object() {
        return Err(AppError::BadRequest("Stats must be a JSON object".to_string()));
    }

    let profile = state.controller.update_stats(normalize_stats(&body));
    info!(profile_id = %profile.id, "Stats replaced");
    Ok(Json(profile))
}

/// POST /games/results
#[instrument(name = "record_game_result", skip(state, payload), fields(game_id = %payload.game_id))]
pub async fn record_game_result(
    State(state): State<AppState>,
    Json(payload): Json<GameResultPayload>,
) -> Result<Json<GameResultResponse>, AppError> {
    if payload.game_id.trim().is_empty() {
        return Err(AppError::BadRequest("gameId must not be empty".to_string()));
    }

    let outcome = state.controller.record_game_result(&payload);
    info!(
        points_awarded = outcome.points_awarded,
        unlocked = outcome.unlocked.len(),
        duplicate = outcome.duplicate,
        "Game result recorded"
    );
    Ok(Json(GameResultResponse::from(outcome)))
}
