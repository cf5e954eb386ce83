use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::RequestId;
use crate::models::PickResponse;
use crate::services::intersection::resolve_threshold;

use super::AppState;

/// Query string of the pick endpoint
#[derive(Debug, Default, Deserialize)]
pub struct PickQuery {
    /// Comma-separated AniList usernames
    pub anilist: Option<String>,
    /// Minimum number of users that must have completed the pick
    pub dup: Option<String>,
}

/// Splits the `anilist` parameter, dropping blank entries and repeats
///
/// AniList usernames are case-insensitive, so `Alice` after `alice` is a
/// repeat. The first spelling is kept.
pub fn parse_usernames(raw: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Pick an anime the given users have in common
pub async fn pick_duplicate(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<PickQuery>,
) -> AppResult<Json<PickResponse>> {
    let usernames = parse_usernames(params.anilist.as_deref());
    if usernames.is_empty() {
        return Err(AppError::NoUsernames);
    }

    let dup = resolve_threshold(params.dup.as_deref(), usernames.len());

    tracing::info!(
        request_id = %request_id,
        users = usernames.len(),
        dup,
        "Processing pick request"
    );

    let response = state.picker.select_duplicate(&usernames, dup).await?;

    tracing::info!(
        request_id = %request_id,
        anime_id = response.anime.id,
        "Pick request completed"
    );

    Ok(Json(response))
}
