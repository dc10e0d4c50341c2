// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Ambient activity pings and dashboard reads.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::Gamification;
use crate::services::FocusOverview;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activity", post(record_activity))
        .route("/api/focus-state", get(get_focus_state))
        .route("/api/gamification", get(get_gamification))
}

#[derive(Deserialize)]
struct ActivityRequest {
    /// `activity` (default) or `focus`.
    kind: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub ok: bool,
    pub focus_score: i64,
}

/// Record one activity ping; the idle gap since the previous ping decides
/// the score delta.
async fn record_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<ActivityRequest>>,
) -> Result<Json<ActivityResponse>> {
    let kind = body
        .as_ref()
        .and_then(|b| b.kind.as_deref())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or("activity")
        .to_string();

    let focus_score = state.scoring.record_ping(&user.user_id, &kind)?;

    Ok(Json(ActivityResponse {
        ok: true,
        focus_score,
    }))
}

async fn get_focus_state(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FocusOverview>> {
    let overview = state.scoring.focus_overview(&user.user_id)?;
    Ok(Json(overview))
}

#[derive(Serialize)]
pub struct GamificationResponse {
    pub stats: Gamification,
}

async fn get_gamification(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<GamificationResponse>> {
    let stats = state.scoring.gamification(&user.user_id)?;
    Ok(Json(GamificationResponse { stats }))
}
