// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Focus session and break endpoints.
//!
//! Request bodies are strict typed structs validated at the boundary; the
//! services re-check the hard limits regardless of what arrives here.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{FocusSession, SessionListEntry};
use crate::services::breaks::EXTENSION_MINUTES;
use crate::services::SessionView;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Session routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/sessions",
            get(list_sessions)
                .post(create_session)
                .delete(hide_session),
        )
        // Legacy body-addressed aliases, kept for older clients.
        .route("/api/sessions/join", post(join_session_legacy))
        .route("/api/sessions/recap", post(submit_recap_legacy))
        .route("/api/sessions/{session_id}", get(view_session))
        .route("/api/sessions/{session_id}/join", post(join_session))
        .route("/api/sessions/{session_id}/end", post(end_session))
        .route("/api/sessions/{session_id}/recap", post(submit_recap))
        .route("/api/sessions/{session_id}/break/start", post(start_break))
        .route("/api/sessions/{session_id}/break/extend", post(extend_break))
        .route("/api/sessions/{session_id}/break/return", post(return_from_break))
        .route(
            "/api/sessions/{session_id}/break/escalate",
            post(escalate_break),
        )
}

fn normalize_session_id(raw: &str) -> Result<String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(AppError::Validation("sessionId is required".to_string()));
    }
    Ok(id.to_string())
}

fn validate<T: Validate>(body: &T) -> Result<()> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

// ─── Create / List / Hide ────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    #[validate(length(min = 1, message = "Session name is required"))]
    name: String,
    team_session_id: Option<String>,
    #[validate(range(min = 1, max = 240, message = "durationMinutes must be between 1 and 240"))]
    duration_minutes: i64,
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session: FocusSession,
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>> {
    validate(&body)?;

    let session = state.sessions.create_session(
        &user,
        &body.name,
        body.duration_minutes,
        body.team_session_id.as_deref(),
    )?;

    Ok(Json(CreateSessionResponse { session }))
}

#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionListEntry>,
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionListResponse>> {
    let sessions = state.sessions.list_sessions(&user.user_id)?;
    Ok(Json(SessionListResponse { sessions }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HideSessionQuery {
    session_id: Option<String>,
}

#[derive(Serialize)]
pub struct HideSessionResponse {
    pub deleted: bool,
    pub scope: &'static str,
}

/// "Delete" a session: hide it from the caller's list only. The shared row
/// is never removed, and only ended sessions can be hidden.
async fn hide_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<HideSessionQuery>,
) -> Result<Json<HideSessionResponse>> {
    let session_id = normalize_session_id(query.session_id.as_deref().unwrap_or_default())?;
    state.sessions.hide_session(&user.user_id, &session_id)?;

    Ok(Json(HideSessionResponse {
        deleted: true,
        scope: "current-user",
    }))
}

// ─── Join ────────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct JoinSessionRequest {
    #[validate(length(min = 1, message = "Goal is required"))]
    goal: String,
    team_session_id: Option<String>,
}

#[derive(Serialize)]
pub struct JoinSessionResponse {
    pub joined: bool,
}

async fn join_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
    Json(body): Json<JoinSessionRequest>,
) -> Result<Json<JoinSessionResponse>> {
    let session_id = normalize_session_id(&session_id)?;
    validate(&body)?;

    state.sessions.join_session(
        &user,
        &session_id,
        &body.goal,
        body.team_session_id.as_deref(),
    )?;

    Ok(Json(JoinSessionResponse { joined: true }))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct JoinSessionLegacyRequest {
    #[validate(length(min = 1, message = "Missing sessionId or goal"))]
    session_id: String,
    #[validate(length(min = 1, message = "Missing sessionId or goal"))]
    goal: String,
    team_session_id: Option<String>,
}

async fn join_session_legacy(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<JoinSessionLegacyRequest>,
) -> Result<Json<JoinSessionResponse>> {
    validate(&body)?;
    let session_id = normalize_session_id(&body.session_id)?;

    state.sessions.join_session(
        &user,
        &session_id,
        &body.goal,
        body.team_session_id.as_deref(),
    )?;

    Ok(Json(JoinSessionResponse { joined: true }))
}

// ─── View / End ──────────────────────────────────────────────

async fn view_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>> {
    let session_id = normalize_session_id(&session_id)?;
    let view = state.sessions.view_session(&user.user_id, &session_id)?;
    Ok(Json(view))
}

#[derive(Serialize)]
pub struct EndSessionResponse {
    pub ended: bool,
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<EndSessionResponse>> {
    let session_id = normalize_session_id(&session_id)?;
    state.sessions.end_session(&user.user_id, &session_id)?;
    Ok(Json(EndSessionResponse { ended: true }))
}

// ─── Recap ───────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct RecapRequest {
    #[validate(length(min = 1, message = "Recap is required"))]
    recap: String,
}

#[derive(Serialize)]
pub struct RecapResponse {
    pub saved: bool,
}

async fn submit_recap(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
    Json(body): Json<RecapRequest>,
) -> Result<Json<RecapResponse>> {
    let session_id = normalize_session_id(&session_id)?;
    validate(&body)?;

    state
        .sessions
        .submit_recap(&user.user_id, &session_id, &body.recap)?;
    Ok(Json(RecapResponse { saved: true }))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RecapLegacyRequest {
    #[validate(length(min = 1, message = "sessionId is required"))]
    session_id: String,
    #[validate(length(min = 1, message = "Recap is required"))]
    recap: String,
}

async fn submit_recap_legacy(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<RecapLegacyRequest>,
) -> Result<Json<RecapResponse>> {
    validate(&body)?;
    let session_id = normalize_session_id(&body.session_id)?;

    state
        .sessions
        .submit_recap(&user.user_id, &session_id, &body.recap)?;
    Ok(Json(RecapResponse { saved: true }))
}

// ─── Break Transitions ───────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct StartBreakRequest {
    #[validate(range(min = 1, max = 240, message = "durationMinutes must be between 1 and 240"))]
    duration_minutes: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartBreakResponse {
    pub started: bool,
    pub duration_minutes: i64,
}

async fn start_break(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
    Json(body): Json<StartBreakRequest>,
) -> Result<Json<StartBreakResponse>> {
    let session_id = normalize_session_id(&session_id)?;
    validate(&body)?;

    state
        .breaks
        .start_break(&session_id, &user.user_id, body.duration_minutes)?;

    Ok(Json(StartBreakResponse {
        started: true,
        duration_minutes: body.duration_minutes,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendBreakResponse {
    pub extended: bool,
    pub extension_minutes: i64,
}

async fn extend_break(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<ExtendBreakResponse>> {
    let session_id = normalize_session_id(&session_id)?;
    state.breaks.extend_break(&session_id, &user.user_id)?;

    Ok(Json(ExtendBreakResponse {
        extended: true,
        extension_minutes: EXTENSION_MINUTES,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReturnBreakRequest {
    recovery_action: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnBreakResponse {
    pub returned: bool,
    pub recovery_applied: bool,
    pub overdue_seconds: i64,
}

async fn return_from_break(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
    body: Option<Json<ReturnBreakRequest>>,
) -> Result<Json<ReturnBreakResponse>> {
    let session_id = normalize_session_id(&session_id)?;
    let recovery_action = body.as_ref().and_then(|b| b.recovery_action.as_deref());

    let outcome =
        state
            .breaks
            .return_from_break(&session_id, &user.user_id, recovery_action)?;

    Ok(Json(ReturnBreakResponse {
        returned: true,
        recovery_applied: outcome.recovery_applied,
        overdue_seconds: outcome.overdue_seconds,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalateBreakResponse {
    pub escalated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_alerts_sent: Option<u32>,
}

/// Escalate the caller's overdue break. Safe to poll: non-escalating calls
/// are successes with a skip reason.
async fn escalate_break(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<EscalateBreakResponse>> {
    let session_id = normalize_session_id(&session_id)?;

    let outcome = state
        .breaks
        .escalate(
            &session_id,
            &user.user_id,
            &user.display_name(),
            user.email.as_deref(),
        )
        .await?;

    Ok(Json(if outcome.escalated {
        EscalateBreakResponse {
            escalated: true,
            reason: None,
            email_sent: Some(outcome.email_sent),
            group_alerts_sent: Some(outcome.group_alerts_sent),
        }
    } else {
        EscalateBreakResponse {
            escalated: false,
            reason: outcome.reason.map(|r| r.as_str()),
            email_sent: None,
            group_alerts_sent: None,
        }
    }))
}
