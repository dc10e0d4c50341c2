// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use focusflow::config::Config;
use focusflow::db::Db;
use focusflow::middleware::auth::create_jwt;
use focusflow::routes::create_router;
use focusflow::services::{BreakService, EmailNotifier, ScoringService, SessionService};
use focusflow::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test app backed by an in-memory database and a disabled
/// notifier. Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Db::open_in_memory().expect("in-memory database");

    let notifier = EmailNotifier::disabled();
    let sessions = SessionService::new(db.clone());
    let breaks = BreakService::new(db.clone(), notifier, config.frontend_url.clone());
    let scoring = ScoringService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        sessions,
        breaks,
        scoring,
    });

    (create_router(state.clone()), state)
}

/// Create a test JWT for a user.
#[allow(dead_code)]
pub fn test_jwt(state: &AppState, user_id: &str, name: &str, email: Option<&str>) -> String {
    create_jwt(user_id, name, email, &state.config.jwt_signing_key).expect("test jwt")
}

/// Send an authenticated request with an optional JSON body.
#[allow(dead_code)]
pub async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Response {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn read_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Create a session and join it as `token`'s user, returning the session id.
#[allow(dead_code)]
pub async fn create_and_join(
    app: &axum::Router,
    token: &str,
    duration_minutes: i64,
    goal: &str,
) -> String {
    let response = request(
        app,
        "POST",
        "/api/sessions",
        token,
        Some(serde_json::json!({
            "name": "Deep work",
            "durationMinutes": duration_minutes,
        })),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let created = read_json(response).await;
    let session_id = created["session"]["id"].as_str().unwrap().to_string();

    let response = request(
        app,
        "POST",
        &format!("/api/sessions/{}/join", session_id),
        token,
        Some(serde_json::json!({ "goal": goal })),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    session_id
}

/// Backdate a session's start so break mode is unlocked.
#[allow(dead_code)]
pub fn backdate_session_start(state: &AppState, session_id: &str, seconds_ago: i64) {
    let started_at = focusflow::time_utils::format_utc_rfc3339(
        chrono::Utc::now() - chrono::Duration::seconds(seconds_ago),
    );
    state
        .db
        .with_conn(|conn| {
            conn.execute(
                r#"UPDATE "FocusSession" SET "startedAt" = ?2 WHERE "id" = ?1"#,
                rusqlite::params![session_id, started_at],
            )
        })
        .expect("backdate session start");
}

/// Backdate the caller's break deadline so the break is overdue.
#[allow(dead_code)]
pub fn backdate_break_deadline(state: &AppState, session_id: &str, user_id: &str, seconds_ago: i64) {
    let ends_at = focusflow::time_utils::format_utc_rfc3339(
        chrono::Utc::now() - chrono::Duration::seconds(seconds_ago),
    );
    state
        .db
        .with_conn(|conn| {
            conn.execute(
                r#"
                UPDATE "UserInSession" SET "breakEndsAt" = ?3
                WHERE "focusSessionId" = ?1 AND "userId" = ?2
                "#,
                rusqlite::params![session_id, user_id, ends_at],
            )
        })
        .expect("backdate break deadline");
}
