// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Activity pings, score clamping, trend derivation and streak persistence.

use axum::http::StatusCode;
use serde_json::json;

mod common;

fn backdate_last_activity(state: &focusflow::AppState, user_id: &str, seconds_ago: i64) {
    let last = focusflow::time_utils::format_utc_rfc3339(
        chrono::Utc::now() - chrono::Duration::seconds(seconds_ago),
    );
    state
        .db
        .with_conn(|conn| {
            conn.execute(
                r#"UPDATE "UserFocusState" SET "lastActivityAt" = ?2 WHERE "userId" = ?1"#,
                rusqlite::params![user_id, last],
            )
        })
        .expect("backdate last activity");
}

#[tokio::test]
async fn test_first_ping_starts_from_baseline() {
    let (app, state) = common::create_test_app();
    let token = common::test_jwt(&state, "user-1", "Alice", None);

    let response = common::request(
        &app,
        "POST",
        "/api/activity",
        &token,
        Some(json!({ "kind": "activity" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::read_json(response).await;

    // Baseline 80, no idle gap on the first ping: +1.
    assert_eq!(body["focusScore"], 81);
}

#[tokio::test]
async fn test_focus_event_earns_extra_point() {
    let (app, state) = common::create_test_app();
    let token = common::test_jwt(&state, "user-1", "Alice", None);

    let body = common::read_json(
        common::request(
            &app,
            "POST",
            "/api/activity",
            &token,
            Some(json!({ "kind": "focus" })),
        )
        .await,
    )
    .await;
    assert_eq!(body["focusScore"], 82);
}

#[tokio::test]
async fn test_idle_tiers_subtract() {
    let (app, state) = common::create_test_app();
    let token = common::test_jwt(&state, "user-1", "Alice", None);

    // Seed the row at 81.
    let seed = common::request(&app, "POST", "/api/activity", &token, None).await;
    assert_eq!(seed.status(), StatusCode::OK);

    for (idle, expected_delta) in [(150, -2), (400, -4), (700, -8)] {
        let before = state.db.get_focus_state("user-1").unwrap().unwrap().focus_score;
        backdate_last_activity(&state, "user-1", idle);

        let body = common::read_json(
            common::request(&app, "POST", "/api/activity", &token, None).await,
        )
        .await;
        assert_eq!(
            body["focusScore"].as_i64().unwrap(),
            before + expected_delta,
            "idle={}s",
            idle
        );
    }
}

#[tokio::test]
async fn test_score_never_leaves_bounds() {
    let (app, state) = common::create_test_app();
    let token = common::test_jwt(&state, "user-1", "Alice", None);

    // Hammer the penalty path far past the floor.
    let seed = common::request(&app, "POST", "/api/activity", &token, None).await;
    assert_eq!(seed.status(), StatusCode::OK);
    for _ in 0..20 {
        backdate_last_activity(&state, "user-1", 700);
        let body = common::read_json(
            common::request(&app, "POST", "/api/activity", &token, None).await,
        )
        .await;
        let score = body["focusScore"].as_i64().unwrap();
        assert!((0..=100).contains(&score));
    }
    assert_eq!(
        state.db.get_focus_state("user-1").unwrap().unwrap().focus_score,
        0
    );

    // And the bonus path past the cap.
    for _ in 0..120 {
        let body = common::read_json(
            common::request(
                &app,
                "POST",
                "/api/activity",
                &token,
                Some(json!({ "kind": "focus" })),
            )
            .await,
        )
        .await;
        let score = body["focusScore"].as_i64().unwrap();
        assert!((0..=100).contains(&score));
    }
    assert_eq!(
        state.db.get_focus_state("user-1").unwrap().unwrap().focus_score,
        100
    );
}

#[tokio::test]
async fn test_focus_state_view_reports_trend() {
    let (app, state) = common::create_test_app();
    let token = common::test_jwt(&state, "user-1", "Alice", None);

    // Fewer than two points: stable.
    let body =
        common::read_json(common::request(&app, "GET", "/api/focus-state", &token, None).await)
            .await;
    assert_eq!(body["scoreTrend"], "stable");
    assert_eq!(body["focusScore"], 80);
    assert_eq!(body["reliabilityScore"], 100);

    // Climbing pings: trend up.
    for _ in 0..3 {
        let ping = common::request(&app, "POST", "/api/activity", &token, None).await;
        assert_eq!(ping.status(), StatusCode::OK);
    }
    let body =
        common::read_json(common::request(&app, "GET", "/api/focus-state", &token, None).await)
            .await;
    assert_eq!(body["scoreTrend"], "up");
    assert_eq!(body["scorePoints"].as_array().unwrap().len(), 3);

    // A heavy idle penalty turns the window down.
    for _ in 0..2 {
        backdate_last_activity(&state, "user-1", 700);
        let ping = common::request(&app, "POST", "/api/activity", &token, None).await;
        assert_eq!(ping.status(), StatusCode::OK);
    }
    let body =
        common::read_json(common::request(&app, "GET", "/api/focus-state", &token, None).await)
            .await;
    assert_eq!(body["scoreTrend"], "down");
}

#[tokio::test]
async fn test_streak_continues_from_yesterday_and_resets_after_gap() {
    let (app, state) = common::create_test_app();
    let token = common::test_jwt(&state, "user-1", "Alice", None);

    let yesterday = (chrono::Utc::now().date_naive() - chrono::Days::new(1)).to_string();
    state
        .db
        .with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO "UserGamification"
                    ("userId", "totalPoints", "currentStreak", "longestStreak", "lastSessionDate")
                VALUES (?1, 20, 2, 2, ?2)
                "#,
                rusqlite::params!["user-1", yesterday],
            )
        })
        .unwrap();

    let session_id = common::create_and_join(&app, &token, 60, "write").await;
    let recap = common::request(
        &app,
        "POST",
        &format!("/api/sessions/{}/recap", session_id),
        &token,
        Some(json!({ "recap": "done" })),
    )
    .await;
    assert_eq!(recap.status(), StatusCode::OK);

    let stats = common::read_json(
        common::request(&app, "GET", "/api/gamification", &token, None).await,
    )
    .await;
    assert_eq!(stats["stats"]["currentStreak"], 3);
    assert_eq!(stats["stats"]["longestStreak"], 3);
    assert_eq!(stats["stats"]["totalPoints"], 30);

    // A stale last date (four days back) resets the streak to 1 but never
    // shrinks the longest.
    let stale = (chrono::Utc::now().date_naive() - chrono::Days::new(4)).to_string();
    state
        .db
        .with_conn(|conn| {
            conn.execute(
                r#"UPDATE "UserGamification" SET "lastSessionDate" = ?2 WHERE "userId" = ?1"#,
                rusqlite::params!["user-1", stale],
            )
        })
        .unwrap();

    let session_id = common::create_and_join(&app, &token, 60, "write more").await;
    let recap = common::request(
        &app,
        "POST",
        &format!("/api/sessions/{}/recap", session_id),
        &token,
        Some(json!({ "recap": "done again" })),
    )
    .await;
    assert_eq!(recap.status(), StatusCode::OK);

    let stats = common::read_json(
        common::request(&app, "GET", "/api/gamification", &token, None).await,
    )
    .await;
    assert_eq!(stats["stats"]["currentStreak"], 1);
    assert_eq!(stats["stats"]["longestStreak"], 3);
    assert_eq!(stats["stats"]["totalPoints"], 40);
}
