// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Reliability/focus scoring reads and the ambient activity ping.
//!
//! Break transitions write into the same per-user row directly through the
//! storage layer; this service owns the ping path and the derived views.

use crate::db::Db;
use crate::error::Result;
use crate::models::focus_state::{activity_delta, clamp_score, score_trend, ScoreTrend};
use crate::models::{FocusState, Gamification};
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339, seconds_between};
use chrono::Utc;
use serde::Serialize;

/// Score-log window used for the trend.
const TREND_WINDOW: u32 = 12;

/// Dashboard view of a user's focus state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusOverview {
    pub focus_score: i64,
    pub reliability_score: i64,
    pub overdue_count: i64,
    pub last_overdue_at: Option<String>,
    pub score_trend: ScoreTrend,
    pub score_points: Vec<i64>,
}

#[derive(Clone)]
pub struct ScoringService {
    db: Db,
}

impl ScoringService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Record one activity ping and return the new focus score.
    ///
    /// The delta depends on how long the user has been idle since the last
    /// ping; a `focus` event earns one extra point. Every ping appends an
    /// immutable score-log entry.
    pub fn record_ping(&self, user_id: &str, kind: &str) -> Result<i64> {
        let now = Utc::now();
        let previous = self.db.get_focus_state(user_id)?;

        let idle_seconds = previous
            .as_ref()
            .and_then(|state| state.last_activity_at.as_deref())
            .and_then(parse_utc_rfc3339)
            .map_or(0, |last| seconds_between(last, now));

        let old_score = previous
            .map(|state| state.focus_score)
            .unwrap_or(crate::models::focus_state::DEFAULT_FOCUS_SCORE);
        let next_score = clamp_score(old_score + activity_delta(idle_seconds, kind == "focus"));

        let now_str = format_utc_rfc3339(now);
        self.db.record_activity_ping(user_id, next_score, &now_str)?;
        self.db.append_score_log(
            &uuid::Uuid::new_v4().to_string(),
            user_id,
            next_score,
            &now_str,
        )?;

        tracing::debug!(user_id, kind, idle_seconds, next_score, "Activity ping");
        Ok(next_score)
    }

    /// Current scores plus the recent trend.
    pub fn focus_overview(&self, user_id: &str) -> Result<FocusOverview> {
        let state = self
            .db
            .get_focus_state(user_id)?
            .unwrap_or_else(|| FocusState::baseline(user_id));

        // Stored newest-first; the trend wants chronological order.
        let mut points = self.db.recent_scores(user_id, TREND_WINDOW)?;
        points.reverse();

        Ok(FocusOverview {
            focus_score: state.focus_score,
            reliability_score: state.reliability_score,
            overdue_count: state.overdue_count,
            last_overdue_at: state.last_overdue_at,
            score_trend: score_trend(&points),
            score_points: points,
        })
    }

    /// Gamification aggregate, zeroed for users with no history.
    pub fn gamification(&self, user_id: &str) -> Result<Gamification> {
        Ok(self.db.get_gamification(user_id)?.unwrap_or_default())
    }
}
