// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Per-user focus/reliability state and the pure scoring rules.
//!
//! Scores are bounded to [0, 100] on every update; the pure functions here
//! are the single place the bounds and deltas are defined, and the SQL
//! upserts in the storage layer mirror them with `MIN`/`MAX` clamps.

use serde::{Deserialize, Serialize};

pub const SCORE_MIN: i64 = 0;
pub const SCORE_MAX: i64 = 100;

/// Baselines applied on the first write for a user.
pub const DEFAULT_FOCUS_SCORE: i64 = 80;
pub const DEFAULT_RELIABILITY_SCORE: i64 = 100;

/// Per-user cross-session focus state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusState {
    pub user_id: String,
    pub last_activity_at: Option<String>,
    pub focus_score: i64,
    pub reliability_score: i64,
    pub overdue_count: i64,
    pub last_overdue_at: Option<String>,
}

impl FocusState {
    /// Baseline row for a user with no recorded state yet.
    pub fn baseline(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            last_activity_at: None,
            focus_score: DEFAULT_FOCUS_SCORE,
            reliability_score: DEFAULT_RELIABILITY_SCORE,
            overdue_count: 0,
            last_overdue_at: None,
        }
    }
}

/// Clamp a score into [0, 100].
pub fn clamp_score(value: i64) -> i64 {
    value.clamp(SCORE_MIN, SCORE_MAX)
}

/// Delta applied by an activity ping, from idle time and event kind.
///
/// Longer idle gaps cost more; a `focus` event earns one extra point on top
/// of the base delta.
pub fn activity_delta(idle_seconds: i64, is_focus_event: bool) -> i64 {
    let mut delta = if idle_seconds > 600 {
        -8
    } else if idle_seconds > 300 {
        -4
    } else if idle_seconds > 120 {
        -2
    } else {
        1
    };
    if is_focus_event {
        delta += 1;
    }
    delta
}

/// Direction of a score series, comparing first vs last of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTrend {
    Up,
    Down,
    Stable,
}

impl ScoreTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTrend::Up => "up",
            ScoreTrend::Down => "down",
            ScoreTrend::Stable => "stable",
        }
    }
}

/// Trend over chronologically ordered score points.
/// Fewer than 2 points is always `stable`.
pub fn score_trend(points: &[i64]) -> ScoreTrend {
    if points.len() < 2 {
        return ScoreTrend::Stable;
    }
    let first = points[0];
    let last = points[points.len() - 1];
    if last > first {
        ScoreTrend::Up
    } else if last < first {
        ScoreTrend::Down
    } else {
        ScoreTrend::Stable
    }
}
