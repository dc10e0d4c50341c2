// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Focus session and participant rows.
//!
//! Field names are the wire names: rows serialize straight into API
//! responses. Timestamps are RFC3339 strings (see `time_utils`).

use serde::{Deserialize, Serialize};

/// A shared timed work block with one admin and zero-or-more participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub id: String,
    pub name: String,
    pub admin_user_id: Option<String>,
    pub duration_seconds: Option<i64>,
    pub goal: Option<String>,
    /// Legacy session-level recap; participant recaps live on `Participant`.
    pub recap: Option<String>,
    pub team_session_id: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
}

impl FocusSession {
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// One user's membership and break/recap state within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub focus_session_id: String,
    pub user_id: Option<String>,
    pub user_name: String,
    pub goal: String,
    pub recap: Option<String>,
    pub break_active: bool,
    pub break_started_at: Option<String>,
    pub break_ends_at: Option<String>,
    pub break_relaxations_used: i64,
    /// Accumulated seconds across completed breaks.
    pub break_paused_seconds: i64,
    pub break_escalated_at: Option<String>,
}

/// One row of the session list view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListEntry {
    pub id: String,
    pub name: String,
    pub admin_user_id: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub duration_seconds: Option<i64>,
    pub participant_count: i64,
    pub is_admin: bool,
}
