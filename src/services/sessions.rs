// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Session lifecycle: create, join, end, recap, view, list, hide.
//!
//! The session clock starts on the first join, which also seats the admin.
//! Ending is admin-only and idempotent. Submitting a recap also marks the
//! shared session ended, a quirk inherited from the product and kept on
//! purpose (see DESIGN.md).

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{FocusSession, Participant, SessionListEntry};
use crate::time_utils::format_utc_rfc3339;
use chrono::Utc;
use serde::Serialize;

const SESSION_LIST_LIMIT: u32 = 30;

pub const MIN_SESSION_MINUTES: i64 = 1;
pub const MAX_SESSION_MINUTES: i64 = 240;

/// Everything a client needs to render one session screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session: FocusSession,
    pub participants: Vec<Participant>,
    pub current_user_entry: Option<Participant>,
    pub is_admin: bool,
}

/// Session lifecycle controller.
#[derive(Clone)]
pub struct SessionService {
    db: Db,
}

impl SessionService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a session. The clock does not start and no admin is seated
    /// until the first join.
    pub fn create_session(
        &self,
        user: &AuthUser,
        name: &str,
        duration_minutes: i64,
        team_session_id: Option<&str>,
    ) -> Result<FocusSession> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Session name is required".to_string()));
        }
        if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&duration_minutes) {
            return Err(AppError::Validation(
                "durationMinutes must be between 1 and 240".to_string(),
            ));
        }

        let team_session_id = normalize_opt(team_session_id);
        if let Some(team_id) = team_session_id.as_deref() {
            self.db.insert_team_session(team_id)?;
        }

        let session = FocusSession {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            admin_user_id: None,
            duration_seconds: Some(duration_minutes * 60),
            goal: None,
            recap: None,
            team_session_id,
            created_at: format_utc_rfc3339(Utc::now()),
            started_at: None,
            ended_at: None,
        };
        self.db.insert_session(&session)?;

        tracing::info!(
            session_id = %session.id,
            user_id = %user.user_id,
            duration_minutes,
            "Focus session created"
        );

        Ok(session)
    }

    /// Sessions visible to the viewer (hidden rows excluded).
    pub fn list_sessions(&self, viewer_id: &str) -> Result<Vec<SessionListEntry>> {
        self.db.list_sessions_for(viewer_id, SESSION_LIST_LIMIT)
    }

    /// Join a session: first joiner starts the clock and becomes admin;
    /// rejoining refreshes the participant's goal.
    pub fn join_session(
        &self,
        user: &AuthUser,
        session_id: &str,
        goal: &str,
        team_session_id: Option<&str>,
    ) -> Result<()> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(AppError::Validation("Goal is required".to_string()));
        }

        let team_session_id = normalize_opt(team_session_id);
        if let Some(team_id) = team_session_id.as_deref() {
            self.db.insert_team_session(team_id)?;
        }

        let session = self
            .db
            .get_session(session_id)?
            .ok_or_else(|| {
                AppError::NotFound("Session not found. Ask admin to create one first.".to_string())
            })?;
        if session.is_ended() {
            return Err(AppError::InvalidState(
                "This session has ended. You can view recap but cannot join.".to_string(),
            ));
        }

        let now = format_utc_rfc3339(Utc::now());
        self.db.start_session_on_join(
            session_id,
            goal,
            &user.user_id,
            team_session_id.as_deref(),
            &now,
        )?;

        match self.db.get_participant(session_id, &user.user_id)? {
            Some(existing) => self.db.update_participant_goal(&existing.id, goal)?,
            None => {
                let participant = Participant {
                    id: uuid::Uuid::new_v4().to_string(),
                    focus_session_id: session_id.to_string(),
                    user_id: Some(user.user_id.clone()),
                    user_name: user.display_name(),
                    goal: goal.to_string(),
                    recap: None,
                    break_active: false,
                    break_started_at: None,
                    break_ends_at: None,
                    break_relaxations_used: 0,
                    break_paused_seconds: 0,
                    break_escalated_at: None,
                };
                self.db.insert_participant(&participant)?;
            }
        }

        tracing::info!(session_id, user_id = %user.user_id, "Joined focus session");
        Ok(())
    }

    /// End a session. Admin only; repeat calls are no-op successes.
    pub fn end_session(&self, user_id: &str, session_id: &str) -> Result<()> {
        let session = self
            .db
            .get_session(session_id)?
            .ok_or_else(|| AppError::NotFound("Session not found.".to_string()))?;

        if session.admin_user_id.as_deref() != Some(user_id) {
            return Err(AppError::Forbidden(
                "Only admin can end this session.".to_string(),
            ));
        }

        self.db
            .end_session(session_id, &format_utc_rfc3339(Utc::now()))?;
        tracing::info!(session_id, user_id, "Focus session ended");
        Ok(())
    }

    /// Session detail view for one viewer.
    pub fn view_session(&self, viewer_id: &str, session_id: &str) -> Result<SessionView> {
        let session = self
            .db
            .get_session(session_id)?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        let participants = self.db.list_participants(session_id)?;
        let current_user_entry = participants
            .iter()
            .find(|p| p.user_id.as_deref() == Some(viewer_id))
            .cloned();
        let is_admin = session.admin_user_id.as_deref() == Some(viewer_id);

        Ok(SessionView {
            session,
            participants,
            current_user_entry,
            is_admin,
        })
    }

    /// Record the caller's recap. The first submission awards points and
    /// advances the streak; every submission marks the session ended.
    pub fn submit_recap(&self, user_id: &str, session_id: &str, recap: &str) -> Result<()> {
        let recap = recap.trim();
        if recap.is_empty() {
            return Err(AppError::Validation("Recap is required".to_string()));
        }

        let entry = self
            .db
            .get_participant(session_id, user_id)?
            .ok_or_else(|| AppError::InvalidState("Join the session first.".to_string()))?;

        self.db.set_participant_recap(&entry.id, recap)?;

        if entry.recap.is_none() {
            let now = Utc::now();
            let mut stats = self.db.get_gamification(user_id)?.unwrap_or_default();
            stats.apply_recap_award(now.date_naive());
            self.db
                .upsert_gamification(user_id, &stats, &format_utc_rfc3339(now))?;
            tracing::info!(
                session_id,
                user_id,
                streak = stats.current_streak,
                "First recap recorded, gamification updated"
            );
        }

        // First recap closes the shared session clock for everyone.
        self.db
            .end_session(session_id, &format_utc_rfc3339(Utc::now()))?;
        Ok(())
    }

    /// Hide an ended session from the viewer's list. The shared row stays.
    pub fn hide_session(&self, viewer_id: &str, session_id: &str) -> Result<()> {
        let session = self
            .db
            .get_session(session_id)?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
        if !session.is_ended() {
            return Err(AppError::InvalidState(
                "Only ended sessions can be deleted.".to_string(),
            ));
        }

        self.db.hide_session(
            &uuid::Uuid::new_v4().to_string(),
            viewer_id,
            session_id,
        )?;
        Ok(())
    }
}

fn normalize_opt(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
