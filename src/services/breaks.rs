// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Break state machine.
//!
//! Per participant the cycle is NoBreak -> OnBreak -> NoBreak; an active
//! break whose deadline has passed is overdue and escalates at most once per
//! episode. Transition legality is decided against wall-clock time here, and
//! each state write is a single conditional UPDATE, so two racing callers
//! (or the sweeper and a polling client) cannot double-apply a transition.
//!
//! All time math is integer seconds, floored, never negative.

use crate::db::{Db, OverdueBreak};
use crate::error::{AppError, Result};
use crate::models::Participant;
use crate::services::notifier::EmailNotifier;
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339, seconds_between};
use chrono::{Duration, Utc};
use serde::Serialize;

/// Break mode exists only for sessions of at least this configured length.
pub const MIN_BREAK_ELIGIBLE_SECONDS: i64 = 3 * 60 * 60;
/// Breaks unlock this long after the session clock starts.
pub const BREAK_UNLOCK_DELAY_SECONDS: i64 = 60 * 60;
/// Relaxation budget per break.
pub const MAX_RELAXATIONS: i64 = 3;
/// Fixed size of one relaxation grant.
pub const EXTENSION_MINUTES: i64 = 5;

pub const MIN_BREAK_MINUTES: i64 = 1;
pub const MAX_BREAK_MINUTES: i64 = 240;

/// Why an escalation attempt was a no-op. Stable strings: clients poll on
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationSkip {
    BreakNotActive,
    BreakNotOverdue,
    AlreadyEscalated,
}

impl EscalationSkip {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationSkip::BreakNotActive => "break_not_active",
            EscalationSkip::BreakNotOverdue => "break_not_overdue",
            EscalationSkip::AlreadyEscalated => "already_escalated",
        }
    }
}

/// Result of an escalation attempt.
#[derive(Debug)]
pub struct EscalationOutcome {
    pub escalated: bool,
    pub reason: Option<EscalationSkip>,
    pub email_sent: bool,
    pub group_alerts_sent: u32,
}

impl EscalationOutcome {
    fn skipped(reason: EscalationSkip) -> Self {
        Self {
            escalated: false,
            reason: Some(reason),
            email_sent: false,
            group_alerts_sent: 0,
        }
    }
}

/// Result of returning from a break.
#[derive(Debug)]
pub struct ReturnOutcome {
    pub overdue_seconds: i64,
    pub recovery_applied: bool,
}

/// Break state machine over one participant within one session.
#[derive(Clone)]
pub struct BreakService {
    db: Db,
    notifier: EmailNotifier,
    frontend_url: String,
}

impl BreakService {
    pub fn new(db: Db, notifier: EmailNotifier, frontend_url: String) -> Self {
        Self {
            db,
            notifier,
            frontend_url,
        }
    }

    /// Start a break of `duration_minutes`.
    ///
    /// Gates, in order: session exists and is live and started, session long
    /// enough for break mode, unlock delay elapsed, caller joined, no break
    /// already active.
    pub fn start_break(
        &self,
        session_id: &str,
        user_id: &str,
        duration_minutes: i64,
    ) -> Result<()> {
        if !(MIN_BREAK_MINUTES..=MAX_BREAK_MINUTES).contains(&duration_minutes) {
            return Err(AppError::Validation(
                "durationMinutes must be between 1 and 240".to_string(),
            ));
        }

        let session = self
            .db
            .get_session(session_id)?
            .ok_or_else(|| AppError::NotFound("Session not found.".to_string()))?;
        if session.is_ended() {
            return Err(AppError::InvalidState("Session already ended.".to_string()));
        }
        let started_at = session
            .started_at
            .as_deref()
            .and_then(parse_utc_rfc3339)
            .ok_or_else(|| {
                AppError::InvalidState("Session has not started yet.".to_string())
            })?;
        if session.duration_seconds.unwrap_or(0) < MIN_BREAK_ELIGIBLE_SECONDS {
            return Err(AppError::InvalidState(
                "Break mode is available only for sessions of 3 hours or longer.".to_string(),
            ));
        }

        let now = Utc::now();
        let unlock_at = started_at + Duration::seconds(BREAK_UNLOCK_DELAY_SECONDS);
        if unlock_at > now {
            return Err(AppError::BreakLocked {
                unlock_in_seconds: seconds_between(now, unlock_at),
            });
        }

        let entry = self.participant(session_id, user_id)?;

        let ends_at = now + Duration::minutes(duration_minutes);
        let started = self.db.start_break(
            &entry.id,
            &format_utc_rfc3339(now),
            &format_utc_rfc3339(ends_at),
        )?;
        if !started {
            return Err(AppError::InvalidState("Break is already active.".to_string()));
        }

        tracing::info!(session_id, user_id, duration_minutes, "Break started");
        Ok(())
    }

    /// Extend the active break by one fixed relaxation grant.
    pub fn extend_break(&self, session_id: &str, user_id: &str) -> Result<()> {
        let entry = self.participant(session_id, user_id)?;
        let session = self
            .db
            .get_session(session_id)?
            .ok_or_else(|| AppError::NotFound("Session not found.".to_string()))?;
        if session.is_ended() {
            return Err(AppError::InvalidState("Session already ended.".to_string()));
        }
        if !entry.break_active {
            return Err(AppError::InvalidState(
                "No active break to extend.".to_string(),
            ));
        }
        if entry.break_relaxations_used >= MAX_RELAXATIONS {
            return Err(AppError::InvalidState(
                "Relaxation limit reached.".to_string(),
            ));
        }

        // Extend from the later of the current deadline and now, so an
        // already-overdue break gets the full five minutes.
        let now = Utc::now();
        let base = entry
            .break_ends_at
            .as_deref()
            .and_then(parse_utc_rfc3339)
            .map_or(now, |ends| ends.max(now));
        let new_ends_at = base + Duration::minutes(EXTENSION_MINUTES);

        let extended =
            self.db
                .extend_break(&entry.id, &format_utc_rfc3339(new_ends_at), MAX_RELAXATIONS)?;
        if !extended {
            // Lost a race against a concurrent extend or return.
            return Err(AppError::InvalidState(
                "Relaxation limit reached.".to_string(),
            ));
        }

        tracing::info!(
            session_id,
            user_id,
            relaxations_used = entry.break_relaxations_used + 1,
            "Break extended"
        );
        Ok(())
    }

    /// Return from the active break. An overdue return must state a recovery
    /// action; a clean return earns the reliability bonus.
    pub fn return_from_break(
        &self,
        session_id: &str,
        user_id: &str,
        recovery_action: Option<&str>,
    ) -> Result<ReturnOutcome> {
        let entry = self.participant(session_id, user_id)?;
        if !entry.break_active {
            return Err(AppError::InvalidState(
                "No active break to return from.".to_string(),
            ));
        }

        let now = Utc::now();
        let paused_seconds = entry
            .break_started_at
            .as_deref()
            .and_then(parse_utc_rfc3339)
            .map_or(0, |started| seconds_between(started, now));
        let overdue_seconds = entry
            .break_ends_at
            .as_deref()
            .and_then(parse_utc_rfc3339)
            .map_or(0, |ends| seconds_between(ends, now));

        let is_recovery_return = overdue_seconds > 0;
        let recovery_action = recovery_action.map(str::trim).unwrap_or_default();
        if is_recovery_return && recovery_action.is_empty() {
            return Err(AppError::Validation(
                "Recovery action is required when returning after overdue break.".to_string(),
            ));
        }

        let finished = self.db.finish_break(&entry.id, paused_seconds)?;
        if !finished {
            return Err(AppError::InvalidState(
                "No active break to return from.".to_string(),
            ));
        }

        // Recovery does not restore the reliability already lost at
        // escalation time; only a clean return earns the bonus.
        self.db.apply_return_scoring(
            user_id,
            !is_recovery_return,
            &format_utc_rfc3339(now),
        )?;

        tracing::info!(
            session_id,
            user_id,
            overdue_seconds,
            recovery = is_recovery_return,
            "Returned from break"
        );

        Ok(ReturnOutcome {
            overdue_seconds,
            recovery_applied: is_recovery_return,
        })
    }

    /// Escalate an overdue break, at most once per episode.
    ///
    /// Non-escalating calls are successes with a skip reason so clients can
    /// poll. Notification failures never fail the transition.
    pub async fn escalate(
        &self,
        session_id: &str,
        user_id: &str,
        user_name: &str,
        user_email: Option<&str>,
    ) -> Result<EscalationOutcome> {
        let entry = self.participant(session_id, user_id)?;

        // An ended session terminates the break cycle; nothing to escalate.
        // Keeps the endpoint consistent with the sweep, which also skips
        // ended sessions.
        let session_ended = self
            .db
            .get_session(session_id)?
            .is_none_or(|session| session.is_ended());
        if session_ended || !entry.break_active {
            return Ok(EscalationOutcome::skipped(EscalationSkip::BreakNotActive));
        }
        let now = Utc::now();
        let overdue = entry
            .break_ends_at
            .as_deref()
            .and_then(parse_utc_rfc3339)
            .is_some_and(|ends| ends < now);
        if !overdue {
            return Ok(EscalationOutcome::skipped(EscalationSkip::BreakNotOverdue));
        }
        if entry.break_escalated_at.is_some() {
            return Ok(EscalationOutcome::skipped(EscalationSkip::AlreadyEscalated));
        }

        self.commit_escalation(session_id, &entry.id, user_id, user_name, user_email)
            .await
    }

    /// CAS the escalation marker, apply the penalty, then notify.
    async fn commit_escalation(
        &self,
        session_id: &str,
        participant_id: &str,
        user_id: &str,
        user_name: &str,
        user_email: Option<&str>,
    ) -> Result<EscalationOutcome> {
        let now = format_utc_rfc3339(Utc::now());
        let marked = self.db.mark_break_escalated(participant_id, &now)?;
        if !marked {
            // Another detector (poll or sweep) got here first.
            return Ok(EscalationOutcome::skipped(EscalationSkip::AlreadyEscalated));
        }

        self.db.apply_escalation_penalty(user_id, &now)?;
        tracing::info!(session_id, user_id, "Break escalated");

        // Escalation state is committed; everything below is best-effort.
        let session_url = format!(
            "{}/focus-sessions/{}",
            self.frontend_url,
            urlencoding::encode(session_id)
        );

        let mut email_sent = false;
        if let Some(email) = user_email {
            email_sent = self
                .notifier
                .send(
                    email,
                    "FocusFlow: Break over, get back to work",
                    &format!("Your break is over. Return to your session: {}", session_url),
                    &format!(
                        "<p>Your break is over.</p><p><a href=\"{}\">Return to FocusFlow session</a></p>",
                        session_url
                    ),
                )
                .await;
        }

        let group_alerts_sent = self
            .send_group_alerts(session_id, user_name, user_email, &session_url)
            .await;

        Ok(EscalationOutcome {
            escalated: true,
            reason: None,
            email_sent,
            group_alerts_sent,
        })
    }

    /// Alert the other admins of the linked team's group, if any.
    async fn send_group_alerts(
        &self,
        session_id: &str,
        user_name: &str,
        user_email: Option<&str>,
        session_url: &str,
    ) -> u32 {
        let (session_name, team_session_id) = match self.db.get_session(session_id) {
            Ok(Some(session)) => (session.name, session.team_session_id),
            Ok(None) => return 0,
            Err(err) => {
                tracing::warn!(session_id, error = %err, "Group alert session lookup failed");
                return 0;
            }
        };
        let Some(team_id) = team_session_id else {
            return 0;
        };

        let admin_emails = match self.db.group_admin_emails(&team_id) {
            Ok(emails) => emails,
            Err(err) => {
                tracing::warn!(session_id, error = %err, "Group alert admin lookup failed");
                return 0;
            }
        };

        let triggering = user_email.map(str::to_lowercase);
        let mut sent = 0;
        for email in admin_emails {
            let email = email.trim().to_string();
            if email.is_empty() || Some(email.to_lowercase()) == triggering {
                continue;
            }
            let delivered = self
                .notifier
                .send(
                    &email,
                    "FocusFlow Group Alert: Member overdue from break",
                    &format!(
                        "{} is overdue from break in session \"{}\". {}",
                        user_name, session_name, session_url
                    ),
                    &format!(
                        "<p><strong>{}</strong> is overdue from break in session <strong>{}</strong>.</p><p><a href=\"{}\">Open session</a></p>",
                        user_name, session_name, session_url
                    ),
                )
                .await;
            if delivered {
                sent += 1;
            }
        }
        sent
    }

    /// One pass of the server-side overdue sweep: run the same escalation
    /// transition for every overdue, unescalated break in a live session.
    /// Returns how many breaks escalated.
    pub async fn sweep_once(&self) -> Result<u32> {
        let now = format_utc_rfc3339(Utc::now());
        let overdue = self.db.list_overdue_breaks(&now)?;

        let mut escalated = 0;
        for OverdueBreak {
            session_id,
            participant_id,
            user_id,
        } in overdue
        {
            let user = self.db.get_user(&user_id)?;
            let (user_name, user_email) = match &user {
                Some(u) => (
                    u.name.clone().unwrap_or_else(|| user_id.clone()),
                    u.email.clone(),
                ),
                None => (user_id.clone(), None),
            };

            match self
                .commit_escalation(
                    &session_id,
                    &participant_id,
                    &user_id,
                    &user_name,
                    user_email.as_deref(),
                )
                .await
            {
                Ok(outcome) if outcome.escalated => escalated += 1,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        session_id = %session_id,
                        user_id = %user_id,
                        error = %err,
                        "Sweep escalation failed"
                    );
                }
            }
        }

        if escalated > 0 {
            tracing::info!(escalated, "Overdue-break sweep escalated participants");
        }
        Ok(escalated)
    }

    /// Run the sweep forever on a fixed interval. Spawned at startup.
    pub async fn run_sweeper(self, interval_seconds: u64) {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(interval_seconds.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.sweep_once().await {
                tracing::warn!(error = %err, "Overdue-break sweep failed");
            }
        }
    }

    fn participant(&self, session_id: &str, user_id: &str) -> Result<Participant> {
        self.db
            .get_participant(session_id, user_id)?
            .ok_or_else(|| AppError::InvalidState("Join the session first.".to_string()))
    }
}
