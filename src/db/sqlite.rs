// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! SQLite wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Focus sessions and participants (lifecycle + break sub-state)
//! - Per-user focus/reliability state and the score log
//! - Gamification aggregates
//! - Read-only lookups against the identity/group collaborator tables
//!
//! Every mutation is a single statement. Where a check-then-write race would
//! matter (break transitions), the check lives in the statement's WHERE
//! clause and callers branch on the affected-row count.

use crate::db::migrations::run_migrations;
use crate::error::AppError;
use crate::models::focus_state::{DEFAULT_FOCUS_SCORE, DEFAULT_RELIABILITY_SCORE};
use crate::models::{FocusSession, Gamification, Participant, SessionListEntry};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, PoisonError};

/// Reliability/focus deltas for break outcomes. The clamps live in the SQL.
const RETURN_FOCUS_BONUS: i64 = 2;
const RETURN_RELIABILITY_BONUS: i64 = 3;
const ESCALATION_FOCUS_PENALTY: i64 = 5;
const ESCALATION_RELIABILITY_PENALTY: i64 = 10;

/// An overdue, unescalated break found by the sweep scan.
#[derive(Debug, Clone)]
pub struct OverdueBreak {
    pub session_id: String,
    pub participant_id: String,
    pub user_id: String,
}

/// Minimal view of an identity-provider user row.
#[derive(Debug, Clone)]
pub struct UserRef {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// SQLite database handle, cheap to clone.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: &str) -> Result<Self, AppError> {
        let conn = Connection::open(path)
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;
        run_migrations(&conn)?;

        tracing::info!(path, "Database ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection.
    ///
    /// The lock is held only for the closure's duration; a poisoned lock is
    /// recovered since SQLite state cannot be corrupted by a Rust panic in
    /// another handler.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, AppError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn).map_err(AppError::from)
    }

    // ─── Session Operations ──────────────────────────────────────

    /// Insert a newly created session row.
    pub fn insert_session(&self, session: &FocusSession) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO "FocusSession"
                    ("id", "name", "adminUserId", "durationSeconds", "goal", "recap",
                     "teamSessionId", "createdAt", "startedAt", "endedAt")
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    session.id,
                    session.name,
                    session.admin_user_id,
                    session.duration_seconds,
                    session.goal,
                    session.recap,
                    session.team_session_id,
                    session.created_at,
                    session.started_at,
                    session.ended_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Get a session by id.
    pub fn get_session(&self, session_id: &str) -> Result<Option<FocusSession>, AppError> {
        self.with_conn(|conn| {
            conn.query_row(
                r#"
                SELECT "id", "name", "adminUserId", "durationSeconds", "goal", "recap",
                       "teamSessionId", "createdAt", "startedAt", "endedAt"
                FROM "FocusSession"
                WHERE "id" = ?1
                "#,
                params![session_id],
                map_session,
            )
            .optional()
        })
    }

    /// List sessions visible to `viewer_id`, most recent first.
    ///
    /// Rows the viewer has hidden are excluded; each row carries its
    /// participant count and whether the viewer is admin.
    pub fn list_sessions_for(
        &self,
        viewer_id: &str,
        limit: u32,
    ) -> Result<Vec<SessionListEntry>, AppError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    fs."id",
                    fs."name",
                    fs."adminUserId",
                    fs."createdAt",
                    fs."startedAt",
                    fs."endedAt",
                    fs."durationSeconds",
                    COUNT(uis."id") AS "participantCount"
                FROM "FocusSession" fs
                LEFT JOIN "UserInSession" uis ON uis."focusSessionId" = fs."id"
                LEFT JOIN "UserHiddenSession" uhs
                    ON uhs."sessionId" = fs."id" AND uhs."userId" = ?1
                WHERE uhs."id" IS NULL
                GROUP BY fs."id"
                ORDER BY COALESCE(fs."startedAt", fs."createdAt") DESC
                LIMIT ?2
                "#,
            )?;

            let rows = stmt.query_map(params![viewer_id, limit], |row| {
                let admin_user_id: Option<String> = row.get("adminUserId")?;
                Ok(SessionListEntry {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    is_admin: admin_user_id.as_deref() == Some(viewer_id),
                    admin_user_id,
                    created_at: row.get("createdAt")?,
                    started_at: row.get("startedAt")?,
                    ended_at: row.get("endedAt")?,
                    duration_seconds: row.get("durationSeconds")?,
                    participant_count: row.get("participantCount")?,
                })
            })?;

            rows.collect()
        })
    }

    /// First-join bookkeeping: start the clock, seat the admin and back-fill
    /// the session goal / team link, each only if currently unset.
    pub fn start_session_on_join(
        &self,
        session_id: &str,
        goal: &str,
        admin_user_id: &str,
        team_session_id: Option<&str>,
        now: &str,
    ) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                UPDATE "FocusSession"
                SET "startedAt" = COALESCE("startedAt", ?2),
                    "goal" = COALESCE("goal", ?3),
                    "adminUserId" = COALESCE("adminUserId", ?4),
                    "teamSessionId" = COALESCE("teamSessionId", ?5)
                WHERE "id" = ?1
                "#,
                params![session_id, now, goal, admin_user_id, team_session_id],
            )?;
            Ok(())
        })
    }

    /// Mark a session ended. Idempotent: an already-ended session keeps its
    /// original `endedAt`.
    pub fn end_session(&self, session_id: &str, now: &str) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                UPDATE "FocusSession"
                SET "endedAt" = COALESCE("endedAt", ?2)
                WHERE "id" = ?1
                "#,
                params![session_id, now],
            )?;
            Ok(())
        })
    }

    /// Idempotent insert of a team grouping row.
    pub fn insert_team_session(&self, team_session_id: &str) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"INSERT OR IGNORE INTO "TeamFocusSession" ("id") VALUES (?1)"#,
                params![team_session_id],
            )?;
            Ok(())
        })
    }

    /// Hide a session from one viewer's list. Idempotent.
    pub fn hide_session(
        &self,
        id: &str,
        viewer_id: &str,
        session_id: &str,
    ) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT OR IGNORE INTO "UserHiddenSession" ("id", "userId", "sessionId")
                VALUES (?1, ?2, ?3)
                "#,
                params![id, viewer_id, session_id],
            )?;
            Ok(())
        })
    }

    // ─── Participant Operations ──────────────────────────────────

    /// Get a participant row by session and user.
    pub fn get_participant(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<Participant>, AppError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    r#"{PARTICIPANT_SELECT} WHERE "focusSessionId" = ?1 AND "userId" = ?2"#
                ),
                params![session_id, user_id],
                map_participant,
            )
            .optional()
        })
    }

    /// List all participants of a session, insertion order.
    pub fn list_participants(&self, session_id: &str) -> Result<Vec<Participant>, AppError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                r#"{PARTICIPANT_SELECT} WHERE "focusSessionId" = ?1 ORDER BY rowid ASC"#
            ))?;
            let rows = stmt.query_map(params![session_id], map_participant)?;
            rows.collect()
        })
    }

    /// Insert a participant row (join).
    pub fn insert_participant(&self, participant: &Participant) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO "UserInSession"
                    ("id", "focusSessionId", "userId", "userName", "goal")
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    participant.id,
                    participant.focus_session_id,
                    participant.user_id,
                    participant.user_name,
                    participant.goal,
                ],
            )?;
            Ok(())
        })
    }

    /// Refresh the goal of an existing participant (rejoin).
    pub fn update_participant_goal(
        &self,
        participant_id: &str,
        goal: &str,
    ) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"UPDATE "UserInSession" SET "goal" = ?2 WHERE "id" = ?1"#,
                params![participant_id, goal],
            )?;
            Ok(())
        })
    }

    /// Write a participant's recap (always overwritable).
    pub fn set_participant_recap(
        &self,
        participant_id: &str,
        recap: &str,
    ) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"UPDATE "UserInSession" SET "recap" = ?2 WHERE "id" = ?1"#,
                params![participant_id, recap],
            )?;
            Ok(())
        })
    }

    // ─── Break Transitions ───────────────────────────────────────
    //
    // Each transition is one conditional UPDATE; `false` means the guard in
    // the WHERE clause did not hold (lost race or illegal state).

    /// Start a break. Fails if one is already active.
    pub fn start_break(
        &self,
        participant_id: &str,
        now: &str,
        ends_at: &str,
    ) -> Result<bool, AppError> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                r#"
                UPDATE "UserInSession"
                SET "breakActive" = 1,
                    "breakStartedAt" = ?2,
                    "breakEndsAt" = ?3,
                    "breakRelaxationsUsed" = 0,
                    "breakEscalatedAt" = NULL
                WHERE "id" = ?1 AND "breakActive" = 0
                "#,
                params![participant_id, now, ends_at],
            )?;
            Ok(affected > 0)
        })
    }

    /// Extend the active break, consuming one relaxation. The relaxation
    /// budget check is part of the statement so concurrent extends cannot
    /// overrun it.
    pub fn extend_break(
        &self,
        participant_id: &str,
        new_ends_at: &str,
        max_relaxations: i64,
    ) -> Result<bool, AppError> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                r#"
                UPDATE "UserInSession"
                SET "breakEndsAt" = ?2,
                    "breakRelaxationsUsed" = "breakRelaxationsUsed" + 1,
                    "breakEscalatedAt" = NULL
                WHERE "id" = ?1
                  AND "breakActive" = 1
                  AND "breakRelaxationsUsed" < ?3
                "#,
                params![participant_id, new_ends_at, max_relaxations],
            )?;
            Ok(affected > 0)
        })
    }

    /// Return from the active break, folding its elapsed seconds into the
    /// pause total.
    pub fn finish_break(
        &self,
        participant_id: &str,
        paused_seconds: i64,
    ) -> Result<bool, AppError> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                r#"
                UPDATE "UserInSession"
                SET "breakActive" = 0,
                    "breakStartedAt" = NULL,
                    "breakEndsAt" = NULL,
                    "breakPausedSeconds" = "breakPausedSeconds" + ?2,
                    "breakEscalatedAt" = NULL
                WHERE "id" = ?1 AND "breakActive" = 1
                "#,
                params![participant_id, paused_seconds],
            )?;
            Ok(affected > 0)
        })
    }

    /// Stamp the one-time escalation marker for an overdue break.
    ///
    /// All escalation preconditions are in the WHERE clause, so concurrent
    /// detectors (endpoint poll and sweeper) commit at most one escalation
    /// per overdue episode.
    pub fn mark_break_escalated(&self, participant_id: &str, now: &str) -> Result<bool, AppError> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                r#"
                UPDATE "UserInSession"
                SET "breakEscalatedAt" = ?2
                WHERE "id" = ?1
                  AND "breakActive" = 1
                  AND "breakEscalatedAt" IS NULL
                  AND "breakEndsAt" IS NOT NULL
                  AND "breakEndsAt" < ?2
                "#,
                params![participant_id, now],
            )?;
            Ok(affected > 0)
        })
    }

    /// Scan for overdue, unescalated breaks in live sessions (sweep input).
    pub fn list_overdue_breaks(&self, now: &str) -> Result<Vec<OverdueBreak>, AppError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT uis."focusSessionId", uis."id", uis."userId"
                FROM "UserInSession" uis
                INNER JOIN "FocusSession" fs ON fs."id" = uis."focusSessionId"
                WHERE uis."breakActive" = 1
                  AND uis."breakEscalatedAt" IS NULL
                  AND uis."breakEndsAt" IS NOT NULL
                  AND uis."breakEndsAt" < ?1
                  AND uis."userId" IS NOT NULL
                  AND fs."endedAt" IS NULL
                "#,
            )?;
            let rows = stmt.query_map(params![now], |row| {
                Ok(OverdueBreak {
                    session_id: row.get(0)?,
                    participant_id: row.get(1)?,
                    user_id: row.get(2)?,
                })
            })?;
            rows.collect()
        })
    }

    // ─── Focus State / Scoring ───────────────────────────────────

    /// Get a user's focus state row.
    pub fn get_focus_state(
        &self,
        user_id: &str,
    ) -> Result<Option<crate::models::FocusState>, AppError> {
        self.with_conn(|conn| {
            conn.query_row(
                r#"
                SELECT "userId", "lastActivityAt", "focusScore", "reliabilityScore",
                       "overdueCount", "lastOverdueAt"
                FROM "UserFocusState"
                WHERE "userId" = ?1
                "#,
                params![user_id],
                |row| {
                    Ok(crate::models::FocusState {
                        user_id: row.get("userId")?,
                        last_activity_at: row.get("lastActivityAt")?,
                        focus_score: row.get("focusScore")?,
                        reliability_score: row.get("reliabilityScore")?,
                        overdue_count: row.get("overdueCount")?,
                        last_overdue_at: row.get("lastOverdueAt")?,
                    })
                },
            )
            .optional()
        })
    }

    /// Record an activity ping: absolute new focus score plus activity stamp.
    /// Other columns keep their defaults on first write.
    pub fn record_activity_ping(
        &self,
        user_id: &str,
        new_score: i64,
        now: &str,
    ) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO "UserFocusState" ("userId", "lastActivityAt", "focusScore", "updatedAt")
                VALUES (?1, ?2, ?3, ?2)
                ON CONFLICT("userId") DO UPDATE SET
                    "lastActivityAt" = excluded."lastActivityAt",
                    "focusScore" = excluded."focusScore",
                    "updatedAt" = excluded."updatedAt"
                "#,
                params![user_id, now, new_score],
            )?;
            Ok(())
        })
    }

    /// Append an immutable score-log entry.
    pub fn append_score_log(
        &self,
        log_id: &str,
        user_id: &str,
        score: i64,
        now: &str,
    ) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO "UserFocusScoreLog" ("id", "userId", "score", "createdAt")
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![log_id, user_id, score, now],
            )?;
            Ok(())
        })
    }

    /// Most recent score-log entries, newest first. Ties on the
    /// second-resolution timestamp break on insertion order.
    pub fn recent_scores(&self, user_id: &str, limit: u32) -> Result<Vec<i64>, AppError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT "score"
                FROM "UserFocusScoreLog"
                WHERE "userId" = ?1
                ORDER BY "createdAt" DESC, rowid DESC
                LIMIT ?2
                "#,
            )?;
            let rows = stmt.query_map(params![user_id, limit], |row| row.get(0))?;
            rows.collect()
        })
    }

    /// Scoring for a break return. A clean return earns a reliability bonus
    /// on top of the focus bonus; a recovery return earns focus only.
    pub fn apply_return_scoring(
        &self,
        user_id: &str,
        clean_return: bool,
        now: &str,
    ) -> Result<(), AppError> {
        let reliability_bonus = if clean_return {
            RETURN_RELIABILITY_BONUS
        } else {
            0
        };
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO "UserFocusState"
                    ("userId", "lastActivityAt", "focusScore", "reliabilityScore", "updatedAt")
                VALUES (?1, ?2, MIN(100, ?3 + ?5), MIN(100, ?4 + ?6), ?2)
                ON CONFLICT("userId") DO UPDATE SET
                    "lastActivityAt" = excluded."lastActivityAt",
                    "focusScore" = MIN(100, MAX(0, "focusScore" + ?5)),
                    "reliabilityScore" = MIN(100, MAX(0, "reliabilityScore" + ?6)),
                    "updatedAt" = excluded."updatedAt"
                "#,
                params![
                    user_id,
                    now,
                    DEFAULT_FOCUS_SCORE,
                    DEFAULT_RELIABILITY_SCORE,
                    RETURN_FOCUS_BONUS,
                    reliability_bonus,
                ],
            )?;
            Ok(())
        })
    }

    /// One-time escalation penalty: focus and reliability drop, overdue
    /// counter and timestamp advance.
    pub fn apply_escalation_penalty(&self, user_id: &str, now: &str) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO "UserFocusState"
                    ("userId", "lastActivityAt", "focusScore", "reliabilityScore",
                     "overdueCount", "lastOverdueAt", "updatedAt")
                VALUES (?1, ?2, MAX(0, ?3 - ?5), MAX(0, ?4 - ?6), 1, ?2, ?2)
                ON CONFLICT("userId") DO UPDATE SET
                    "focusScore" = MIN(100, MAX(0, "focusScore" - ?5)),
                    "reliabilityScore" = MIN(100, MAX(0, "reliabilityScore" - ?6)),
                    "overdueCount" = "overdueCount" + 1,
                    "lastOverdueAt" = ?2,
                    "updatedAt" = ?2
                "#,
                params![
                    user_id,
                    now,
                    DEFAULT_FOCUS_SCORE,
                    DEFAULT_RELIABILITY_SCORE,
                    ESCALATION_FOCUS_PENALTY,
                    ESCALATION_RELIABILITY_PENALTY,
                ],
            )?;
            Ok(())
        })
    }

    // ─── Gamification ────────────────────────────────────────────

    /// Get a user's gamification aggregate.
    pub fn get_gamification(&self, user_id: &str) -> Result<Option<Gamification>, AppError> {
        self.with_conn(|conn| {
            conn.query_row(
                r#"
                SELECT "totalPoints", "currentStreak", "longestStreak", "lastSessionDate"
                FROM "UserGamification"
                WHERE "userId" = ?1
                "#,
                params![user_id],
                |row| {
                    Ok(Gamification {
                        total_points: row.get("totalPoints")?,
                        current_streak: row.get("currentStreak")?,
                        longest_streak: row.get("longestStreak")?,
                        last_session_date: row.get("lastSessionDate")?,
                    })
                },
            )
            .optional()
        })
    }

    /// Write a user's gamification aggregate.
    pub fn upsert_gamification(
        &self,
        user_id: &str,
        stats: &Gamification,
        now: &str,
    ) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO "UserGamification"
                    ("userId", "totalPoints", "currentStreak", "longestStreak",
                     "lastSessionDate", "updatedAt")
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT("userId") DO UPDATE SET
                    "totalPoints" = excluded."totalPoints",
                    "currentStreak" = excluded."currentStreak",
                    "longestStreak" = excluded."longestStreak",
                    "lastSessionDate" = excluded."lastSessionDate",
                    "updatedAt" = excluded."updatedAt"
                "#,
                params![
                    user_id,
                    stats.total_points,
                    stats.current_streak,
                    stats.longest_streak,
                    stats.last_session_date,
                    now,
                ],
            )?;
            Ok(())
        })
    }

    // ─── Identity / Group Collaborator (read-only) ───────────────

    /// Look up a user row maintained by the identity provider.
    pub fn get_user(&self, user_id: &str) -> Result<Option<UserRef>, AppError> {
        self.with_conn(|conn| {
            conn.query_row(
                r#"SELECT "id", "name", "email" FROM "User" WHERE "id" = ?1"#,
                params![user_id],
                |row| {
                    Ok(UserRef {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Emails of a group's admins, for overdue alerts.
    pub fn group_admin_emails(&self, group_id: &str) -> Result<Vec<String>, AppError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT u."email"
                FROM "Membership" m
                INNER JOIN "User" u ON u."id" = m."userId"
                WHERE m."groupId" = ?1 AND m."role" = 'admin' AND u."email" IS NOT NULL
                "#,
            )?;
            let rows = stmt.query_map(params![group_id], |row| row.get(0))?;
            rows.collect()
        })
    }
}

const PARTICIPANT_SELECT: &str = r#"
    SELECT "id", "focusSessionId", "userId", "userName", "goal", "recap",
           "breakActive", "breakStartedAt", "breakEndsAt", "breakRelaxationsUsed",
           "breakPausedSeconds", "breakEscalatedAt"
    FROM "UserInSession"
"#;

fn map_session(row: &Row<'_>) -> rusqlite::Result<FocusSession> {
    Ok(FocusSession {
        id: row.get("id")?,
        name: row.get("name")?,
        admin_user_id: row.get("adminUserId")?,
        duration_seconds: row.get("durationSeconds")?,
        goal: row.get("goal")?,
        recap: row.get("recap")?,
        team_session_id: row.get("teamSessionId")?,
        created_at: row.get("createdAt")?,
        started_at: row.get("startedAt")?,
        ended_at: row.get("endedAt")?,
    })
}

fn map_participant(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        id: row.get("id")?,
        focus_session_id: row.get("focusSessionId")?,
        user_id: row.get("userId")?,
        user_name: row.get("userName")?,
        goal: row.get("goal")?,
        recap: row.get("recap")?,
        break_active: row.get("breakActive")?,
        break_started_at: row.get("breakStartedAt")?,
        break_ends_at: row.get("breakEndsAt")?,
        break_relaxations_used: row.get("breakRelaxationsUsed")?,
        break_paused_seconds: row.get("breakPausedSeconds")?,
        break_escalated_at: row.get("breakEscalatedAt")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FocusSession;

    fn test_session(id: &str) -> FocusSession {
        FocusSession {
            id: id.to_string(),
            name: "Deep work".to_string(),
            admin_user_id: None,
            duration_seconds: Some(4 * 3600),
            goal: None,
            recap: None,
            team_session_id: None,
            created_at: "2026-03-01T10:00:00Z".to_string(),
            started_at: None,
            ended_at: None,
        }
    }

    fn test_participant(id: &str, session_id: &str, user_id: &str) -> Participant {
        Participant {
            id: id.to_string(),
            focus_session_id: session_id.to_string(),
            user_id: Some(user_id.to_string()),
            user_name: "Alice".to_string(),
            goal: "write chapter".to_string(),
            recap: None,
            break_active: false,
            break_started_at: None,
            break_ends_at: None,
            break_relaxations_used: 0,
            break_paused_seconds: 0,
            break_escalated_at: None,
        }
    }

    #[test]
    fn test_end_session_is_idempotent() {
        let db = Db::open_in_memory().unwrap();
        db.insert_session(&test_session("s1")).unwrap();

        db.end_session("s1", "2026-03-01T12:00:00Z").unwrap();
        db.end_session("s1", "2026-03-01T13:00:00Z").unwrap();

        let session = db.get_session("s1").unwrap().unwrap();
        assert_eq!(session.ended_at.as_deref(), Some("2026-03-01T12:00:00Z"));
    }

    #[test]
    fn test_extend_break_budget_is_race_free() {
        let db = Db::open_in_memory().unwrap();
        db.insert_session(&test_session("s1")).unwrap();
        db.insert_participant(&test_participant("p1", "s1", "u1"))
            .unwrap();

        assert!(db
            .start_break("p1", "2026-03-01T11:00:00Z", "2026-03-01T11:30:00Z")
            .unwrap());

        for _ in 0..3 {
            assert!(db.extend_break("p1", "2026-03-01T11:35:00Z", 3).unwrap());
        }
        // Budget exhausted: the conditional update rejects the 4th.
        assert!(!db.extend_break("p1", "2026-03-01T11:40:00Z", 3).unwrap());

        let entry = db.get_participant("s1", "u1").unwrap().unwrap();
        assert_eq!(entry.break_relaxations_used, 3);
    }

    #[test]
    fn test_mark_break_escalated_once_per_episode() {
        let db = Db::open_in_memory().unwrap();
        db.insert_session(&test_session("s1")).unwrap();
        db.insert_participant(&test_participant("p1", "s1", "u1"))
            .unwrap();
        db.start_break("p1", "2026-03-01T11:00:00Z", "2026-03-01T11:30:00Z")
            .unwrap();

        // Not overdue yet.
        assert!(!db.mark_break_escalated("p1", "2026-03-01T11:29:00Z").unwrap());
        // Overdue: first detector wins, second is a no-op.
        assert!(db.mark_break_escalated("p1", "2026-03-01T11:31:00Z").unwrap());
        assert!(!db.mark_break_escalated("p1", "2026-03-01T11:32:00Z").unwrap());
    }

    #[test]
    fn test_return_scoring_clamps_at_hundred() {
        let db = Db::open_in_memory().unwrap();
        for i in 0..15 {
            db.apply_return_scoring("u1", true, &format!("2026-03-01T1{}:00:00Z", i % 10))
                .unwrap();
        }
        let state = db.get_focus_state("u1").unwrap().unwrap();
        assert_eq!(state.reliability_score, 100);
        assert_eq!(state.focus_score, 100);
    }

    #[test]
    fn test_escalation_penalty_floors_at_zero() {
        let db = Db::open_in_memory().unwrap();
        for _ in 0..20 {
            db.apply_escalation_penalty("u1", "2026-03-01T12:00:00Z").unwrap();
        }
        let state = db.get_focus_state("u1").unwrap().unwrap();
        assert_eq!(state.focus_score, 0);
        assert_eq!(state.reliability_score, 0);
        assert_eq!(state.overdue_count, 20);
    }

    #[test]
    fn test_participant_unique_per_session_and_user() {
        let db = Db::open_in_memory().unwrap();
        db.insert_session(&test_session("s1")).unwrap();
        db.insert_participant(&test_participant("p1", "s1", "u1"))
            .unwrap();

        let dup = db.insert_participant(&test_participant("p2", "s1", "u1"));
        assert!(dup.is_err());
    }
}
