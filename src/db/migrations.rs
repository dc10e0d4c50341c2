// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Idempotent schema setup.
//!
//! Every statement is `IF NOT EXISTS`-guarded so the whole set can run on
//! every boot. It runs exactly once, at startup, before the server binds.
//! Never lazily from a request path.

use rusqlite::Connection;

/// All DDL, in dependency order.
///
/// Column names match the wire names used by the API so rows map onto
/// responses without a translation layer.
const MIGRATIONS: &[&str] = &[
    // Owned by the external identity/group collaborator; created here so a
    // fresh deployment works, but this service only reads these two tables.
    r#"
    CREATE TABLE IF NOT EXISTS "User" (
        "id"    TEXT NOT NULL PRIMARY KEY,
        "name"  TEXT,
        "email" TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Membership" (
        "id"      TEXT NOT NULL PRIMARY KEY,
        "groupId" TEXT NOT NULL,
        "userId"  TEXT NOT NULL,
        "role"    TEXT NOT NULL DEFAULT 'member'
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS "Membership_groupId_idx" ON "Membership"("groupId");
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "TeamFocusSession" (
        "id"        TEXT NOT NULL PRIMARY KEY,
        "createdAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "FocusSession" (
        "id"              TEXT NOT NULL PRIMARY KEY,
        "name"            TEXT NOT NULL,
        "adminUserId"     TEXT,
        "durationSeconds" INTEGER,
        "goal"            TEXT,
        "recap"           TEXT,
        "teamSessionId"   TEXT REFERENCES "TeamFocusSession"("id") ON DELETE SET NULL,
        "createdAt"       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
        "startedAt"       TEXT,
        "endedAt"         TEXT
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS "FocusSession_startedAt_idx" ON "FocusSession"("startedAt");
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS "FocusSession_endedAt_idx" ON "FocusSession"("endedAt");
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS "FocusSession_teamSessionId_idx" ON "FocusSession"("teamSessionId");
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "UserInSession" (
        "id"                   TEXT NOT NULL PRIMARY KEY,
        "focusSessionId"       TEXT NOT NULL REFERENCES "FocusSession"("id") ON DELETE CASCADE,
        "userId"               TEXT,
        "userName"             TEXT NOT NULL,
        "goal"                 TEXT NOT NULL,
        "recap"                TEXT,
        "breakActive"          INTEGER NOT NULL DEFAULT 0,
        "breakStartedAt"       TEXT,
        "breakEndsAt"          TEXT,
        "breakRelaxationsUsed" INTEGER NOT NULL DEFAULT 0,
        "breakPausedSeconds"   INTEGER NOT NULL DEFAULT 0,
        "breakEscalatedAt"     TEXT
    );
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS "UserInSession_focusSessionId_userId_key"
    ON "UserInSession"("focusSessionId", "userId");
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS "UserInSession_userId_idx" ON "UserInSession"("userId");
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "UserHiddenSession" (
        "id"        TEXT NOT NULL PRIMARY KEY,
        "userId"    TEXT NOT NULL,
        "sessionId" TEXT NOT NULL,
        "createdAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
    );
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS "UserHiddenSession_userId_sessionId_key"
    ON "UserHiddenSession"("userId", "sessionId");
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "UserFocusState" (
        "userId"           TEXT NOT NULL PRIMARY KEY,
        "lastActivityAt"   TEXT,
        "focusScore"       INTEGER NOT NULL DEFAULT 80,
        "reliabilityScore" INTEGER NOT NULL DEFAULT 100,
        "overdueCount"     INTEGER NOT NULL DEFAULT 0,
        "lastOverdueAt"    TEXT,
        "updatedAt"        TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "UserFocusScoreLog" (
        "id"        TEXT NOT NULL PRIMARY KEY,
        "userId"    TEXT NOT NULL,
        "score"     INTEGER NOT NULL,
        "createdAt" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS "UserFocusScoreLog_userId_createdAt_idx"
    ON "UserFocusScoreLog"("userId", "createdAt");
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "UserGamification" (
        "userId"          TEXT NOT NULL PRIMARY KEY,
        "totalPoints"     INTEGER NOT NULL DEFAULT 0,
        "currentStreak"   INTEGER NOT NULL DEFAULT 0,
        "longestStreak"   INTEGER NOT NULL DEFAULT 0,
        "lastSessionDate" TEXT,
        "updatedAt"       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
    );
    "#,
];

/// Run all migrations. Safe to call on every boot.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    for sql in MIGRATIONS {
        conn.execute_batch(sql)?;
    }
    Ok(())
}
