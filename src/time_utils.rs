// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Shared helpers for date/time formatting.
//!
//! Timestamps are persisted as RFC3339 `Z`-suffixed strings at whole-second
//! precision. With a fixed format and UTC offset, lexicographic comparison of
//! stored values matches chronological order, which the overdue-break scan
//! relies on.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored RFC3339 timestamp back into a UTC datetime.
pub fn parse_utc_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whole seconds from `earlier` to `later`, floored at zero.
pub fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_seconds().max(0)
}
