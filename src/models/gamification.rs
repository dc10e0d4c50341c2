// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Points and streak tracking.
//!
//! A streak counts consecutive UTC calendar days with at least one first
//! recap submission. Same-day repeats leave it unchanged, an exactly-one-day
//! gap increments it, anything larger resets it to 1.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Points awarded for the first recap of a session.
pub const RECAP_POINTS: i64 = 10;

/// Per-user gamification aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gamification {
    pub total_points: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    /// UTC date of the most recent counted submission, as `YYYY-MM-DD`.
    pub last_session_date: Option<String>,
}

impl Gamification {
    /// Apply a first-recap award for `today` (UTC date).
    ///
    /// `totalPoints` is monotonic and `longestStreak` never decreases.
    pub fn apply_recap_award(&mut self, today: NaiveDate) {
        let last = self
            .last_session_date
            .as_deref()
            .and_then(|raw| raw.parse::<NaiveDate>().ok());

        self.current_streak = next_streak(last, today, self.current_streak);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.total_points += RECAP_POINTS;
        self.last_session_date = Some(today.to_string());
    }
}

/// Streak transition for a submission on `today` given the previous counted
/// day.
pub fn next_streak(last: Option<NaiveDate>, today: NaiveDate, current_streak: i64) -> i64 {
    match last {
        Some(last) if last == today => current_streak.max(1),
        Some(last) if today.signed_duration_since(last).num_days() == 1 => current_streak + 1,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_three_consecutive_days() {
        let mut g = Gamification::default();
        g.apply_recap_award(day("2026-03-01"));
        g.apply_recap_award(day("2026-03-02"));
        g.apply_recap_award(day("2026-03-03"));

        assert_eq!(g.current_streak, 3);
        assert_eq!(g.longest_streak, 3);
        assert_eq!(g.total_points, 3 * RECAP_POINTS);
        assert_eq!(g.last_session_date.as_deref(), Some("2026-03-03"));
    }

    #[test]
    fn test_same_day_does_not_increment() {
        let mut g = Gamification::default();
        g.apply_recap_award(day("2026-03-01"));
        g.apply_recap_award(day("2026-03-01"));

        assert_eq!(g.current_streak, 1);
        assert_eq!(g.total_points, 2 * RECAP_POINTS);
    }

    #[test]
    fn test_gap_resets_streak_but_longest_survives() {
        let mut g = Gamification::default();
        g.apply_recap_award(day("2026-03-01"));
        g.apply_recap_award(day("2026-03-02"));
        g.apply_recap_award(day("2026-03-03"));
        g.apply_recap_award(day("2026-03-06"));

        assert_eq!(g.current_streak, 1);
        assert_eq!(g.longest_streak, 3);
    }

    #[test]
    fn test_next_streak_with_no_history() {
        assert_eq!(next_streak(None, day("2026-03-01"), 0), 1);
    }
}
