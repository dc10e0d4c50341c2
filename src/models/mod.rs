// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Data models for the application.

pub mod focus_state;
pub mod gamification;
pub mod session;

pub use focus_state::{FocusState, ScoreTrend};
pub use gamification::Gamification;
pub use session::{FocusSession, Participant, SessionListEntry};
