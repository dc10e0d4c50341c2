// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! FocusFlow: group focus sessions with break/escalation tracking.
//!
//! This crate provides the backend API for timed group focus sessions,
//! the per-participant break state machine, reliability/focus scoring and
//! recap gamification.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{BreakService, ScoringService, SessionService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub sessions: SessionService,
    pub breaks: BreakService,
    pub scoring: ScoringService,
}
