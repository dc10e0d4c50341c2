// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Services module - business logic layer.

pub mod breaks;
pub mod notifier;
pub mod scoring;
pub mod sessions;

pub use breaks::{BreakService, EscalationOutcome, EscalationSkip, ReturnOutcome};
pub use notifier::EmailNotifier;
pub use scoring::{FocusOverview, ScoringService};
pub use sessions::{SessionService, SessionView};
