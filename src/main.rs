// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! FocusFlow API Server
//!
//! Group focus sessions with a break/escalation state machine,
//! reliability/focus scoring and recap gamification.

use focusflow::{
    config::Config,
    db::Db,
    services::{BreakService, EmailNotifier, ScoringService, SessionService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting FocusFlow API");

    // Open the database and run idempotent migrations before serving.
    let db = Db::open(&config.database_path).expect("Failed to open database");

    // Escalation notifier (valid in the unconfigured state)
    let notifier = EmailNotifier::from_config(&config);
    tracing::info!(
        configured = notifier.is_configured(),
        "Escalation notifier initialized"
    );

    let sessions = SessionService::new(db.clone());
    let breaks = BreakService::new(db.clone(), notifier, config.frontend_url.clone());
    let scoring = ScoringService::new(db.clone());

    // Server-side overdue-break sweep. The escalate endpoint stays for
    // client polling; both paths run the same idempotent transition.
    let sweeper = breaks.clone();
    let sweep_seconds = config.escalation_sweep_seconds;
    tokio::spawn(async move {
        sweeper.run_sweeper(sweep_seconds).await;
    });
    tracing::info!(interval_seconds = sweep_seconds, "Overdue-break sweeper started");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        sessions,
        breaks,
        scoring,
    });

    // Build router
    let app = focusflow::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("focusflow=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
