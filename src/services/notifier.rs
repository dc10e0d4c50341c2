// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Escalation notifier: best-effort email delivery via a JSON webhook.
//!
//! The contract is deliberately weak: `send` never returns an error, there is
//! no retry, and an unconfigured notifier is a valid state that reports
//! `false` without attempting delivery. Callers treat the result as a hint
//! for response bodies, nothing more.

use crate::config::Config;
use serde::Serialize;
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Message handed to the email webhook.
#[derive(Serialize)]
struct EmailPayload<'a> {
    to: &'a str,
    from: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Best-effort email sender.
#[derive(Clone)]
pub struct EmailNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
    from: Option<String>,
}

impl EmailNotifier {
    /// Build from config. Missing webhook URL or from-address leaves the
    /// notifier in the "not configured" state.
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(SEND_TIMEOUT)
                .build()
                .expect("Failed to build notifier HTTP client"),
            webhook_url: config.email_webhook_url.clone(),
            from: config.email_from.clone(),
        }
    }

    /// A notifier that never sends. Used by tests and bare deployments.
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: None,
            from: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some() && self.from.is_some()
    }

    /// Deliver one email. Returns whether the webhook accepted it; transport
    /// failures are logged and reported as `false`, never raised.
    pub async fn send(&self, to: &str, subject: &str, text: &str, html: &str) -> bool {
        let (Some(url), Some(from)) = (self.webhook_url.as_deref(), self.from.as_deref()) else {
            tracing::debug!(to, "Escalation email skipped: notifier not configured");
            return false;
        };

        let payload = EmailPayload {
            to,
            from,
            subject,
            text,
            html,
        };

        match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(
                    to,
                    status = %response.status(),
                    "Escalation email webhook rejected message"
                );
                false
            }
            Err(err) => {
                tracing::warn!(to, error = %err, "Escalation email send failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_notifier_returns_false_without_attempting() {
        let notifier = EmailNotifier::disabled();
        assert!(!notifier.is_configured());
        assert!(!notifier.send("a@example.com", "s", "t", "<p>h</p>").await);
    }
}
