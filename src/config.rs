//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; there is no per-request configuration
//! lookup.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS and links embedded in notification emails
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Path to the SQLite database file
    pub database_path: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Escalation email webhook endpoint; unset means notifications are off
    pub email_webhook_url: Option<String>,
    /// From-address for escalation emails; unset means notifications are off
    pub email_from: Option<String>,
    /// Interval between server-side overdue-break sweeps, in seconds
    pub escalation_sweep_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "focusflow.db".to_string()),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            email_webhook_url: env::var("EMAIL_WEBHOOK_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            email_from: env::var("EMAIL_FROM")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            escalation_sweep_seconds: env::var("ESCALATION_SWEEP_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            database_path: ":memory:".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            email_webhook_url: None,
            email_from: None,
            escalation_sweep_seconds: 30,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.escalation_sweep_seconds, 30);
        assert!(config.email_webhook_url.is_none() || config.email_webhook_url.is_some());
    }

    #[test]
    fn test_default_is_not_notifier_configured() {
        let config = Config::test_default();
        assert!(config.email_webhook_url.is_none());
        assert!(config.email_from.is_none());
    }
}
