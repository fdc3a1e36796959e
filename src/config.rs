//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup and held in `AppState`; nothing
//! re-reads the environment per request.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Slack OAuth client ID (public)
    pub slack_client_id: String,
    /// Frontend URL for post-login redirects and CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Directory where submission photos are stored
    pub upload_dir: String,

    /// Slack OAuth client secret
    pub slack_client_secret: String,
    /// HS256 signing key for session tokens (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// HMAC key for the OAuth anti-forgery state
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            slack_client_id: env::var("SLACK_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("SLACK_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "data/uploads".to_string()),

            slack_client_secret: env::var("SLACK_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SLACK_CLIENT_SECRET"))?,
            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            slack_client_id: "test_client_id".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            upload_dir: "data/uploads".to_string(),
            slack_client_secret: "test_secret".to_string(),
            session_signing_key: b"test_session_key_32_bytes_long!!".to_vec(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
        }
    }

    /// Whether the deployment fronts an https origin (controls the
    /// `Secure` attribute on cookies).
    pub fn is_secure(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
