// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// OAuth scopes requested from Webex. Fixed; no scope negotiation.
pub const OAUTH_SCOPES: &str = "analytics:read_all meeting:schedules_read";

/// Webex endpoints. Overridable so tests can point at a local mock.
#[derive(Debug, Clone)]
pub struct WebexEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub meetings_url: String,
    pub qualities_url: String,
}

impl Default for WebexEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: "https://webexapis.com/v1/authorize".to_string(),
            token_url: "https://webexapis.com/v1/access_token".to_string(),
            meetings_url: "https://webexapis.com/v1/meetings".to_string(),
            qualities_url: "https://analytics.webexapis.com/v1/meeting/qualities".to_string(),
        }
    }
}

impl WebexEndpoints {
    /// All endpoints rooted at a single base URL (`{base}/v1/...`).
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize_url: format!("{base}/v1/authorize"),
            token_url: format!("{base}/v1/access_token"),
            meetings_url: format!("{base}/v1/meetings"),
            qualities_url: format!("{base}/v1/meeting/qualities"),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Public URL of this server, used to build the OAuth redirect URI
    pub public_url: String,
    /// Server port
    pub port: u16,
    /// SQLite database for the analytics cache and sessions
    pub database_url: String,
    /// HS256 key for session cookies
    pub session_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
    pub webex: WebexEndpoints,
    /// Timeout applied to every upstream request
    pub upstream_timeout: Duration,
    /// How far back the meeting list looks
    pub meetings_lookback_days: i64,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let session_signing_key = env::var("SESSION_SIGNING_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?;
        if session_signing_key.len() < 32 {
            return Err(ConfigError::Invalid(
                "SESSION_SIGNING_KEY",
                "must be at least 32 bytes".to_string(),
            ));
        }

        let defaults = WebexEndpoints::default();

        Ok(Self {
            public_url: env::var("PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("PUBLIC_URL"))?,
            port: parse_or("PORT", 3000)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://meeting_quality.db".to_string()),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map(|v| v.trim().as_bytes().to_vec())
                .unwrap_or_else(|_| session_signing_key.as_bytes().to_vec()),
            session_signing_key: session_signing_key.into_bytes(),
            webex: WebexEndpoints {
                authorize_url: env::var("WEBEX_AUTHORIZE_URL").unwrap_or(defaults.authorize_url),
                token_url: env::var("WEBEX_TOKEN_URL").unwrap_or(defaults.token_url),
                meetings_url: env::var("WEBEX_MEETINGS_URL").unwrap_or(defaults.meetings_url),
                qualities_url: env::var("WEBEX_QUALITIES_URL").unwrap_or(defaults.qualities_url),
            },
            upstream_timeout: Duration::from_secs(parse_or("UPSTREAM_TIMEOUT_SECS", 30)?),
            meetings_lookback_days: parse_or("MEETINGS_LOOKBACK_DAYS", 30)?,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            public_url: "http://localhost:3000".to_string(),
            port: 3000,
            database_url: "sqlite::memory:".to_string(),
            session_signing_key: b"test_session_key_32_bytes_minimum!".to_vec(),
            oauth_state_key: b"test_state_key".to_vec(),
            webex: WebexEndpoints::default(),
            upstream_timeout: Duration::from_secs(5),
            meetings_lookback_days: 30,
        }
    }

    /// Redirect URI registered with the Webex integration.
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth", self.public_url)
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, format!("cannot parse {raw:?}"))),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
