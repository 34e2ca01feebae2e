// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth credentials, token state and the server-side session record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Integration credentials entered by the user when starting the OAuth flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Tokens returned by the identity provider.
///
/// Replaced wholesale on every successful exchange, never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub refresh_token: String,
    /// Refresh token lifetime in seconds
    pub refresh_token_expires_in: i64,
    /// When the provider issued this token set
    #[serde(default = "Utc::now")]
    pub issued_at: DateTime<Utc>,
}

impl TokenState {
    /// When the access token stops being accepted.
    pub fn access_expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.expires_in)
    }

    /// When the refresh token stops being accepted.
    pub fn refresh_expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.refresh_token_expires_in)
    }
}

/// Everything a session needs to call the Webex API on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub credentials: Credentials,
    pub tokens: TokenState,
}

impl SessionRecord {
    /// Serialize for the session table.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Inverse of [`SessionRecord::encode`].
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Account identifier used to key cached analytics.
    pub fn account_id(&self) -> &str {
        &self.credentials.client_id
    }
}
