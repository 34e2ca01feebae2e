// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webex OAuth token exchanges.
//!
//! Handles:
//! - Authorization code → tokens (end of the OAuth redirect flow)
//! - Refresh token → tokens
//!
//! No retries happen here; the resource client decides when to refresh.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::{Credentials, TokenState};

/// Token endpoint client.
#[derive(Clone)]
pub struct TokenManager {
    http: reqwest::Client,
    token_url: String,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            http,
            token_url: token_url.into(),
        }
    }

    /// Exchange the code captured by the OAuth redirect for a token set.
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
        credentials: &Credentials,
    ) -> Result<TokenState, ApiError> {
        self.request_tokens(
            "authorization_code",
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("redirect_uri", credentials.redirect_uri.as_str()),
            ],
        )
        .await
    }

    /// Trade the current refresh token for a new token set.
    ///
    /// Webex may rotate the refresh token, so the returned state must replace
    /// the old one entirely.
    pub async fn refresh(
        &self,
        tokens: &TokenState,
        credentials: &Credentials,
    ) -> Result<TokenState, ApiError> {
        self.request_tokens(
            "refresh_token",
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", tokens.refresh_token.as_str()),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("redirect_uri", credentials.redirect_uri.as_str()),
            ],
        )
        .await
    }

    async fn request_tokens(
        &self,
        grant: &'static str,
        form: &[(&str, &str)],
    ) -> Result<TokenState, ApiError> {
        let response = self.http.post(&self.token_url).form(form).send().await?;

        let status = response.status();
        let body = response.bytes().await?;

        match status {
            s if s.is_success() => {
                let tokens: TokenResponse = serde_json::from_slice(&body)?;
                tracing::debug!(grant, expires_in = tokens.expires_in, "Token exchange succeeded");
                Ok(tokens.into_state())
            }
            // 401 for a bad code or client, 400 for an expired refresh token
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => {
                let err: ProviderErrorBody = serde_json::from_slice(&body)?;
                tracing::warn!(
                    grant,
                    status = status.as_u16(),
                    tracking_id = %err.tracking_id,
                    message = %err.message,
                    "Webex rejected token request"
                );
                Err(err.into_auth_error())
            }
            _ => {
                tracing::error!(grant, status = %status, "Unexpected token endpoint response");
                Err(ApiError::UnexpectedStatus {
                    code: status.as_u16(),
                })
            }
        }
    }
}

/// Successful token endpoint response. Every field is required so a partial
/// body is a decode error rather than a half-filled token state.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: String,
    refresh_token_expires_in: i64,
}

impl TokenResponse {
    fn into_state(self) -> TokenState {
        TokenState {
            access_token: self.access_token,
            expires_in: self.expires_in,
            refresh_token: self.refresh_token,
            refresh_token_expires_in: self.refresh_token_expires_in,
            issued_at: chrono::Utc::now(),
        }
    }
}

/// Webex 4xx error body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderErrorBody {
    pub message: String,
    pub errors: Vec<ProviderErrorDetail>,
    pub tracking_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderErrorDetail {
    pub description: String,
}

impl ProviderErrorBody {
    pub fn into_auth_error(self) -> ApiError {
        let description = self
            .errors
            .into_iter()
            .next()
            .map(|e| e.description)
            .unwrap_or_default();
        ApiError::Auth {
            message: self.message,
            description,
        }
    }
}
