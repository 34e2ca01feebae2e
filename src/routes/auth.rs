// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webex OAuth authentication routes.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::config::OAUTH_SCOPES;
use crate::db::sessions::session_expiry;
use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_session_jwt, session_cookie, session_cookie_removal, session_id_from_jar,
};
use crate::models::{Credentials, SessionRecord};
use crate::routes::pages::{error_redirect, message_redirect};
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long an OAuth `state` (and its pending credentials) stays valid.
pub const STATE_TTL_SECS: u64 = 10 * 60;

/// Upper bound on OAuth flows started but not yet completed.
pub const MAX_PENDING_AUTHORIZATIONS: usize = 1024;

/// Cookie binding the OAuth flow to the browser that started it.
pub const NONCE_COOKIE: &str = "mq_oauth_nonce";

/// Credentials entered on the index page, waiting for the OAuth callback.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub credentials: Credentials,
    pub created_at: Instant,
}

/// Pending authorizations keyed by the nonce carried in `state`.
pub type PendingAuthorizations = DashMap<String, PendingAuthorization>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/init", post(init_flow))
        .route("/auth", get(auth_callback))
        .route("/auth/logout", get(logout))
}

/// Form posted by the index page.
#[derive(Deserialize)]
pub struct InitForm {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
}

/// Start the OAuth flow - remember the credentials and redirect to Webex.
async fn init_flow(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<InitForm>,
) -> Result<(CookieJar, Redirect)> {
    let client_id = form.client_id.trim();
    let client_secret = form.client_secret.trim();
    if client_id.is_empty() || client_secret.is_empty() {
        return Err(AppError::BadRequest(
            "client_id and client_secret are required".to_string(),
        ));
    }

    let redirect_uri = state.config.redirect_uri();
    let nonce = random_nonce()?;

    prune_pending(&state.pending);
    if state.pending.len() >= MAX_PENDING_AUTHORIZATIONS {
        tracing::warn!(
            pending = state.pending.len(),
            "Refusing new OAuth flow, too many pending authorizations"
        );
        return Err(AppError::Busy);
    }
    state.pending.insert(
        nonce.clone(),
        PendingAuthorization {
            credentials: Credentials {
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                redirect_uri: redirect_uri.clone(),
            },
            created_at: Instant::now(),
        },
    );

    let oauth_state = sign_state(&nonce, now_millis()?, &state.config.oauth_state_key)?;

    let auth_url = format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
        state.config.webex.authorize_url,
        urlencoding::encode(client_id),
        urlencoding::encode(&redirect_uri),
        urlencoding::encode(OAUTH_SCOPES),
        oauth_state
    );

    tracing::info!(client_id, "Starting OAuth flow, redirecting to Webex");

    let jar = jar.add(nonce_cookie(nonce, state.config.secure_cookies()));
    Ok((jar, Redirect::to(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth callback - exchange the code for tokens and create a session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    // Read before removal; a removed cookie no longer shows up in the jar
    let browser_nonce = jar.get(NONCE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(nonce_cookie_removal(state.config.secure_cookies()));

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Webex");
        let msg = params.error_description.unwrap_or(error);
        return (jar, error_redirect(msg)).into_response();
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (jar, error_redirect("No OAuth code provided")).into_response();
    };

    let nonce = params.state.as_deref().and_then(|s| {
        verify_state(s, &state.config.oauth_state_key, now_millis().ok()?)
    });
    let Some(nonce) = nonce else {
        tracing::warn!("Invalid or expired OAuth state parameter");
        return (jar, error_redirect("Invalid or expired OAuth state. Start again.")).into_response();
    };

    let bound = browser_nonce
        .is_some_and(|b| bool::from(b.as_bytes().ct_eq(nonce.as_bytes())));
    if !bound {
        tracing::warn!("OAuth callback from a browser that did not start the flow");
        return (jar, error_redirect("OAuth flow was started in another browser.")).into_response();
    }

    let Some((_, pending)) = state.pending.remove(&nonce) else {
        return (jar, error_redirect("OAuth flow expired. Start again.")).into_response();
    };

    let tokens = match state
        .token_manager()
        .exchange_authorization_code(&code, &pending.credentials)
        .await
    {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!(error = %e, "Authorization code exchange failed");
            return (jar, error_redirect(e)).into_response();
        }
    };

    let record = SessionRecord {
        credentials: pending.credentials,
        tokens,
    };

    match start_session(&state, &record).await {
        Ok(cookie) => {
            tracing::info!(client_id = %record.credentials.client_id, "OAuth successful");
            (jar.add(cookie), message_redirect("Successfully authenticated")).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create session");
            (jar, error_redirect("Could not create a session.")).into_response()
        }
    }
}

async fn start_session(state: &AppState, record: &SessionRecord) -> Result<Cookie<'static>> {
    let session_id = state.sessions.create(record).await?;
    let jwt = create_session_jwt(
        &session_id,
        &state.config.session_signing_key,
        session_expiry(record),
    )?;
    Ok(session_cookie(jwt, state.config.secure_cookies()))
}

/// Logout - delete the server-side session and clear the cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(session_id) = session_id_from_jar(&jar, &state.config.session_signing_key) {
        if let Err(e) = state.sessions.delete(&session_id).await {
            tracing::error!(error = %e, "Failed to delete session on logout");
        }
    }

    let jar = jar.remove(session_cookie_removal(state.config.secure_cookies()));
    (jar, Redirect::to("/"))
}

fn nonce_cookie(nonce: String, secure: bool) -> Cookie<'static> {
    Cookie::build((NONCE_COOKIE, nonce))
        .path("/auth")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn nonce_cookie_removal(secure: bool) -> Cookie<'static> {
    Cookie::build(NONCE_COOKIE)
        .path("/auth")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Drop pending authorizations whose `state` can no longer verify.
fn prune_pending(pending: &PendingAuthorizations) {
    pending.retain(|_, p| p.created_at.elapsed().as_secs() < STATE_TTL_SECS);
}

fn random_nonce() -> Result<String> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failed")))?;
    Ok(hex::encode(bytes))
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

fn state_signature(payload: &str, secret: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build the OAuth `state`: base64url("nonce|timestamp_hex|signature_hex").
fn sign_state(nonce: &str, issued_at_ms: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", nonce, issued_at_ms);
    let signature = state_signature(&payload, secret)?;
    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the signature and age of an OAuth `state`, returning its nonce.
fn verify_state(state: &str, secret: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    let [nonce, timestamp_hex, signature_hex] = parts.as_slice() else {
        return None;
    };

    let payload = format!("{}|{}", nonce, timestamp_hex);
    let expected = state_signature(&payload, secret).ok()?;
    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_at_ms = u128::from_str_radix(timestamp_hex, 16).ok()?;
    let age_ms = now_ms.checked_sub(issued_at_ms)?;
    if age_ms > u128::from(STATE_TTL_SECS) * 1000 {
        return None;
    }

    Some(nonce.to_string())
}
