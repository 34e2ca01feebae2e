// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie authentication middleware.

use crate::error::AppError;
use crate::models::SessionRecord;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie holding the session JWT.
pub const SESSION_COOKIE: &str = "mq_session";

/// Where unauthenticated visitors of protected pages are sent.
pub const LOGIN_REQUIRED_REDIRECT: &str = "/error?msg=Complete%20the%20authentication%20flow.";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (server-side session handle)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated session, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: String,
    pub record: SessionRecord,
}

/// Middleware that requires a live session.
///
/// Requests without one are redirected to the error page, since every
/// protected route is navigated to from a browser.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session_id) = session_id_from_jar(&jar, &state.config.session_signing_key) else {
        return Redirect::to(LOGIN_REQUIRED_REDIRECT).into_response();
    };

    match state.sessions.get(&session_id).await {
        Ok(Some(record)) => {
            request.extensions_mut().insert(SessionContext {
                id: session_id,
                record,
            });
            next.run(request).await
        }
        Ok(None) => {
            tracing::debug!("Session cookie names an unknown or expired session");
            Redirect::to(LOGIN_REQUIRED_REDIRECT).into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Session handle from a valid, unexpired session cookie.
pub fn session_id_from_jar(jar: &CookieJar, signing_key: &[u8]) -> Option<String> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();

    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(&token, &key, &validation)
        .map(|data| data.claims.sub)
        .ok()
}

/// Create a JWT naming a server-side session.
pub fn create_session_jwt(
    session_id: &str,
    signing_key: &[u8],
    expires_at: DateTime<Utc>,
) -> anyhow::Result<String> {
    let now = Utc::now().timestamp();
    anyhow::ensure!(expires_at.timestamp() > now, "session already expired");

    let claims = Claims {
        sub: session_id.to_string(),
        iat: now as usize,
        exp: expires_at.timestamp() as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Session cookie carrying `token`. Expiry is enforced by the JWT itself.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Removal counterpart of [`session_cookie`]; attributes must match.
pub fn session_cookie_removal(secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}
