// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side session records.
//!
//! Credentials and tokens stay on the server. The browser only holds a
//! signed cookie naming the session handle.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::models::SessionRecord;

/// Upper bound on session lifetime regardless of the refresh token lifetime.
pub const MAX_SESSION_DAYS: i64 = 14;

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    rng: SystemRandom,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            rng: SystemRandom::new(),
        }
    }

    /// Store a new session and return its opaque handle.
    pub async fn create(&self, record: &SessionRecord) -> Result<String, StoreError> {
        let mut bytes = [0u8; 32];
        self.rng.fill(&mut bytes).map_err(|_| StoreError::Random)?;
        let id = URL_SAFE_NO_PAD.encode(bytes);

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO sessions (id, record, expires_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(record.encode()?)
        .bind(session_expiry(record))
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::info!(client_id = %record.credentials.client_id, "Session created");
        Ok(id)
    }

    /// Load a live session. Expired or unknown handles yield `None`.
    pub async fn get(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let row: Option<String> =
            sqlx::query_scalar("SELECT record FROM sessions WHERE id = ? AND expires_at > ?")
                .bind(id)
                .bind(Utc::now())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|raw| SessionRecord::decode(&raw))
            .transpose()
            .map_err(StoreError::from)
    }

    /// Write back a session whose tokens were refreshed.
    pub async fn update(&self, id: &str, record: &SessionRecord) -> Result<(), StoreError> {
        sqlx::query("UPDATE sessions SET record = ?, expires_at = ?, updated_at = ? WHERE id = ?")
            .bind(record.encode()?)
            .bind(session_expiry(record))
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Drop expired sessions. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Sessions live as long as the refresh token, capped at [`MAX_SESSION_DAYS`].
pub fn session_expiry(record: &SessionRecord) -> DateTime<Utc> {
    let cap = Utc::now() + Duration::days(MAX_SESSION_DAYS);
    record.tokens.refresh_expires_at().min(cap)
}
