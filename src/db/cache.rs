// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Analytics cache.
//!
//! Webex only serves quality analytics for a given meeting once every five
//! minutes. The last successful payload is kept here so it can still be shown
//! while the upstream cooldown is in effect. There is no TTL: a row is valid
//! until the next successful fetch replaces it.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::models::QualityReport;

/// A cached analytics payload with the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedReport {
    pub report: QualityReport,
    pub fetched_at: DateTime<Utc>,
}

/// SQLite-backed store keyed by (client ID, meeting ID).
///
/// Shared by every session; the pool is cheap to clone.
#[derive(Clone)]
pub struct CacheStore {
    pool: SqlitePool,
}

impl CacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save the raw analytics payload, replacing any earlier one.
    ///
    /// Assumes `account_id` already completed the OAuth flow.
    pub async fn save(
        &self,
        meeting_id: &str,
        account_id: &str,
        data_dump: &str,
    ) -> Result<(), StoreError> {
        if data_dump.trim().is_empty() {
            return Err(StoreError::EmptyPayload);
        }

        sqlx::query(
            r#"
            INSERT INTO meeting_qualities (client_id, meeting_id, data_dump, fetched_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(client_id, meeting_id) DO UPDATE SET
                data_dump = excluded.data_dump,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(account_id)
        .bind(meeting_id)
        .bind(data_dump)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!(account_id, meeting_id, bytes = data_dump.len(), "Analytics cached");
        Ok(())
    }

    /// Load the cached analytics for a meeting.
    ///
    /// `Ok(None)` means the meeting was never fetched successfully, which is
    /// not an error.
    pub async fn retrieve(
        &self,
        account_id: &str,
        meeting_id: &str,
    ) -> Result<Option<CachedReport>, StoreError> {
        let row: Option<(String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT data_dump, fetched_at FROM meeting_qualities WHERE client_id = ? AND meeting_id = ?",
        )
        .bind(account_id)
        .bind(meeting_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((data_dump, fetched_at)) = row else {
            return Ok(None);
        };

        let mut report: QualityReport = serde_json::from_str(&data_dump)?;
        report.meeting_id = meeting_id.to_string();

        Ok(Some(CachedReport { report, fetched_at }))
    }

    /// Number of cached payloads for an account.
    pub async fn count_for_account(&self, account_id: &str) -> Result<i64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM meeting_qualities WHERE client_id = ?")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
