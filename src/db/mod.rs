// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (SQLite).

pub mod cache;
pub mod schema;
pub mod sessions;

pub use cache::{CacheStore, CachedReport};
pub use sessions::SessionStore;

use crate::error::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::{str::FromStr, time::Duration};

/// Open the SQLite pool and apply the schema.
///
/// `sqlite::memory:` is special-cased to a single connection, since every
/// connection to an in-memory database would otherwise see its own empty copy.
pub async fn connect(database_url: &str) -> Result<SqlitePool, StoreError> {
    let in_memory = database_url.contains(":memory:");

    let mut connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .synchronous(SqliteSynchronous::Normal);
    if !in_memory {
        connect_opts = connect_opts.journal_mode(SqliteJournalMode::Wal);
    }

    let mut pool_opts = SqlitePoolOptions::new().max_connections(8);
    if in_memory {
        pool_opts = pool_opts
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = pool_opts.connect_with(connect_opts).await?;

    sqlx::raw_sql(schema::SQLITE_INIT).execute(&pool).await?;

    tracing::info!(database_url, "Database ready");
    Ok(pool)
}
