// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQL DDL applied at startup.

/// - `meeting_qualities`: last successful analytics payload per (client, meeting)
/// - `sessions`: server-side session records keyed by an opaque handle
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS meeting_qualities (
    client_id TEXT NOT NULL,
    meeting_id TEXT NOT NULL,
    data_dump TEXT NOT NULL,
    fetched_at TEXT NOT NULL, -- RFC3339
    PRIMARY KEY (client_id, meeting_id)
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY NOT NULL,
    record TEXT NOT NULL,
    expires_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;
