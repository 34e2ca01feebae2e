// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Meeting-Quality: Webex meeting call-quality analytics
//!
//! This crate provides a small web application that authorizes a Webex
//! integration via OAuth, lists the account's meetings, fetches per-meeting
//! media quality analytics (cached locally to ride out the per-meeting rate
//! limit) and renders or exports them as chartable series.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{CacheStore, SessionStore};
use models::SessionRecord;
use routes::auth::PendingAuthorizations;
use services::{TokenManager, WebexClient};
use sqlx::SqlitePool;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
    pub cache: CacheStore,
    pub sessions: SessionStore,
    /// OAuth flows started but not yet called back, keyed by nonce
    pub pending: PendingAuthorizations,
}

impl AppState {
    /// Build the state around an already-initialized database pool.
    pub fn new(config: Config, pool: SqlitePool) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(concat!("meeting-quality/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            http,
            cache: CacheStore::new(pool.clone()),
            sessions: SessionStore::new(pool),
            pending: PendingAuthorizations::default(),
        })
    }

    /// Token endpoint client.
    pub fn token_manager(&self) -> TokenManager {
        TokenManager::new(self.http.clone(), self.config.webex.token_url.clone())
    }

    /// Webex client acting on behalf of one session.
    pub fn webex_client(&self, record: SessionRecord) -> WebexClient {
        WebexClient::new(
            self.http.clone(),
            self.config.webex.clone(),
            self.cache.clone(),
            record,
        )
    }
}
