// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webex API client for meetings and meeting-quality analytics.
//!
//! Handles:
//! - Meeting listing
//! - Meeting quality fetching, with the raw payload cached on success
//! - Token refresh when Webex answers 401 (bounded)
//! - Falling back to the cache when the analytics cooldown answers 429

use chrono::{DateTime, Duration, Utc};
use reqwest::{header::RETRY_AFTER, StatusCode};

use crate::config::WebexEndpoints;
use crate::db::CacheStore;
use crate::error::ApiError;
use crate::models::{
    Credentials, MeetingSummary, MeetingsList, QualityReport, SessionRecord, TokenState,
};
use crate::services::oauth::TokenManager;
use crate::time_utils::format_utc_rfc3339;

/// Requests per logical call: the first one plus one retry after each of
/// at most `MAX_ATTEMPTS - 1` refreshes.
pub const MAX_ATTEMPTS: u32 = 4;

/// Webex serves analytics for a meeting at most once per five minutes.
pub const ANALYTICS_COOLDOWN_SECS: u64 = 5 * 60;

/// Filter for the meeting list.
#[derive(Debug, Clone)]
pub struct MeetingQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// `meeting`, `meetingSeries` or `scheduledMeeting`
    pub meeting_type: Option<String>,
}

impl MeetingQuery {
    /// Meetings that took place in the last `days` days.
    pub fn last_days(days: i64) -> Self {
        let to = Utc::now();
        Self {
            from: to - Duration::days(days),
            to,
            meeting_type: Some("meeting".to_string()),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("from", format_utc_rfc3339(self.from)),
            ("to", format_utc_rfc3339(self.to)),
        ];
        if let Some(meeting_type) = &self.meeting_type {
            params.push(("meetingType", meeting_type.clone()));
        }
        params
    }
}

/// Where a quality report came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Freshness {
    /// Fetched from Webex just now.
    Live,
    /// Webex is rate limiting this meeting; this is the last payload fetched.
    Cached { fetched_at: DateTime<Utc> },
    /// Webex had no analytics for the meeting (HTTP 204).
    Empty,
}

/// Result of [`WebexClient::get_meeting_qualities`].
#[derive(Debug, Clone)]
pub struct QualityFetch {
    pub report: QualityReport,
    pub freshness: Freshness,
}

/// Outcome of one authorized GET once 401s are dealt with.
enum Upstream {
    Body(String),
    NoContent,
    RateLimited { retry_after_secs: Option<u64> },
}

/// Per-session Webex client.
///
/// Owns the session's credentials and tokens for the duration of a request.
/// After the call, check [`WebexClient::tokens_refreshed`] and write the
/// record back if the tokens changed.
pub struct WebexClient {
    http: reqwest::Client,
    endpoints: WebexEndpoints,
    token_manager: TokenManager,
    cache: CacheStore,
    credentials: Credentials,
    tokens: TokenState,
    refreshed: bool,
}

impl WebexClient {
    pub fn new(
        http: reqwest::Client,
        endpoints: WebexEndpoints,
        cache: CacheStore,
        record: SessionRecord,
    ) -> Self {
        Self {
            token_manager: TokenManager::new(http.clone(), endpoints.token_url.clone()),
            http,
            endpoints,
            cache,
            credentials: record.credentials,
            tokens: record.tokens,
            refreshed: false,
        }
    }

    /// Identifier analytics are cached under.
    pub fn account_id(&self) -> &str {
        &self.credentials.client_id
    }

    pub fn tokens(&self) -> &TokenState {
        &self.tokens
    }

    /// Whether a refresh replaced the tokens during this client's lifetime.
    pub fn tokens_refreshed(&self) -> bool {
        self.refreshed
    }

    /// Current credentials and tokens, for writing back to the session store.
    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            credentials: self.credentials.clone(),
            tokens: self.tokens.clone(),
        }
    }

    // ─── API Calls ───────────────────────────────────────────────────────────

    /// List meetings accessible to the account.
    pub async fn list_meetings(
        &mut self,
        query: &MeetingQuery,
    ) -> Result<Vec<MeetingSummary>, ApiError> {
        let url = self.endpoints.meetings_url.clone();

        match self.authorized_get(&url, &query.params()).await? {
            Upstream::Body(body) => {
                let meetings: MeetingsList = serde_json::from_str(&body)?;
                tracing::debug!(count = meetings.items.len(), "Fetched meetings");
                Ok(meetings.items)
            }
            Upstream::NoContent => Ok(Vec::new()),
            // Only the analytics endpoint has a cache to fall back on
            Upstream::RateLimited { .. } => Err(ApiError::UnexpectedStatus {
                code: StatusCode::TOO_MANY_REQUESTS.as_u16(),
            }),
        }
    }

    /// Get per-session quality analytics for a meeting.
    ///
    /// A successful fetch replaces the cached payload. When Webex enforces its
    /// per-meeting cooldown, the cached payload is returned instead, however
    /// old it is.
    pub async fn get_meeting_qualities(
        &mut self,
        meeting_id: &str,
    ) -> Result<QualityFetch, ApiError> {
        let url = self.endpoints.qualities_url.clone();
        let params = [("meetingId", meeting_id.to_string())];

        match self.authorized_get(&url, &params).await? {
            Upstream::Body(body) => {
                let mut report: QualityReport = serde_json::from_str(&body)?;
                report.meeting_id = meeting_id.to_string();

                // The user still gets their data if caching fails
                if let Err(e) = self.cache.save(meeting_id, self.account_id(), &body).await {
                    tracing::error!(error = %e, meeting_id, "Failed to cache meeting analytics");
                }

                Ok(QualityFetch {
                    report,
                    freshness: Freshness::Live,
                })
            }
            Upstream::NoContent => Ok(QualityFetch {
                report: QualityReport::empty(meeting_id),
                freshness: Freshness::Empty,
            }),
            Upstream::RateLimited { retry_after_secs } => {
                match self.cache.retrieve(self.account_id(), meeting_id).await? {
                    Some(cached) => {
                        tracing::info!(
                            meeting_id,
                            fetched_at = %cached.fetched_at,
                            "Analytics rate limited, serving cached payload"
                        );
                        Ok(QualityFetch {
                            report: cached.report,
                            freshness: Freshness::Cached {
                                fetched_at: cached.fetched_at,
                            },
                        })
                    }
                    None => Err(ApiError::RateLimitedNoCache {
                        meeting_id: meeting_id.to_string(),
                        retry_after_secs: retry_after_secs.unwrap_or(ANALYTICS_COOLDOWN_SECS),
                    }),
                }
            }
        }
    }

    // ─── Request Policy ──────────────────────────────────────────────────────

    /// Bearer-authenticated GET with refresh-and-retry on 401.
    ///
    /// At most [`MAX_ATTEMPTS`] requests and `MAX_ATTEMPTS - 1` refreshes per
    /// call. A failed refresh ends the call with the provider's error.
    async fn authorized_get(
        &mut self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Upstream, ApiError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .http
                .get(url)
                .bearer_auth(&self.tokens.access_token)
                .query(params)
                .send()
                .await?;

            match response.status() {
                StatusCode::OK => return Ok(Upstream::Body(response.text().await?)),
                StatusCode::NO_CONTENT => return Ok(Upstream::NoContent),
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after_secs = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|h| h.to_str().ok())
                        .and_then(|s| s.trim().parse().ok());
                    tracing::warn!(url, ?retry_after_secs, "Webex rate limit hit (429)");
                    return Ok(Upstream::RateLimited { retry_after_secs });
                }
                StatusCode::UNAUTHORIZED if attempt < MAX_ATTEMPTS => {
                    tracing::info!(attempt, url, "Access token rejected, refreshing");
                    self.refresh_tokens().await?;
                }
                StatusCode::UNAUTHORIZED => {
                    tracing::warn!(attempt, url, "Access token still rejected after refresh");
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    tracing::error!(status = %status, url, body = %body, "Unexpected Webex response");
                    return Err(ApiError::UnexpectedStatus {
                        code: status.as_u16(),
                    });
                }
            }
        }

        Err(ApiError::ExhaustedRetries {
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Replace the token state with a freshly refreshed one.
    async fn refresh_tokens(&mut self) -> Result<(), ApiError> {
        let tokens = self
            .token_manager
            .refresh(&self.tokens, &self.credentials)
            .await?;
        self.tokens = tokens;
        self.refreshed = true;
        tracing::info!(client_id = %self.credentials.client_id, "Access token refreshed");
        Ok(())
    }
}
