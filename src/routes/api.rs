// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated sessions.
//!
//! Every handler builds a [`WebexClient`] from the session record and,
//! once the call is done, writes refreshed tokens back to the session
//! store. HTML pages report failures by redirecting to `/error`; the JSON
//! endpoints return an [`AppError`] body.

use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{ApiError, AppError, Result};
use crate::middleware::SessionContext;
use crate::models::{AnalyticsExport, DataPoint, VisualSeries};
use crate::routes::pages::{self, error_redirect};
use crate::services::visual::series_for;
use crate::services::{build_all_series, Freshness, MeetingQuery, QualityFetch, WebexClient};
use crate::time_utils::{format_age, format_utc_rfc3339};
use crate::AppState;

/// API routes (require a session).
/// The session middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api", get(api_calls))
        .route("/api/get_meetings", get(get_meetings))
        .route("/api/get_analytics", get(get_analytics))
        .route("/api/visualize", get(visualize))
        .route("/api/export", get(export))
}

#[derive(Deserialize)]
pub struct MeetingParams {
    #[serde(default)]
    id: String,
    #[serde(default)]
    dp: String,
}

impl MeetingParams {
    fn meeting_id(&self) -> Option<&str> {
        let id = self.id.trim();
        (!id.is_empty()).then_some(id)
    }
}

async fn api_calls() -> Html<String> {
    pages::api_page()
}

// ─── HTML Pages ──────────────────────────────────────────────

/// Meetings from the configured lookback window, as a table.
async fn get_meetings(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    let mut client = state.webex_client(session.record.clone());
    let query = MeetingQuery::last_days(state.config.meetings_lookback_days);

    let result = client.list_meetings(&query).await;
    sync_session(&state, &session, &client, &result).await;

    match result {
        Ok(meetings) => pages::meetings_page(&meetings).into_response(),
        Err(e) => page_error(e).into_response(),
    }
}

/// Pretty-printed analytics for one meeting.
async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(params): Query<MeetingParams>,
) -> Response {
    let Some(meeting_id) = params.meeting_id() else {
        return error_redirect("No meeting id provided in path").into_response();
    };

    let fetch = match fetch_qualities(&state, &session, meeting_id).await {
        Ok(fetch) => fetch,
        Err(e) => return page_error(e).into_response(),
    };

    let pretty = match serde_json::to_string_pretty(&fetch.report) {
        Ok(pretty) => pretty,
        Err(e) => return error_redirect(e).into_response(),
    };

    let notice = freshness_notice(fetch.freshness);
    pages::analytics_page(meeting_id, &pretty, notice.as_deref()).into_response()
}

// ─── JSON ────────────────────────────────────────────────────

/// Series for one data point (`?id=<meeting>&dp=<selector>`).
async fn visualize(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(params): Query<MeetingParams>,
) -> Result<Json<VisualSeries>> {
    let meeting_id = params
        .meeting_id()
        .ok_or_else(|| AppError::BadRequest("missing meeting id".to_string()))?;
    // Reject a bad selector before spending the meeting's rate limit on it
    let data_point: DataPoint = params.dp.parse()?;

    let fetch = fetch_qualities(&state, &session, meeting_id).await?;
    Ok(Json(series_for(&fetch.report, data_point)?))
}

/// Every series of a meeting as a JSON download.
async fn export(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(params): Query<MeetingParams>,
) -> Result<Response> {
    let meeting_id = params
        .meeting_id()
        .ok_or_else(|| AppError::BadRequest("missing meeting id".to_string()))?;

    let fetch = fetch_qualities(&state, &session, meeting_id).await?;
    let export = AnalyticsExport {
        analytics: build_all_series(&fetch.report),
    };
    let body = serde_json::to_vec_pretty(&export).map_err(ApiError::from)?;

    tracing::info!(
        meeting_id,
        series = export.analytics.len(),
        "Exporting meeting analytics"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(meeting_id)),
        ],
        body,
    )
        .into_response())
}

// ─── Helpers ─────────────────────────────────────────────────

async fn fetch_qualities(
    state: &AppState,
    session: &SessionContext,
    meeting_id: &str,
) -> std::result::Result<QualityFetch, ApiError> {
    let mut client = state.webex_client(session.record.clone());
    let result = client.get_meeting_qualities(meeting_id).await;
    sync_session(state, session, &client, &result).await;
    result
}

/// Write refreshed tokens back to the session, or drop a session whose
/// tokens Webex no longer accepts.
async fn sync_session<T>(
    state: &AppState,
    session: &SessionContext,
    client: &WebexClient,
    result: &std::result::Result<T, ApiError>,
) {
    if let Err(e) = result {
        if e.requires_reauthentication() {
            tracing::info!(error = %e, "Dropping session that can no longer authenticate");
            if let Err(e) = state.sessions.delete(&session.id).await {
                tracing::error!(error = %e, "Failed to delete session");
            }
            return;
        }
    }

    if client.tokens_refreshed() {
        if let Err(e) = state.sessions.update(&session.id, &client.record()).await {
            // The old refresh token may already be rotated out; the next
            // request will fail auth and send the user through OAuth again
            tracing::error!(error = %e, "Failed to persist refreshed tokens");
        }
    }
}

fn page_error(e: ApiError) -> axum::response::Redirect {
    if e.requires_reauthentication() {
        return error_redirect(format!("{e}. Complete the authentication flow again."));
    }
    error_redirect(e)
}

fn freshness_notice(freshness: Freshness) -> Option<String> {
    match freshness {
        Freshness::Live => None,
        Freshness::Cached { fetched_at } => Some(format!(
            "Webex is rate limiting analytics for this meeting. Showing data fetched {} ({}).",
            format_age(fetched_at, Utc::now()),
            format_utc_rfc3339(fetched_at),
        )),
        Freshness::Empty => Some("Webex has no analytics for this meeting yet.".to_string()),
    }
}

/// Attachment header with the meeting id reduced to filename-safe characters.
fn content_disposition(meeting_id: &str) -> String {
    let safe: String = meeting_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"meeting-{safe}-analytics.json\"")
}
