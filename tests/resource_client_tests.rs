// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resource client request policy: refresh on 401, cache fallback on 429.

use meeting_quality::error::ApiError;
use meeting_quality::services::webex::{ANALYTICS_COOLDOWN_SECS, MAX_ATTEMPTS};
use meeting_quality::services::{Freshness, MeetingQuery};

mod common;
use common::{
    meetings_ok, provider_error, qualities_body, qualities_ok, session_record, test_client,
    token_ok, MockUpstream, Scripted, CLIENT_ID,
};

#[tokio::test]
async fn test_live_fetch_is_cached() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(qualities_ok(&["Ada", "Bob"], 0.1));
    let (mut client, cache) = test_client(&upstream, session_record("access-1", "refresh-1")).await;

    let fetch = client.get_meeting_qualities("m1").await.unwrap();

    assert_eq!(fetch.freshness, Freshness::Live);
    assert_eq!(fetch.report.meeting_id, "m1");
    assert_eq!(fetch.report.media_sessions.len(), 2);
    assert!(!client.tokens_refreshed());

    assert_eq!(upstream.webex.bearer_tokens(), vec!["access-1"]);
    assert_eq!(upstream.webex.queries()[0]["meetingId"], "m1");

    let cached = cache.retrieve(CLIENT_ID, "m1").await.unwrap().unwrap();
    assert_eq!(cached.report, fetch.report);
}

#[tokio::test]
async fn test_second_fetch_replaces_cached_payload() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(qualities_ok(&["Ada"], 0.1));
    upstream.webex.qualities.push(qualities_ok(&["Ada"], 0.9));
    let (mut client, cache) = test_client(&upstream, session_record("a", "r")).await;

    client.get_meeting_qualities("m1").await.unwrap();
    client.get_meeting_qualities("m1").await.unwrap();

    let cached = cache.retrieve(CLIENT_ID, "m1").await.unwrap().unwrap();
    assert_eq!(
        cached.report.media_sessions[0].audio_in[0].packet_loss,
        vec![0.9]
    );
    assert_eq!(cache.count_for_account(CLIENT_ID).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unauthorized_refreshes_and_retries() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(Scripted::status(401));
    upstream.webex.qualities.push(qualities_ok(&["Ada"], 0.1));
    upstream.webex.token.push(token_ok("access-2", "refresh-2"));
    let (mut client, _cache) = test_client(&upstream, session_record("access-1", "refresh-1")).await;

    let fetch = client.get_meeting_qualities("m1").await.unwrap();

    assert_eq!(fetch.freshness, Freshness::Live);
    assert!(client.tokens_refreshed());
    assert_eq!(client.tokens().access_token, "access-2");
    assert_eq!(client.tokens().refresh_token, "refresh-2");
    assert_eq!(client.record().tokens, *client.tokens());

    assert_eq!(upstream.webex.bearer_tokens(), vec!["access-1", "access-2"]);
    assert_eq!(upstream.webex.token_forms()[0]["refresh_token"], "refresh-1");
}

#[tokio::test]
async fn test_persistent_unauthorized_exhausts_retries() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(Scripted::status(401));
    upstream.webex.token.push(token_ok("access-n", "refresh-n"));
    let (mut client, _cache) = test_client(&upstream, session_record("access-1", "refresh-1")).await;

    let err = client.get_meeting_qualities("m1").await.unwrap_err();

    assert!(matches!(err, ApiError::ExhaustedRetries { attempts } if attempts == MAX_ATTEMPTS));
    assert!(err.requires_reauthentication());
    assert_eq!(upstream.webex.qualities.calls(), MAX_ATTEMPTS as usize);
    assert_eq!(upstream.webex.token.calls(), MAX_ATTEMPTS as usize - 1);
}

#[tokio::test]
async fn test_failed_refresh_stops_the_call() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(Scripted::status(401));
    upstream
        .webex
        .token
        .push(provider_error(400, "Bad Request", "refresh token expired"));
    let (mut client, _cache) = test_client(&upstream, session_record("access-1", "refresh-1")).await;

    let err = client.get_meeting_qualities("m1").await.unwrap_err();

    assert!(matches!(err, ApiError::Auth { .. }));
    assert_eq!(upstream.webex.qualities.calls(), 1);
    assert_eq!(upstream.webex.token.calls(), 1);
    assert!(!client.tokens_refreshed());
    assert_eq!(client.tokens().access_token, "access-1");
}

#[tokio::test]
async fn test_rate_limited_serves_cached_payload_unchanged() {
    let upstream = MockUpstream::start().await;
    let (mut client, cache) = test_client(&upstream, session_record("a", "r")).await;
    let raw = qualities_body(&["Ada"], 0.3).to_string();
    cache.save("m1", CLIENT_ID, &raw).await.unwrap();
    let before = cache.retrieve(CLIENT_ID, "m1").await.unwrap().unwrap();
    upstream.webex.qualities.push(Scripted::status(429));

    let fetch = client.get_meeting_qualities("m1").await.unwrap();

    assert_eq!(
        fetch.freshness,
        Freshness::Cached {
            fetched_at: before.fetched_at
        }
    );
    assert_eq!(fetch.report, before.report);

    let after = cache.retrieve(CLIENT_ID, "m1").await.unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_rate_limited_without_cache() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(Scripted::status(429));
    let (mut client, _cache) = test_client(&upstream, session_record("a", "r")).await;

    let err = client.get_meeting_qualities("m1").await.unwrap_err();

    match err {
        ApiError::RateLimitedNoCache {
            meeting_id,
            retry_after_secs,
        } => {
            assert_eq!(meeting_id, "m1");
            assert_eq!(retry_after_secs, ANALYTICS_COOLDOWN_SECS);
        }
        other => panic!("expected RateLimitedNoCache, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited_honours_retry_after() {
    let upstream = MockUpstream::start().await;
    upstream
        .webex
        .qualities
        .push(Scripted::status(429).with_header("retry-after", "42"));
    let (mut client, _cache) = test_client(&upstream, session_record("a", "r")).await;

    let err = client.get_meeting_qualities("m1").await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::RateLimitedNoCache {
            retry_after_secs: 42,
            ..
        }
    ));
}

#[tokio::test]
async fn test_cache_is_per_account() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(Scripted::status(429));
    let (mut client, cache) = test_client(&upstream, session_record("a", "r")).await;
    let raw = qualities_body(&["Ada"], 0.3).to_string();
    cache.save("m1", "someone-else", &raw).await.unwrap();

    let err = client.get_meeting_qualities("m1").await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimitedNoCache { .. }));
}

#[tokio::test]
async fn test_no_content_is_empty_report() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(Scripted::status(204));
    let (mut client, cache) = test_client(&upstream, session_record("a", "r")).await;

    let fetch = client.get_meeting_qualities("m1").await.unwrap();

    assert_eq!(fetch.freshness, Freshness::Empty);
    assert_eq!(fetch.report.meeting_id, "m1");
    assert!(fetch.report.media_sessions.is_empty());
    assert!(cache.retrieve(CLIENT_ID, "m1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_server_error_is_unexpected_status() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(Scripted::raw(500, "boom"));
    let (mut client, _cache) = test_client(&upstream, session_record("a", "r")).await;

    let err = client.get_meeting_qualities("m1").await.unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedStatus { code: 500 }));
}

#[tokio::test]
async fn test_malformed_analytics_is_decode_error() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(Scripted::raw(200, "{\"items\": 7}"));
    let (mut client, cache) = test_client(&upstream, session_record("a", "r")).await;

    let err = client.get_meeting_qualities("m1").await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
    assert!(cache.retrieve(CLIENT_ID, "m1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_cache_failure_does_not_fail_the_fetch() {
    let upstream = MockUpstream::start().await;
    upstream.webex.qualities.push(qualities_ok(&["Ada"], 0.1));
    let (mut client, _cache) = test_client(&upstream, session_record("a", "r")).await;

    // Closing the pool makes every cache write fail
    let pool = meeting_quality::db::connect("sqlite::memory:").await.unwrap();
    let broken = meeting_quality::db::CacheStore::new(pool.clone());
    pool.close().await;
    let mut client_with_broken_cache = meeting_quality::services::WebexClient::new(
        reqwest::Client::new(),
        upstream.endpoints(),
        broken,
        client.record(),
    );

    let fetch = client_with_broken_cache
        .get_meeting_qualities("m1")
        .await
        .unwrap();
    assert_eq!(fetch.freshness, Freshness::Live);
    assert_eq!(fetch.report.media_sessions.len(), 1);

    // The original client is unaffected
    assert!(client.get_meeting_qualities("m1").await.is_ok());
}

#[tokio::test]
async fn test_list_meetings() {
    let upstream = MockUpstream::start().await;
    upstream.webex.meetings.push(meetings_ok(&["m1", "m2"]));
    let (mut client, _cache) = test_client(&upstream, session_record("access-1", "r")).await;

    let meetings = client
        .list_meetings(&MeetingQuery::last_days(30))
        .await
        .unwrap();

    let ids: Vec<&str> = meetings.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2"]);

    let query = &upstream.webex.queries()[0];
    assert_eq!(query["meetingType"], "meeting");
    assert!(query["from"].ends_with('Z'));
    assert!(query["to"].ends_with('Z'));
    assert_eq!(upstream.webex.bearer_tokens(), vec!["access-1"]);
}

#[tokio::test]
async fn test_list_meetings_refreshes_on_unauthorized() {
    let upstream = MockUpstream::start().await;
    upstream.webex.meetings.push(Scripted::status(401));
    upstream.webex.meetings.push(meetings_ok(&["m1"]));
    upstream.webex.token.push(token_ok("access-2", "refresh-2"));
    let (mut client, _cache) = test_client(&upstream, session_record("access-1", "r")).await;

    let meetings = client
        .list_meetings(&MeetingQuery::last_days(30))
        .await
        .unwrap();

    assert_eq!(meetings.len(), 1);
    assert!(client.tokens_refreshed());
}

#[tokio::test]
async fn test_list_meetings_rate_limited_is_unexpected_status() {
    let upstream = MockUpstream::start().await;
    upstream.webex.meetings.push(Scripted::status(429));
    let (mut client, _cache) = test_client(&upstream, session_record("a", "r")).await;

    let err = client
        .list_meetings(&MeetingQuery::last_days(30))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::UnexpectedStatus { code: 429 }));
}

#[tokio::test]
async fn test_list_meetings_no_content() {
    let upstream = MockUpstream::start().await;
    upstream.webex.meetings.push(Scripted::status(204));
    let (mut client, _cache) = test_client(&upstream, session_record("a", "r")).await;

    let meetings = client
        .list_meetings(&MeetingQuery::last_days(30))
        .await
        .unwrap();
    assert!(meetings.is_empty());
}
