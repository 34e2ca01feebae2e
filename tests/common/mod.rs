// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: a scripted mock of the Webex endpoints and an app
//! wired against it.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Form, Router,
};
use chrono::Utc;
use meeting_quality::config::{Config, WebexEndpoints};
use meeting_quality::db::{self, CacheStore};
use meeting_quality::middleware::auth::{create_session_jwt, SESSION_COOKIE};
use meeting_quality::models::{Credentials, SessionRecord, TokenState};
use meeting_quality::routes::create_router;
use meeting_quality::services::WebexClient;
use meeting_quality::AppState;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CLIENT_ID: &str = "test-client";

/// One canned upstream response.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(&'static str, String)>,
}

#[allow(dead_code)]
impl Scripted {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::raw(status, "")
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

/// Queue of responses for one endpoint. The last entry repeats once the
/// others are used up.
#[derive(Default)]
pub struct Script {
    queue: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl Script {
    pub fn push(&self, response: Scripted) {
        self.queue.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Scripted {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.queue.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Scripted::raw(500, r#"{"message":"unscripted"}"#))
        }
    }
}

/// Everything the mock has been asked and what it will answer.
#[derive(Default)]
pub struct MockWebex {
    pub token: Script,
    pub meetings: Script,
    pub qualities: Script,
    /// Form bodies posted to the token endpoint, in order
    pub token_forms: Mutex<Vec<HashMap<String, String>>>,
    /// Bearer tokens presented to the resource endpoints, in order
    pub bearer_tokens: Mutex<Vec<String>>,
    /// Query strings sent to the resource endpoints, in order
    pub queries: Mutex<Vec<HashMap<String, String>>>,
}

#[allow(dead_code)]
impl MockWebex {
    pub fn token_forms(&self) -> Vec<HashMap<String, String>> {
        self.token_forms.lock().unwrap().clone()
    }

    pub fn bearer_tokens(&self) -> Vec<String> {
        self.bearer_tokens.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<HashMap<String, String>> {
        self.queries.lock().unwrap().clone()
    }

    fn record_resource_call(&self, headers: &HeaderMap, query: HashMap<String, String>) {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .unwrap_or("")
            .to_string();
        self.bearer_tokens.lock().unwrap().push(bearer);
        self.queries.lock().unwrap().push(query);
    }
}

/// A running mock Webex server.
pub struct MockUpstream {
    pub base_url: String,
    pub webex: Arc<MockWebex>,
}

impl MockUpstream {
    /// Bind to an ephemeral local port and start serving.
    pub async fn start() -> Self {
        let webex = Arc::new(MockWebex::default());

        let app = Router::new()
            .route("/v1/access_token", post(token_endpoint))
            .route("/v1/meetings", get(meetings_endpoint))
            .route("/v1/meeting/qualities", get(qualities_endpoint))
            .with_state(webex.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            webex,
        }
    }

    #[allow(dead_code)]
    pub fn endpoints(&self) -> WebexEndpoints {
        WebexEndpoints::with_base_url(&self.base_url)
    }
}

async fn token_endpoint(
    State(webex): State<Arc<MockWebex>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    webex.token_forms.lock().unwrap().push(form);
    respond(webex.token.next())
}

async fn meetings_endpoint(
    State(webex): State<Arc<MockWebex>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    webex.record_resource_call(&headers, query);
    respond(webex.meetings.next())
}

async fn qualities_endpoint(
    State(webex): State<Arc<MockWebex>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    webex.record_resource_call(&headers, query);
    respond(webex.qualities.next())
}

fn respond(scripted: Scripted) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::from_u16(scripted.status).unwrap())
        .header(header::CONTENT_TYPE, "application/json");
    for (name, value) in &scripted.headers {
        builder = builder.header(*name, value);
    }
    let body = if scripted.status == 204 {
        Body::empty()
    } else {
        Body::from(scripted.body)
    };
    builder.body(body).unwrap()
}

// ─── Canned payloads ─────────────────────────────────────────

/// Successful token endpoint response.
#[allow(dead_code)]
pub fn token_ok(access: &str, refresh: &str) -> Scripted {
    Scripted::json(
        200,
        json!({
            "access_token": access,
            "expires_in": 1_209_600,
            "refresh_token": refresh,
            "refresh_token_expires_in": 7_776_000,
        }),
    )
}

/// Webex-style error body.
#[allow(dead_code)]
pub fn provider_error(status: u16, message: &str, description: &str) -> Scripted {
    Scripted::json(
        status,
        json!({
            "message": message,
            "errors": [{"description": description}],
            "trackingId": "ROUTER_TEST",
        }),
    )
}

/// Analytics payload with one session per name, each with one audio-in window.
#[allow(dead_code)]
pub fn qualities_body(names: &[&str], loss: f64) -> serde_json::Value {
    let items: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "displayName": name,
                "participantId": format!("p{i}"),
                "audioIn": [{
                    "samplingInterval": 60,
                    "startTime": format!("2024-05-01T10:0{i}:00Z"),
                    "endTime": format!("2024-05-01T10:0{}:00Z", i + 1),
                    "packetLoss": [loss],
                    "latency": [20.0],
                    "jitter": [2.0],
                }],
            })
        })
        .collect();
    json!({ "items": items })
}

#[allow(dead_code)]
pub fn qualities_ok(names: &[&str], loss: f64) -> Scripted {
    Scripted::json(200, qualities_body(names, loss))
}

#[allow(dead_code)]
pub fn meetings_ok(ids: &[&str]) -> Scripted {
    let items: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| json!({"id": id, "title": format!("Meeting {id}"), "meetingType": "meeting"}))
        .collect();
    Scripted::json(200, json!({ "items": items }))
}

// ─── App wiring ──────────────────────────────────────────────

#[allow(dead_code)]
pub fn session_record(access: &str, refresh: &str) -> SessionRecord {
    SessionRecord {
        credentials: Credentials {
            client_id: CLIENT_ID.to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "http://localhost:3000/auth".to_string(),
        },
        tokens: TokenState {
            access_token: access.to_string(),
            expires_in: 1_209_600,
            refresh_token: refresh.to_string(),
            refresh_token_expires_in: 7_776_000,
            issued_at: Utc::now(),
        },
    }
}

/// In-memory cache store.
#[allow(dead_code)]
pub async fn test_cache() -> CacheStore {
    CacheStore::new(db::connect("sqlite::memory:").await.unwrap())
}

/// Client for `record` against the mock, with its own in-memory cache.
#[allow(dead_code)]
pub async fn test_client(upstream: &MockUpstream, record: SessionRecord) -> (WebexClient, CacheStore) {
    let cache = test_cache().await;
    let client = WebexClient::new(
        reqwest::Client::new(),
        upstream.endpoints(),
        cache.clone(),
        record,
    );
    (client, cache)
}

/// Create a test app talking to `upstream`.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app(upstream: &MockUpstream) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.webex = upstream.endpoints();

    let pool = db::connect(&config.database_url).await.unwrap();
    let state = Arc::new(AppState::new(config, pool).unwrap());

    (create_router(state.clone()), state)
}

/// Store `record` as a session and return its handle plus a `Cookie` header value.
#[allow(dead_code)]
pub async fn login(state: &AppState, record: &SessionRecord) -> (String, String) {
    let id = state.sessions.create(record).await.unwrap();
    let jwt = create_session_jwt(
        &id,
        &state.config.session_signing_key,
        Utc::now() + chrono::Duration::hours(1),
    )
    .unwrap();
    (id, format!("{SESSION_COOKIE}={jwt}"))
}
