// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered HTML pages.
//!
//! Pages are small enough that they are built with `format!`. Every value
//! that did not come from this file goes through [`html_escape`].

use axum::{
    extract::Query,
    response::{Html, Redirect},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::fmt::Display;
use std::sync::Arc;

use crate::models::{DataPoint, MeetingSummary};
use crate::AppState;

/// Public pages. `/api` is protected and mounted by [`super::api::routes`].
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/error", get(error_page))
        .route("/message", get(message_page))
}

const STYLE: &str = "body{font-family:sans-serif;max-width:72rem;margin:2rem auto;padding:0 1rem}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:.25rem .5rem;text-align:left}\
pre{background:#f4f4f4;padding:1rem;overflow:auto}.notice{background:#fff3cd;padding:.5rem 1rem}\
label{display:block;margin:.5rem 0}";

/// Escape text for use in HTML element content and quoted attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Wrap page content in the shared layout.
pub fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = html_escape(title),
    ))
}

/// Redirect to the error page with `msg` shown to the user.
pub fn error_redirect(msg: impl Display) -> Redirect {
    Redirect::to(&format!(
        "/error?msg={}",
        urlencoding::encode(&msg.to_string())
    ))
}

/// Redirect to the message page.
pub fn message_redirect(msg: &str) -> Redirect {
    Redirect::to(&format!("/message?msg={}", urlencoding::encode(msg)))
}

#[derive(Deserialize)]
pub struct MessageParams {
    #[serde(default)]
    msg: String,
}

/// Landing page with the form that starts the OAuth flow.
async fn index() -> Html<String> {
    layout(
        "Webex Meeting Quality",
        "<p>Enter the client ID and secret of a Webex integration whose redirect URI \
         points at this server's <code>/auth</code> endpoint. The integration needs the \
         <code>analytics:read_all</code> and <code>meeting:schedules_read</code> scopes.</p>\n\
         <form method=\"post\" action=\"/init\">\n\
         <label>Client ID <input name=\"client_id\" required></label>\n\
         <label>Client Secret <input name=\"client_secret\" type=\"password\" required></label>\n\
         <button type=\"submit\">Authorize</button>\n</form>",
    )
}

async fn error_page(Query(params): Query<MessageParams>) -> Html<String> {
    let msg = if params.msg.is_empty() {
        "Unknown error"
    } else {
        params.msg.as_str()
    };
    layout(
        "Error",
        &format!(
            "<p>{}</p>\n<p><a href=\"/\">Home</a></p>",
            html_escape(msg)
        ),
    )
}

async fn message_page(Query(params): Query<MessageParams>) -> Html<String> {
    // Only a real message (the OAuth callback's) leads on to the API page
    let (msg, link) = if params.msg.is_empty() {
        ("Unknown message", "<a href=\"/\">Home</a>")
    } else {
        (params.msg.as_str(), "<a href=\"/api\">Continue to API calls</a>")
    };
    layout(
        "Message",
        &format!("<p>{}</p>\n<p>{link}</p>", html_escape(msg)),
    )
}

/// API calls page shown to authenticated sessions.
pub fn api_page() -> Html<String> {
    let selectors: String = DataPoint::ALL
        .iter()
        .map(|dp| format!("<option value=\"{dp}\">{dp}</option>"))
        .collect();

    layout(
        "API Calls",
        &format!(
            "<ul>\n<li><a href=\"/api/get_meetings\">List meetings</a></li>\n</ul>\n\
             <h2>Meeting analytics</h2>\n\
             <form method=\"get\" action=\"/api/get_analytics\">\n\
             <label>Meeting ID <input name=\"id\" required></label>\n\
             <button type=\"submit\">Get analytics</button>\n</form>\n\
             <form method=\"get\" action=\"/api/visualize\">\n\
             <label>Meeting ID <input name=\"id\" required></label>\n\
             <label>Data point <select name=\"dp\">{selectors}</select></label>\n\
             <button type=\"submit\">Visualize</button>\n</form>\n\
             <form method=\"get\" action=\"/api/export\">\n\
             <label>Meeting ID <input name=\"id\" required></label>\n\
             <button type=\"submit\">Export all series</button>\n</form>\n\
             <p><a href=\"/auth/logout\">Log out</a></p>"
        ),
    )
}

/// Table of meetings, each linking to its analytics.
pub fn meetings_page(meetings: &[MeetingSummary]) -> Html<String> {
    if meetings.is_empty() {
        return layout(
            "Meetings",
            "<p>No meetings found.</p>\n<p><a href=\"/api\">Back</a></p>",
        );
    }

    let rows: String = meetings
        .iter()
        .map(|m| {
            let id = urlencoding::encode(&m.id);
            format!(
                "<tr><td>{title}</td><td>{number}</td><td>{start}</td><td>{end}</td>\
                 <td>{host}</td><td>{state}</td>\
                 <td><a href=\"/api/get_analytics?id={id}\">analytics</a> \
                 <a href=\"/api/export?id={id}\">export</a></td></tr>\n",
                title = html_escape(&m.title),
                number = html_escape(&m.meeting_number),
                start = html_escape(&m.start),
                end = html_escape(&m.end),
                host = html_escape(&m.host_display_name),
                state = html_escape(&m.state),
            )
        })
        .collect();

    layout(
        "Meetings",
        &format!(
            "<table>\n<tr><th>Title</th><th>Number</th><th>Start</th><th>End</th>\
             <th>Host</th><th>State</th><th></th></tr>\n{rows}</table>\n\
             <p><a href=\"/api\">Back</a></p>"
        ),
    )
}

/// Pretty-printed analytics, with an optional notice above them.
pub fn analytics_page(meeting_id: &str, pretty_json: &str, notice: Option<&str>) -> Html<String> {
    let notice = notice
        .map(|n| format!("<p class=\"notice\">{}</p>\n", html_escape(n)))
        .unwrap_or_default();
    let id = urlencoding::encode(meeting_id);

    layout(
        "Meeting Analytics",
        &format!(
            "<p>Meeting <code>{}</code></p>\n{notice}<pre>{}</pre>\n\
             <p><a href=\"/api/export?id={id}\">Export series</a> | <a href=\"/api\">Back</a></p>",
            html_escape(meeting_id),
            html_escape(pretty_json),
        ),
    )
}
