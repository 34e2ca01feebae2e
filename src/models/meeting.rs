// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meeting list returned by the Webex meetings endpoint.

use serde::{Deserialize, Serialize};

/// Response envelope of `GET /v1/meetings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingsList {
    #[serde(default)]
    pub items: Vec<MeetingSummary>,
}

/// A scheduled meeting. Read-only, never persisted locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeetingSummary {
    pub id: String,
    pub meeting_number: String,
    pub title: String,
    pub agenda: String,
    pub meeting_type: String,
    pub state: String,
    pub timezone: String,
    pub start: String,
    pub end: String,
    pub recurrence: String,
    pub host_user_id: String,
    pub host_display_name: String,
    pub host_email: String,
    pub site_url: String,
    pub web_link: String,
    pub sip_address: String,
    pub enable_auto_record_meeting: bool,
    pub allow_user_to_be_co_host: bool,
    pub enabled_join_before_host: bool,
    pub enable_connect_audio_before_host: bool,
    pub join_before_host_minutes: i64,
    pub exclude_password: bool,
    pub public_meeting: bool,
    pub unlocked_meeting_join_security: String,
    pub scheduled_type: String,
    pub enable_automatic_lock: bool,
    pub automatic_lock_minutes: i64,
    pub allow_authenticated_devices: bool,
}
