// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-meeting media quality analytics.
//!
//! These mirror the payload of `GET /v1/meeting/qualities`. The raw upstream
//! body is what gets cached; these types are only the decoded view of it.

use serde::{Deserialize, Serialize};

/// Quality samples for every media session of one meeting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Filled in locally; the upstream payload does not carry it.
    #[serde(default)]
    pub meeting_id: String,
    #[serde(rename = "items", default)]
    pub media_sessions: Vec<MediaSession>,
}

impl QualityReport {
    /// An empty report for a meeting with no analytics (HTTP 204).
    pub fn empty(meeting_id: &str) -> Self {
        Self {
            meeting_id: meeting_id.to_string(),
            media_sessions: Vec::new(),
        }
    }
}

/// One participant's connection for the meeting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaSession {
    pub meeting_id: String,
    pub display_name: String,
    pub email: String,
    pub joined: String,
    pub client: String,
    pub client_version: String,
    pub os_type: String,
    pub os_version: String,
    pub hardware_type: String,
    pub speaker_name: String,
    pub network_type: String,
    #[serde(rename = "localIP")]
    pub local_ip: String,
    #[serde(rename = "publicIP")]
    pub public_ip: String,
    #[serde(rename = "maskedLocalIP")]
    pub masked_local_ip: String,
    #[serde(rename = "maskedPublicIP")]
    pub masked_public_ip: String,
    pub camera: String,
    pub microphone: String,
    pub server_region: String,
    pub video_mesh_cluster: String,
    pub participant_id: String,
    /// Downstream video (sent to the client)
    pub video_in: Vec<SampleWindow>,
    /// Upstream video (sent from the client)
    pub video_out: Vec<SampleWindow>,
    pub audio_in: Vec<SampleWindow>,
    pub audio_out: Vec<SampleWindow>,
    pub share_in: Vec<SampleWindow>,
    pub share_out: Vec<SampleWindow>,
    /// Device CPU usage
    pub resources: Vec<DeviceResources>,
}

/// Metrics sampled over one window of a directional media stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SampleWindow {
    pub sampling_interval: i64,
    pub start_time: String,
    pub end_time: String,
    pub packet_loss: Vec<f64>,
    pub latency: Vec<f64>,
    pub jitter: Vec<f64>,
    pub media_bit_rate: Vec<f64>,
    pub resolution_height: Vec<f64>,
    pub frame_rate: Vec<f64>,
    pub codec: String,
    pub transport_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceResources {
    #[serde(rename = "processAverageCPU")]
    pub process_average_cpu: Vec<f64>,
    #[serde(rename = "processMaxCPU")]
    pub process_max_cpu: Vec<f64>,
    #[serde(rename = "systemAverageCPU")]
    pub system_average_cpu: Vec<f64>,
    #[serde(rename = "systemMaxCPU")]
    pub system_max_cpu: Vec<f64>,
}
