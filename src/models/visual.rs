// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chartable series derived from a quality report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// Which directional media stream a series is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataPoint {
    AudioIn,
    AudioOut,
    VideoIn,
    VideoOut,
    ShareIn,
    ShareOut,
}

impl DataPoint {
    /// Every selector, in export order.
    pub const ALL: [DataPoint; 6] = [
        DataPoint::AudioIn,
        DataPoint::AudioOut,
        DataPoint::VideoIn,
        DataPoint::VideoOut,
        DataPoint::ShareIn,
        DataPoint::ShareOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataPoint::AudioIn => "audio_in",
            DataPoint::AudioOut => "audio_out",
            DataPoint::VideoIn => "video_in",
            DataPoint::VideoOut => "video_out",
            DataPoint::ShareIn => "share_in",
            DataPoint::ShareOut => "share_out",
        }
    }
}

impl fmt::Display for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataPoint {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataPoint::ALL
            .into_iter()
            .find(|dp| dp.as_str() == s)
            .ok_or_else(|| ApiError::InvalidSelector(s.to_string()))
    }
}

/// One data point's metrics across every session of a meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualSeries {
    pub meeting_id: String,
    pub data_point: DataPoint,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub sessions: Vec<SessionSeries>,
}

/// Flattened metrics of a single media session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSeries {
    pub participant: String,
    pub packet_loss: Vec<f64>,
    pub latency: Vec<f64>,
    pub jitter: Vec<f64>,
}

/// Body of the downloadable analytics export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsExport {
    pub analytics: Vec<VisualSeries>,
}
