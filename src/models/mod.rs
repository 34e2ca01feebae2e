// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod auth;
pub mod meeting;
pub mod quality;
pub mod visual;

pub use auth::{Credentials, SessionRecord, TokenState};
pub use meeting::{MeetingSummary, MeetingsList};
pub use quality::{DeviceResources, MediaSession, QualityReport, SampleWindow};
pub use visual::{AnalyticsExport, DataPoint, SessionSeries, VisualSeries};
