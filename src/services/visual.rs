// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reshape quality reports into per-data-point series for charts and export.

use crate::error::ApiError;
use crate::models::{DataPoint, MediaSession, QualityReport, SampleWindow, SessionSeries, VisualSeries};

/// Build the series for one selector (`audio_in`, `video_out`, ...).
pub fn build_series(report: &QualityReport, selector: &str) -> Result<VisualSeries, ApiError> {
    let data_point: DataPoint = selector.parse()?;
    series_for(report, data_point)
}

/// Build the series for every selector, in [`DataPoint::ALL`] order.
///
/// Unlike [`series_for`], a session with no windows for a data point does
/// not fail the whole export: it is kept with empty metric vectors, so every
/// series lists the same participants in the same order. Bounds come from
/// the sessions that do have windows and are `None` when none do.
pub fn build_all_series(report: &QualityReport) -> Vec<VisualSeries> {
    DataPoint::ALL
        .into_iter()
        .map(|dp| assemble(report, dp).0)
        .collect()
}

/// Concatenate each session's packet loss, latency and jitter in window order.
///
/// The series spans from the first session's first window to the last
/// session's last window of this data point. Every session must have at
/// least one window for it.
pub fn series_for(report: &QualityReport, data_point: DataPoint) -> Result<VisualSeries, ApiError> {
    match assemble(report, data_point) {
        (series, None) => Ok(series),
        (_, Some(session)) => Err(ApiError::NoSamples {
            data_point,
            session,
        }),
    }
}

/// Build the series and report the first session without windows, if any.
fn assemble(report: &QualityReport, data_point: DataPoint) -> (VisualSeries, Option<usize>) {
    let mut sessions = Vec::with_capacity(report.media_sessions.len());
    let mut start_time = None;
    let mut end_time = None;
    let mut missing = None;

    for (index, session) in report.media_sessions.iter().enumerate() {
        let samples = windows(session, data_point);
        match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => {
                if start_time.is_none() {
                    start_time = Some(first.start_time.clone());
                }
                end_time = Some(last.end_time.clone());
            }
            _ => {
                missing.get_or_insert(index);
            }
        }

        sessions.push(flatten(session, samples));
    }

    let series = VisualSeries {
        meeting_id: report.meeting_id.clone(),
        data_point,
        start_time,
        end_time,
        sessions,
    };
    (series, missing)
}

fn windows(session: &MediaSession, data_point: DataPoint) -> &[SampleWindow] {
    match data_point {
        DataPoint::AudioIn => &session.audio_in,
        DataPoint::AudioOut => &session.audio_out,
        DataPoint::VideoIn => &session.video_in,
        DataPoint::VideoOut => &session.video_out,
        DataPoint::ShareIn => &session.share_in,
        DataPoint::ShareOut => &session.share_out,
    }
}

fn flatten(session: &MediaSession, windows: &[SampleWindow]) -> SessionSeries {
    let participant = if session.display_name.is_empty() {
        session.participant_id.clone()
    } else {
        session.display_name.clone()
    };

    SessionSeries {
        participant,
        packet_loss: windows.iter().flat_map(|w| w.packet_loss.iter().copied()).collect(),
        latency: windows.iter().flat_map(|w| w.latency.iter().copied()).collect(),
        jitter: windows.iter().flat_map(|w| w.jitter.iter().copied()).collect(),
    }
}
