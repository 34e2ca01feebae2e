// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod oauth;
pub mod visual;
pub mod webex;

pub use oauth::TokenManager;
pub use visual::{build_all_series, build_series};
pub use webex::{Freshness, MeetingQuery, QualityFetch, WebexClient};
