//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload containing the server
//! version, uptime, the resolved upstream settings, cumulative request
//! statistics and build metadata.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::ProxySummary;
use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub upstream: ProxySummary,
    pub stats: StatsResponse,
    pub build: BuildInfo,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests_forwarded: u64,
    pub requests_failed: u64,
}

#[derive(Serialize, Deserialize)]
pub struct BuildInfo {
    pub git: String,
    pub profile: String,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let forwarder = &state.forwarder;
    let stats = forwarder.stats();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        upstream: forwarder.config().summary(),
        stats: StatsResponse {
            requests_forwarded: stats.forwarded.load(Ordering::Relaxed),
            requests_failed: stats.failed.load(Ordering::Relaxed),
        },
        build: BuildInfo {
            git: env!("RELAY_GIT_SHORT").to_string(),
            profile: env!("RELAY_BUILD_PROFILE").to_string(),
        },
    })
}
