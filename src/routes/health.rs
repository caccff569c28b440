//! Health check endpoints
//!
//! - /health, /healthz - liveness probe (is the service running?)
//! - /ready, /readyz - readiness probe (is the store reachable?)
//! - /version - build metadata for deployment verification

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::routes::json_response;
use crate::server::AppState;

/// Health response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall health status (true if service is running)
    pub healthy: bool,
    /// 'online' or 'degraded'
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Seconds since process start
    pub uptime: u64,
    /// Current timestamp
    pub timestamp: String,
    /// Operating mode
    pub mode: String,
    /// Node identifier
    pub node_id: String,
    /// Storage backend status
    pub database: DatabaseHealth,
}

/// Storage backend details
#[derive(Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    /// "mongodb" or "memory"
    pub backend: &'static str,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let connected = state.store.is_connected();

    HealthResponse {
        healthy: true,
        status: if connected { "online" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
        node_id: state.args.node_id.to_string(),
        database: DatabaseHealth {
            connected,
            backend: state.store_backend,
        },
    }
}

/// Handle liveness probe (/health, /healthz)
///
/// Returns 200 OK whenever the service is running.
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &build_health_response(&state))
}

/// Handle readiness probe (/ready, /readyz)
///
/// Returns 200 only when the store is reachable; load balancers should use
/// this one.
pub fn readiness_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state);
    let status = if response.database.connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    json_response(status, &response)
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<Full<Bytes>> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "apiary",
    };

    json_response(StatusCode::OK, &response)
}
