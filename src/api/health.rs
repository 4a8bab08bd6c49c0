//! Health check endpoints
//!
//! This module provides health check endpoints for monitoring
//! and container orchestration (Kubernetes, ECS, etc.)

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::state::AppState;
use crate::services::RotatorStats;

/// Response for the main health check endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
}

/// Response for readiness probe
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<RotatorStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Individual readiness checks
#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub config_loaded: bool,
    pub youtube_credentials: bool,
    pub keyword_extraction: bool,
}

/// Response for liveness probe
#[derive(Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

/// Main health check endpoint
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Readiness probe endpoint
///
/// Ready once the YouTube key pool loads. Loading happens here on the first
/// probe if no request has needed a key yet. A missing OpenAI key is
/// reported but does not make the service unready.
///
/// GET /ready
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let pool = state.youtube.rotator().get().await;
    let keyword_extraction = state.settings.openai.api_key.is_some();

    let (credentials, error) = match pool {
        Ok(rotator) => (Some(rotator.stats()), None),
        Err(err) => (None, Some(err.to_string())),
    };

    let checks = ReadinessChecks {
        config_loaded: true,
        youtube_credentials: credentials.is_some(),
        keyword_extraction,
    };
    let ready = checks.config_loaded && checks.youtube_credentials;

    let status = if ready {
        StatusCode::OK
    } else {
        tracing::warn!(checks = ?checks, error = ?error, "Service not ready");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            checks,
            credentials,
            error,
        }),
    )
}

/// Liveness probe endpoint
///
/// GET /liveness
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { alive: true })
}
