//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    http::HeaderName,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{channels, health, keywords, recommendations};
use crate::middleware::logging::{log_request, REQUEST_ID_HEADER, TRACE_ID_HEADER};
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/liveness", get(health::liveness));

    let api_routes = Router::new()
        .route("/channels/search", get(channels::search_channels))
        .route("/channels/:channel_id", get(channels::get_channel))
        .route("/channels/:channel_id/videos", get(channels::get_channel_videos))
        .route("/creators", post(channels::get_creators))
        .route("/keywords", post(keywords::extract_keywords))
        .route("/recommendations", post(recommendations::recommend));

    Router::new()
        .nest("/v1", api_routes)
        .merge(health_routes)
        // Last added = outermost: logging sees CORS responses too
        .layer(create_cors_layer())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Create CORS layer with permissive settings
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static(TRACE_ID_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}
