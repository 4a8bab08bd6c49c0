//! Recommendation endpoint

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::server::state::AppState;
use crate::services::Recommendation;

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub query: String,
}

/// POST /v1/recommendations
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> ApiResult<Json<Recommendation>> {
    let recommendation = state.recommendations.recommend(&request.query).await?;
    Ok(Json(recommendation))
}
