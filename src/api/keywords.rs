//! Keyword extraction endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct KeywordRequest {
    pub prompt: String,
    #[serde(default)]
    pub max_keywords: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct KeywordResponse {
    pub keywords: Vec<String>,
}

/// POST /v1/keywords
pub async fn extract_keywords(
    State(state): State<AppState>,
    Json(request): Json<KeywordRequest>,
) -> ApiResult<Json<KeywordResponse>> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::InvalidRequest("prompt cannot be empty".to_string()));
    }

    let max_keywords = request
        .max_keywords
        .unwrap_or(state.settings.openai.max_keywords);
    if max_keywords == 0 {
        return Err(ApiError::InvalidRequest(
            "max_keywords must be greater than 0".to_string(),
        ));
    }

    let keywords = state.keywords.extract_keywords(prompt, max_keywords).await?;
    Ok(Json(KeywordResponse { keywords }))
}
