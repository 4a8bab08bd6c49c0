//! Channel endpoints
//!
//! Thin HTTP wrappers over the YouTube client.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::schemas::youtube::{Channel, CreatorData, SearchResult};
use crate::server::state::AppState;

const DEFAULT_MAX_RESULTS: u32 = 5;

/// Upper bound on channels per creators request
const MAX_CREATOR_IDS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub max_results: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoParams {
    #[serde(default)]
    pub max_results: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ChannelSearchResponse {
    pub keyword: String,
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
pub struct ChannelVideosResponse {
    pub channel_id: String,
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct CreatorsRequest {
    pub channel_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatorsResponse {
    pub creators: Vec<CreatorData>,
}

/// GET /v1/channels/search?q=&max_results=
pub async fn search_channels(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<ChannelSearchResponse>> {
    let keyword = params
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("Query parameter 'q' is required".to_string()))?;

    let items = state
        .youtube
        .search_channels(&keyword, params.max_results.unwrap_or(DEFAULT_MAX_RESULTS))
        .await?;

    Ok(Json(ChannelSearchResponse { keyword, items }))
}

/// GET /v1/channels/:channel_id
pub async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> ApiResult<Json<Channel>> {
    state
        .youtube
        .get_channel_details(&channel_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Channel '{}' not found", channel_id)))
}

/// GET /v1/channels/:channel_id/videos?max_results=
pub async fn get_channel_videos(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(params): Query<VideoParams>,
) -> ApiResult<Json<ChannelVideosResponse>> {
    let items = state
        .youtube
        .get_latest_videos(&channel_id, params.max_results.unwrap_or(DEFAULT_MAX_RESULTS))
        .await?;

    Ok(Json(ChannelVideosResponse { channel_id, items }))
}

/// POST /v1/creators
pub async fn get_creators(
    State(state): State<AppState>,
    Json(request): Json<CreatorsRequest>,
) -> ApiResult<Json<CreatorsResponse>> {
    let channel_ids: Vec<String> = request
        .channel_ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();

    if channel_ids.is_empty() {
        return Err(ApiError::InvalidRequest(
            "channel_ids must contain at least one channel ID".to_string(),
        ));
    }
    if channel_ids.len() > MAX_CREATOR_IDS {
        return Err(ApiError::InvalidRequest(format!(
            "At most {} channel IDs per request",
            MAX_CREATOR_IDS
        )));
    }

    let creators = state.youtube.get_creator_data_by_ids(&channel_ids).await?;
    Ok(Json(CreatorsResponse { creators }))
}
