//! YouTube Data API v3 schema types
//!
//! Only the fields this service reads are modelled; unknown fields are
//! ignored. Counters arrive as JSON strings and are parsed into integers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

// ============================================================================
// Shared
// ============================================================================

/// `snippet` part shared by channels, videos and search results
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnails: HashMap<String, Thumbnail>,
}

impl Snippet {
    /// Best available thumbnail URL (high, then medium, then default)
    pub fn thumbnail_url(&self) -> Option<&str> {
        ["high", "medium", "default"]
            .iter()
            .find_map(|size| self.thumbnails.get(*size))
            .map(|thumb| thumb.url.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub results_per_page: u32,
}

/// Parse an optional counter that YouTube encodes as a decimal string
fn string_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Counter {
        Text(String),
        Number(u64),
    }

    match Option::<Counter>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Counter::Number(n)) => Ok(Some(n)),
        Some(Counter::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// search.list
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResult {
    pub id: SearchResultId,
    #[serde(default)]
    pub snippet: Snippet,
}

/// Resource identifier of a search hit; which field is set depends on `kind`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

// ============================================================================
// channels.list
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<Channel>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub snippet: Snippet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ChannelStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding_settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default, deserialize_with = "string_u64")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "string_u64")]
    pub subscriber_count: Option<u64>,
    #[serde(default)]
    pub hidden_subscriber_count: bool,
    #[serde(default, deserialize_with = "string_u64")]
    pub video_count: Option<u64>,
}

// ============================================================================
// videos.list
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<Video>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<Snippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<VideoStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_details: Option<ContentDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VideoStatus>,
}

impl Video {
    /// Whether the video may be played in an embedded player
    pub fn is_embeddable(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|status| status.embeddable)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default, deserialize_with = "string_u64")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "string_u64")]
    pub like_count: Option<u64>,
    #[serde(default, deserialize_with = "string_u64")]
    pub favorite_count: Option<u64>,
    #[serde(default, deserialize_with = "string_u64")]
    pub comment_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetails {
    /// ISO 8601 duration, e.g. `PT4M13S`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

// ============================================================================
// commentThreads.list
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommentThreadListResponse {
    #[serde(default)]
    pub items: Vec<CommentThread>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    pub top_level_comment: Comment,
    #[serde(default)]
    pub total_reply_count: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Comment {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    #[serde(default)]
    pub author_display_name: String,
    #[serde(default)]
    pub text_display: String,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Errors
// ============================================================================

/// Error envelope returned with non-2xx responses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YouTubeErrorResponse {
    pub error: YouTubeErrorBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YouTubeErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<YouTubeErrorItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YouTubeErrorItem {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub message: String,
}

impl YouTubeErrorResponse {
    /// First machine-readable reason, e.g. `quotaExceeded`
    pub fn reason(&self) -> Option<&str> {
        self.error
            .errors
            .iter()
            .map(|item| item.reason.as_str())
            .find(|reason| !reason.is_empty())
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// Profile, latest uploads and upload statistics for one creator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorData {
    pub channel_profile: Channel,
    pub latest_videos: Vec<SearchResult>,
    pub video_stats: Vec<Video>,
}

// ============================================================================
// Tests
// ============================================================================
