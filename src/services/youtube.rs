//! YouTube service for YouTube Data API v3 interactions
//!
//! This module collects channel and video data over REST. Every outbound
//! call takes its API key from the shared credential pool and fails over to
//! the next key when YouTube reports an exhausted quota.

use crate::schemas::youtube::{
    Channel, ChannelListResponse, CommentThread, CommentThreadListResponse, CreatorData,
    SearchListResponse, SearchResult, Video, VideoListResponse, YouTubeErrorResponse,
};
use crate::services::credential_pool::{
    with_failover, ConfigurationError, FailoverError, LazyRotator, QuotaClassify,
};
use futures::{StreamExt, TryStreamExt};
use moka::future::Cache;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Upper bound YouTube accepts for `maxResults` on search and list calls
const MAX_PAGE_SIZE: u32 = 50;

/// Upper bound YouTube accepts for `maxResults` on commentThreads
const MAX_COMMENT_PAGE_SIZE: u32 = 100;

/// Upper bound YouTube accepts for ids on one videos.list call
const MAX_VIDEO_IDS_PER_CALL: usize = 50;

/// Channels fetched concurrently by `get_creator_data_by_ids`
const CREATOR_FETCH_CONCURRENCY: usize = 4;

/// Reason YouTube uses for videos with comments turned off
const COMMENTS_DISABLED: &str = "commentsDisabled";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when calling the YouTube Data API
#[derive(Error, Debug)]
pub enum YouTubeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Quota error ({status} {reason}): {message}")]
    Quota {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("API error ({status} {reason}): {message}")]
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("All {attempts} YouTube API keys exhausted: {last}")]
    Exhausted { attempts: usize, last: String },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Shared(Arc<YouTubeError>),
}

impl YouTubeError {
    /// Classify a non-2xx response
    ///
    /// Every 429, and every 403 other than `commentsDisabled`, is a quota
    /// error that another key may get past.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<YouTubeErrorResponse>(body).ok();
        let reason = parsed
            .as_ref()
            .and_then(|err| err.reason())
            .unwrap_or("unknown")
            .to_string();
        let message = parsed
            .map(|err| err.error.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| body.to_string());

        let quota = status == 429 || (status == 403 && reason != COMMENTS_DISABLED);
        if quota {
            Self::Quota {
                status,
                reason,
                message,
            }
        } else {
            Self::Api {
                status,
                reason,
                message,
            }
        }
    }

    /// Upstream HTTP status, when the error came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Quota { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Shared(err) => err.status(),
            _ => None,
        }
    }

    /// Machine-readable YouTube reason, when the error came from a response
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Quota { reason, .. } | Self::Api { reason, .. } => Some(reason),
            Self::Shared(err) => err.reason(),
            _ => None,
        }
    }
}

/// Errors handed to every caller waiting on one coalesced search
impl From<Arc<YouTubeError>> for YouTubeError {
    fn from(err: Arc<YouTubeError>) -> Self {
        let shared = match Arc::try_unwrap(err) {
            Ok(err) => return err,
            Err(shared) => shared,
        };

        match shared.as_ref() {
            Self::Quota {
                status,
                reason,
                message,
            } => Self::Quota {
                status: *status,
                reason: reason.clone(),
                message: message.clone(),
            },
            Self::Api {
                status,
                reason,
                message,
            } => Self::Api {
                status: *status,
                reason: reason.clone(),
                message: message.clone(),
            },
            Self::Parse(message) => Self::Parse(message.clone()),
            Self::InvalidInput(message) => Self::InvalidInput(message.clone()),
            Self::Exhausted { attempts, last } => Self::Exhausted {
                attempts: *attempts,
                last: last.clone(),
            },
            Self::Configuration(err) => Self::Configuration(err.clone()),
            Self::Http(_) | Self::Shared(_) => Self::Shared(shared),
        }
    }
}

impl QuotaClassify for YouTubeError {
    fn is_quota_error(&self) -> bool {
        matches!(self, Self::Quota { .. })
    }
}

impl From<FailoverError<YouTubeError>> for YouTubeError {
    fn from(err: FailoverError<YouTubeError>) -> Self {
        match err {
            FailoverError::Failed(err) => err,
            FailoverError::Exhausted { attempts, last } => Self::Exhausted {
                attempts,
                last: last.to_string(),
            },
        }
    }
}

// ============================================================================
// YouTube Client
// ============================================================================

/// Configuration for the YouTube client
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    /// Base URL (default: www.googleapis.com/youtube/v3)
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// How long channel search results stay cached
    pub search_cache_ttl_seconds: u64,

    /// Maximum cached searches
    pub search_cache_capacity: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: 30,
            search_cache_ttl_seconds: 600,
            search_cache_capacity: 1_000,
        }
    }
}

impl YouTubeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_search_cache(mut self, ttl_seconds: u64, capacity: u64) -> Self {
        self.search_cache_ttl_seconds = ttl_seconds;
        self.search_cache_capacity = capacity;
        self
    }
}

/// Cache key for channel searches: (keyword, max_results)
type SearchKey = (String, u32);

/// Client for the YouTube Data API
#[derive(Clone)]
pub struct YouTubeClient {
    /// HTTP client
    client: Client,

    /// Base URL for API calls
    base_url: String,

    /// Shared API key pool
    rotator: Arc<LazyRotator>,

    /// Recent channel search results
    search_cache: Cache<SearchKey, Vec<SearchResult>>,
}

impl YouTubeClient {
    /// Create a new client over a shared key pool
    pub fn new(config: YouTubeConfig, rotator: Arc<LazyRotator>) -> Result<Self, YouTubeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let search_cache = Cache::builder()
            .max_capacity(config.search_cache_capacity)
            .time_to_live(Duration::from_secs(config.search_cache_ttl_seconds))
            .build();

        let base_url = config
            .base_url
            .unwrap_or_else(|| YOUTUBE_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        tracing::info!(
            base_url = %base_url,
            policy = %rotator.policy(),
            "Initialized YouTube client"
        );

        Ok(Self {
            client,
            base_url,
            rotator,
            search_cache,
        })
    }

    /// The key pool backing this client
    pub fn rotator(&self) -> &Arc<LazyRotator> {
        &self.rotator
    }

    /// Search channels by keyword
    pub async fn search_channels(
        &self,
        keyword: &str,
        max_results: u32,
    ) -> Result<Vec<SearchResult>, YouTubeError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(YouTubeError::InvalidInput(
                "Search keyword cannot be empty".to_string(),
            ));
        }
        let max_results = max_results.clamp(1, MAX_PAGE_SIZE);

        // Concurrent identical searches share one upstream call
        let cache_key = (keyword.to_lowercase(), max_results);
        self.search_cache
            .try_get_with(cache_key, async {
                let response: SearchListResponse = self
                    .call(
                        "search",
                        vec![
                            ("part", "snippet".to_string()),
                            ("q", keyword.to_string()),
                            ("type", "channel".to_string()),
                            ("maxResults", max_results.to_string()),
                        ],
                    )
                    .await?;

                tracing::info!(
                    keyword = %keyword,
                    results = response.items.len(),
                    "Channel search completed"
                );
                Ok::<_, YouTubeError>(response.items)
            })
            .await
            .map_err(YouTubeError::from)
    }

    /// Channel profile with statistics and branding; `None` if no such channel
    pub async fn get_channel_details(
        &self,
        channel_id: &str,
    ) -> Result<Option<Channel>, YouTubeError> {
        let channel_id = non_empty(channel_id, "Channel ID")?;
        let response: ChannelListResponse = self
            .call(
                "channels",
                vec![
                    ("part", "snippet,statistics,brandingSettings".to_string()),
                    ("id", channel_id.to_string()),
                ],
            )
            .await?;
        Ok(response.items.into_iter().next())
    }

    /// Most recent uploads of a channel, newest first
    pub async fn get_latest_videos(
        &self,
        channel_id: &str,
        max_results: u32,
    ) -> Result<Vec<SearchResult>, YouTubeError> {
        let channel_id = non_empty(channel_id, "Channel ID")?;
        let response: SearchListResponse = self
            .call(
                "search",
                vec![
                    ("part", "snippet".to_string()),
                    ("channelId", channel_id.to_string()),
                    ("order", "date".to_string()),
                    ("type", "video".to_string()),
                    ("maxResults", max_results.clamp(1, MAX_PAGE_SIZE).to_string()),
                ],
            )
            .await?;
        Ok(response.items)
    }

    /// Statistics and content details for a batch of videos
    pub async fn get_video_stats(&self, video_ids: &[String]) -> Result<Vec<Video>, YouTubeError> {
        self.list_videos(video_ids, "statistics,contentDetails").await
    }

    /// Title, description, tags, statistics and embed status for a batch of videos
    pub async fn get_video_details(
        &self,
        video_ids: &[String],
    ) -> Result<Vec<Video>, YouTubeError> {
        self.list_videos(video_ids, "snippet,statistics,status").await
    }

    /// Top-level comments of a video by relevance
    ///
    /// Videos with comments disabled yield an empty list.
    pub async fn get_video_comments(
        &self,
        video_id: &str,
        max_results: u32,
    ) -> Result<Vec<CommentThread>, YouTubeError> {
        let video_id = non_empty(video_id, "Video ID")?;
        let result: Result<CommentThreadListResponse, _> = self
            .call(
                "commentThreads",
                vec![
                    ("part", "snippet".to_string()),
                    ("videoId", video_id.to_string()),
                    (
                        "maxResults",
                        max_results.clamp(1, MAX_COMMENT_PAGE_SIZE).to_string(),
                    ),
                    ("order", "relevance".to_string()),
                ],
            )
            .await;

        match result {
            Ok(response) => Ok(response.items),
            Err(err) if err.reason() == Some(COMMENTS_DISABLED) => {
                tracing::debug!(video_id = %video_id, "Comments disabled for video");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Profile, latest videos and their statistics for each channel
    ///
    /// Channels that do not exist are skipped; results keep input order.
    pub async fn get_creator_data_by_ids(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<CreatorData>, YouTubeError> {
        let collected: Vec<Option<CreatorData>> = futures::stream::iter(channel_ids.iter().cloned())
            .map(|channel_id| async move { self.collect_creator(&channel_id).await })
            .buffered(CREATOR_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        Ok(collected.into_iter().flatten().collect())
    }

    async fn collect_creator(&self, channel_id: &str) -> Result<Option<CreatorData>, YouTubeError> {
        let Some(channel_profile) = self.get_channel_details(channel_id).await? else {
            tracing::debug!(channel_id = %channel_id, "Channel not found, skipping");
            return Ok(None);
        };

        let latest_videos = self.get_latest_videos(channel_id, 5).await?;
        let video_ids: Vec<String> = latest_videos
            .iter()
            .filter_map(|video| video.id.video_id.clone())
            .collect();
        let video_stats = self.get_video_stats(&video_ids).await?;

        Ok(Some(CreatorData {
            channel_profile,
            latest_videos,
            video_stats,
        }))
    }

    async fn list_videos(&self, video_ids: &[String], part: &str) -> Result<Vec<Video>, YouTubeError> {
        let mut videos = Vec::with_capacity(video_ids.len());
        for chunk in video_ids.chunks(MAX_VIDEO_IDS_PER_CALL) {
            let response: VideoListResponse = self
                .call(
                    "videos",
                    vec![("part", part.to_string()), ("id", chunk.join(","))],
                )
                .await?;
            videos.extend(response.items);
        }
        Ok(videos)
    }

    /// GET `endpoint` with `params`, failing over across the key pool
    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<T, YouTubeError> {
        let rotator = self.rotator.get().await?;
        let url = format!("{}/{}", self.base_url, endpoint);

        tracing::debug!(url = %url, "Calling YouTube API");

        let result = with_failover(&rotator, |key| {
            let request = self
                .client
                .get(&url)
                .query(&params)
                .query(&[("key", key.as_str())]);
            execute::<T>(request)
        })
        .await;

        result.map_err(YouTubeError::from)
    }
}

/// Send a request and decode the JSON body
async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, YouTubeError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await?;
        return Err(YouTubeError::from_response(status.as_u16(), &body));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse YouTube response");
        YouTubeError::Parse(e.to_string())
    })
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str, YouTubeError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(YouTubeError::InvalidInput(format!("{} cannot be empty", what)));
    }
    Ok(value)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credential_pool::{RotationPolicy, StaticCredentialSource};

    fn quota_body(reason: &str) -> String {
        format!(
            r#"{{"error": {{"code": 403, "message": "quota message", "errors": [{{"reason": "{}", "domain": "youtube.quota"}}]}}}}"#,
            reason
        )
    }

    fn client() -> YouTubeClient {
        let rotator = LazyRotator::new(
            StaticCredentialSource::new(vec!["K1", "K2"]),
            RotationPolicy::RoundRobin,
        );
        YouTubeClient::new(
            YouTubeConfig::new().with_base_url("http://127.0.0.1:9/youtube/v3/"),
            Arc::new(rotator),
        )
        .expect("Should create client")
    }

    #[test]
    fn test_quota_exceeded_is_quota_error() {
        let err = YouTubeError::from_response(403, &quota_body("quotaExceeded"));
        assert!(err.is_quota_error());
        assert_eq!(err.reason(), Some("quotaExceeded"));
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_other_403_reasons_are_quota_errors() {
        for reason in ["dailyLimitExceeded", "rateLimitExceeded", "forbidden"] {
            assert!(YouTubeError::from_response(403, &quota_body(reason)).is_quota_error());
        }
        assert!(YouTubeError::from_response(429, "slow down").is_quota_error());
    }

    #[test]
    fn test_comments_disabled_is_not_quota_error() {
        let err = YouTubeError::from_response(403, &quota_body("commentsDisabled"));
        assert!(!err.is_quota_error());
        assert_eq!(err.reason(), Some("commentsDisabled"));
    }

    #[test]
    fn test_not_found_and_bad_request_are_not_quota_errors() {
        let not_found = YouTubeError::from_response(404, r#"{"error": {"code": 404, "message": "nope", "errors": [{"reason": "channelNotFound"}]}}"#);
        assert!(!not_found.is_quota_error());
        assert_eq!(not_found.reason(), Some("channelNotFound"));

        let bad_request = YouTubeError::from_response(400, "not json");
        assert!(!bad_request.is_quota_error());
        match bad_request {
            YouTubeError::Api { message, reason, .. } => {
                assert_eq!(message, "not json");
                assert_eq!(reason, "unknown");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_failover_exhaustion_maps_to_exhausted() {
        let err: YouTubeError = FailoverError::Exhausted {
            attempts: 3,
            last: YouTubeError::from_response(403, &quota_body("quotaExceeded")),
        }
        .into();
        assert!(matches!(err, YouTubeError::Exhausted { attempts: 3, .. }));
    }

    #[test]
    fn test_shared_error_keeps_its_kind() {
        let shared = Arc::new(YouTubeError::Exhausted {
            attempts: 2,
            last: "quota".to_string(),
        });
        let held_elsewhere = Arc::clone(&shared);

        let err = YouTubeError::from(shared);
        assert!(matches!(err, YouTubeError::Exhausted { attempts: 2, .. }));

        let sole = YouTubeError::from(held_elsewhere);
        assert!(matches!(sole, YouTubeError::Exhausted { attempts: 2, .. }));

        let api = Arc::new(YouTubeError::from_response(404, "gone"));
        let _other = Arc::clone(&api);
        let err = YouTubeError::from(api);
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_quota_error());
    }

    #[test]
    fn test_config_builder() {
        let config = YouTubeConfig::new()
            .with_base_url("https://custom.api.com")
            .with_timeout(5)
            .with_search_cache(60, 10);

        assert_eq!(config.base_url, Some("https://custom.api.com".to_string()));
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.search_cache_ttl_seconds, 60);
        assert_eq!(config.search_cache_capacity, 10);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = client();
        assert_eq!(client.base_url, "http://127.0.0.1:9/youtube/v3");
    }

    #[tokio::test]
    async fn test_empty_inputs_fail_before_any_call() {
        let client = client();

        assert!(matches!(
            client.search_channels("   ", 5).await,
            Err(YouTubeError::InvalidInput(_))
        ));
        assert!(matches!(
            client.get_channel_details("").await,
            Err(YouTubeError::InvalidInput(_))
        ));
        assert!(client.get_video_stats(&[]).await.unwrap().is_empty());
        assert!(client.get_video_details(&[]).await.unwrap().is_empty());
        assert!(!client.rotator().is_loaded());
    }

    #[tokio::test]
    async fn test_missing_keys_surface_configuration_error() {
        let rotator = LazyRotator::new(
            StaticCredentialSource::new(Vec::<String>::new()),
            RotationPolicy::Random,
        );
        let client = YouTubeClient::new(YouTubeConfig::new(), Arc::new(rotator)).unwrap();

        let result = client.get_channel_details("UC1").await;
        assert!(matches!(result, Err(YouTubeError::Configuration(_))));
    }
}
