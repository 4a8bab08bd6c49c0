//! Creator recommendation
//!
//! Combines keyword extraction with a YouTube channel search to suggest
//! creators for a free-form request.

use crate::schemas::youtube::SearchResult;
use crate::services::keywords::{KeywordError, KeywordExtractor, DEFAULT_MAX_KEYWORDS};
use crate::services::youtube::{YouTubeClient, YouTubeError};
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Channels kept per search keyword
const DEFAULT_MAX_CHANNELS: u32 = 5;

/// Latest uploads inspected per candidate
const LATEST_VIDEOS_PER_CHANNEL: u32 = 3;

/// Candidates enriched concurrently
const ENRICH_CONCURRENCY: usize = 4;

#[derive(Error, Debug)]
pub enum RecommendationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Keywords(#[from] KeywordError),

    #[error(transparent)]
    YouTube(#[from] YouTubeError),
}

/// A channel suggested for a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedChannel {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Keyword whose search first surfaced this channel
    pub matched_keyword: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_upload_date: Option<DateTime<Utc>>,
    /// Newest recent upload that can be played in an embedded player
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_video_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub summary: String,
    pub keywords: Vec<String>,
    pub channels: Vec<RecommendedChannel>,
}

/// A search hit waiting for enrichment
struct Candidate {
    channel_id: String,
    keyword: String,
    result: SearchResult,
}

#[derive(Clone)]
pub struct RecommendationService {
    youtube: YouTubeClient,
    keywords: Arc<dyn KeywordExtractor>,
    max_channels: u32,
}

impl RecommendationService {
    pub fn new(youtube: YouTubeClient, keywords: Arc<dyn KeywordExtractor>) -> Self {
        Self {
            youtube,
            keywords,
            max_channels: DEFAULT_MAX_CHANNELS,
        }
    }

    pub fn with_max_channels(mut self, max_channels: u32) -> Self {
        self.max_channels = max_channels;
        self
    }

    /// Extract keywords from `query`, search channels for each of them and
    /// enrich every distinct channel with its statistics and latest uploads
    pub async fn recommend(&self, query: &str) -> Result<Recommendation, RecommendationError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RecommendationError::InvalidInput(
                "Query cannot be empty".to_string(),
            ));
        }

        let keywords = self
            .keywords
            .extract_keywords(query, DEFAULT_MAX_KEYWORDS)
            .await?;

        if keywords.is_empty() {
            tracing::info!(query = %query, "No keywords extracted");
            return Ok(Recommendation {
                summary: "No search keywords could be extracted from the request".to_string(),
                keywords,
                channels: Vec::new(),
            });
        }

        let candidates = self.collect_candidates(&keywords).await?;
        let channels: Vec<RecommendedChannel> = futures::stream::iter(candidates)
            .map(|candidate| async move { self.enrich(candidate).await })
            .buffered(ENRICH_CONCURRENCY)
            .try_collect()
            .await?;

        tracing::info!(
            keywords = ?keywords,
            channels = channels.len(),
            "Recommendation completed"
        );

        Ok(Recommendation {
            summary: format!(
                "Found {} channels for \"{}\"",
                channels.len(),
                keywords.join("\", \"")
            ),
            keywords,
            channels,
        })
    }

    /// Search every keyword in order, keeping the first hit per channel
    async fn collect_candidates(
        &self,
        keywords: &[String],
    ) -> Result<Vec<Candidate>, YouTubeError> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for keyword in keywords {
            let results = self
                .youtube
                .search_channels(keyword, self.max_channels)
                .await?;

            for result in results {
                let Some(channel_id) = result.id.channel_id.clone() else {
                    continue;
                };
                if seen.insert(channel_id.clone()) {
                    candidates.push(Candidate {
                        channel_id,
                        keyword: keyword.clone(),
                        result,
                    });
                }
            }
        }

        Ok(candidates)
    }

    async fn enrich(&self, candidate: Candidate) -> Result<RecommendedChannel, YouTubeError> {
        let Candidate {
            channel_id,
            keyword,
            result,
        } = candidate;

        let statistics = self
            .youtube
            .get_channel_details(&channel_id)
            .await?
            .and_then(|channel| channel.statistics)
            .unwrap_or_default();

        let latest_videos = self
            .youtube
            .get_latest_videos(&channel_id, LATEST_VIDEOS_PER_CHANNEL)
            .await?;
        let last_upload_date = latest_videos
            .first()
            .and_then(|video| video.snippet.published_at);
        let video_ids: Vec<String> = latest_videos
            .iter()
            .filter_map(|video| video.id.video_id.clone())
            .collect();

        let latest_video_id = self
            .youtube
            .get_video_details(&video_ids)
            .await?
            .into_iter()
            .find(|video| video.is_embeddable())
            .map(|video| video.id);

        Ok(RecommendedChannel {
            thumbnail_url: result.snippet.thumbnail_url().map(str::to_string),
            title: result.snippet.title,
            description: result.snippet.description,
            channel_id,
            matched_keyword: keyword,
            subscriber_count: statistics.subscriber_count.unwrap_or(0),
            video_count: statistics.video_count.unwrap_or(0),
            view_count: statistics.view_count.unwrap_or(0),
            last_upload_date,
            latest_video_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credential_pool::{LazyRotator, RotationPolicy, StaticCredentialSource};
    use crate::services::youtube::YouTubeConfig;
    use async_trait::async_trait;

    struct FixedKeywords(Vec<String>);

    #[async_trait]
    impl KeywordExtractor for FixedKeywords {
        async fn extract_keywords(
            &self,
            _prompt: &str,
            max_keywords: usize,
        ) -> Result<Vec<String>, KeywordError> {
            Ok(self.0.iter().take(max_keywords).cloned().collect())
        }
    }

    fn service(keywords: Vec<&str>) -> RecommendationService {
        let rotator = LazyRotator::new(
            StaticCredentialSource::new(vec!["K1"]),
            RotationPolicy::RoundRobin,
        );
        let youtube = YouTubeClient::new(
            YouTubeConfig::new().with_base_url("http://127.0.0.1:9"),
            Arc::new(rotator),
        )
        .unwrap();
        let keywords = keywords.into_iter().map(str::to_string).collect();
        RecommendationService::new(youtube, Arc::new(FixedKeywords(keywords)))
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let result = service(vec!["a"]).recommend("   ").await;
        assert!(matches!(result, Err(RecommendationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_no_keywords_gives_empty_result() {
        let recommendation = service(vec![]).recommend("something vague").await.unwrap();

        assert!(recommendation.channels.is_empty());
        assert!(recommendation.keywords.is_empty());
        assert!(recommendation.summary.contains("No search keywords"));
    }
}
