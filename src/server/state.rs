//! Application state container
//!
//! This module defines the shared application state that is passed
//! to all request handlers via Axum's state extraction.

use crate::config::Settings;
use crate::services::{
    EnvCredentialSource, KeywordExtractor, LazyRotator, OpenAiConfig, OpenAiKeywordExtractor,
    RecommendationService, YouTubeClient, YouTubeConfig,
};
use crate::services::credential_pool::DEFAULT_SINGLE_KEY_VAR;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// Cheap to clone; every service inside is reference counted. The YouTube
/// key pool is owned here and handed to the client, not held in a global.
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// YouTube Data API client with its key pool
    pub youtube: YouTubeClient,

    /// Keyword extractor
    pub keywords: Arc<dyn KeywordExtractor>,

    /// Query to channel recommendations
    pub recommendations: RecommendationService,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    ///
    /// The YouTube key pool is not read here; it is loaded on first use so
    /// the server can start, and report not-ready, without keys.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let youtube_settings = &settings.youtube;

        let source = EnvCredentialSource::new(youtube_settings.api_keys_var.clone())
            .with_fallback(DEFAULT_SINGLE_KEY_VAR);
        let rotator = Arc::new(LazyRotator::new(source, youtube_settings.rotation_policy));

        let mut youtube_config = YouTubeConfig::new()
            .with_timeout(youtube_settings.timeout_seconds)
            .with_search_cache(
                youtube_settings.search_cache_ttl_seconds,
                youtube_settings.search_cache_capacity,
            );
        if let Some(base_url) = &youtube_settings.base_url {
            youtube_config = youtube_config.with_base_url(base_url.clone());
        }

        tracing::debug!("Creating YouTube client");
        let youtube = YouTubeClient::new(youtube_config, rotator)?;

        let openai = &settings.openai;
        let mut openai_config = OpenAiConfig::new(openai.api_key.clone())
            .with_model(openai.model.clone())
            .with_timeout(openai.timeout_seconds);
        if let Some(base_url) = &openai.base_url {
            openai_config = openai_config.with_base_url(base_url.clone());
        }

        tracing::debug!("Creating keyword extractor");
        let keywords: Arc<dyn KeywordExtractor> =
            Arc::new(OpenAiKeywordExtractor::new(openai_config)?);

        let state = Self::with_services(settings, youtube, keywords);
        tracing::info!("Application state initialized successfully");
        Ok(state)
    }

    /// Assemble state from already-built services
    pub fn with_services(
        settings: Settings,
        youtube: YouTubeClient,
        keywords: Arc<dyn KeywordExtractor>,
    ) -> Self {
        let recommendations = RecommendationService::new(youtube.clone(), Arc::clone(&keywords));

        Self {
            settings: Arc::new(settings),
            youtube,
            keywords,
            recommendations,
            start_time: Instant::now(),
        }
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
