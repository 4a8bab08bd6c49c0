//! Services module
//!
//! Contains business logic and external service integrations.

pub mod credential_pool;
pub mod keywords;
pub mod recommendation;
pub mod youtube;

pub use credential_pool::{
    ConfigurationError, CredentialRotator, CredentialSource, EnvCredentialSource, LazyRotator,
    RotationPolicy, RotatorStats, StaticCredentialSource,
};
pub use keywords::{KeywordError, KeywordExtractor, OpenAiConfig, OpenAiKeywordExtractor};
pub use recommendation::{
    Recommendation, RecommendationError, RecommendationService, RecommendedChannel,
};
pub use youtube::{YouTubeClient, YouTubeConfig, YouTubeError};
