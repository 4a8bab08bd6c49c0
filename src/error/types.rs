//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{ConfigurationError, KeywordError, RecommendationError, YouTubeError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::QuotaExhausted(_) | ApiError::Configuration(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request_error",
            ApiError::NotFound(_) => "not_found_error",
            ApiError::QuotaExhausted(_) => "quota_exhausted_error",
            ApiError::Configuration(_) => "configuration_error",
            ApiError::Upstream(_) | ApiError::Internal(_) => "api_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();
        let message = match self {
            ApiError::InvalidRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::QuotaExhausted(msg)
            | ApiError::Configuration(msg)
            | ApiError::Upstream(msg) => msg,
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                err.to_string()
            }
        };

        let body = Json(ErrorResponse {
            type_: "error".to_string(),
            error: ErrorDetail {
                type_: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

impl From<ConfigurationError> for ApiError {
    fn from(err: ConfigurationError) -> Self {
        ApiError::Configuration(err.to_string())
    }
}

impl From<YouTubeError> for ApiError {
    fn from(err: YouTubeError) -> Self {
        match err {
            YouTubeError::InvalidInput(msg) => ApiError::InvalidRequest(msg),
            YouTubeError::Configuration(err) => err.into(),
            YouTubeError::Exhausted { .. } => ApiError::QuotaExhausted(err.to_string()),
            YouTubeError::Api { status: 404, .. } => ApiError::NotFound(err.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<KeywordError> for ApiError {
    fn from(err: KeywordError) -> Self {
        match err {
            KeywordError::MissingApiKey => ApiError::Configuration(err.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<RecommendationError> for ApiError {
    fn from(err: RecommendationError) -> Self {
        match err {
            RecommendationError::InvalidInput(msg) => ApiError::InvalidRequest(msg),
            RecommendationError::Keywords(err) => err.into(),
            RecommendationError::YouTube(err) => err.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    #[serde(rename = "type")]
    type_: String,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    type_: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_error_mapping() {
        let exhausted: ApiError = YouTubeError::Exhausted {
            attempts: 3,
            last: "quota".to_string(),
        }
        .into();
        assert_eq!(exhausted.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let invalid: ApiError = YouTubeError::InvalidInput("empty".to_string()).into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let not_found: ApiError = YouTubeError::from_response(404, "gone").into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let upstream: ApiError = YouTubeError::from_response(500, "boom").into();
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);

        let config: ApiError =
            YouTubeError::Configuration(ConfigurationError::no_credentials("env")).into();
        assert_eq!(config.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_keyword_error_mapping() {
        let missing: ApiError = KeywordError::MissingApiKey.into();
        assert!(matches!(missing, ApiError::Configuration(_)));

        let api: ApiError = KeywordError::Api {
            status: 401,
            message: "bad key".to_string(),
        }
        .into();
        assert_eq!(api.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::NotFound("Channel UC1 not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["error"]["type"], "not_found_error");
        assert_eq!(json["error"]["message"], "Channel UC1 not found");
    }
}
