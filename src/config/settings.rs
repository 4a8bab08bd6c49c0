//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.
//! YouTube API keys are not held here; the credential pool reads them
//! lazily from the variable named by `youtube.api_keys_var`.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use crate::logging::LogFormat;
use crate::services::credential_pool::{RotationPolicy, DEFAULT_KEYS_VAR};

/// Application environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!("Invalid environment: {}. Expected: development, staging, or production", s),
        }
    }
}

/// YouTube Data API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YouTubeSettings {
    /// Base URL override, mainly for tests against a local mock
    pub base_url: Option<String>,
    /// Environment variable holding the comma-separated key list
    pub api_keys_var: String,
    pub rotation_policy: RotationPolicy,
    pub timeout_seconds: u64,
    pub search_cache_ttl_seconds: u64,
    pub search_cache_capacity: u64,
}

impl Default for YouTubeSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_keys_var: DEFAULT_KEYS_VAR.to_string(),
            rotation_policy: RotationPolicy::Random,
            timeout_seconds: 30,
            search_cache_ttl_seconds: 600,
            search_cache_capacity: 1_000,
        }
    }
}

/// OpenAI configuration for keyword extraction
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_keywords: usize,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "gpt-3.5-turbo".to_string(),
            timeout_seconds: 30,
            max_keywords: 5,
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,
    pub log_format: LogFormat,

    // Server settings
    pub host: String,
    pub port: u16,

    pub youtube: YouTubeSettings,
    pub openai: OpenAiSettings,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let settings = Self {
            // App settings
            app_name: env_or_default("APP_NAME", "creator-scout"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),
            log_format: env_or_default("LOG_FORMAT", "json")
                .parse()
                .unwrap_or_default(),

            // Server settings
            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            youtube: YouTubeSettings {
                base_url: env::var("YOUTUBE_API_BASE_URL").ok(),
                api_keys_var: env_or_default("YOUTUBE_API_KEYS_VAR", DEFAULT_KEYS_VAR),
                rotation_policy: env_or_default("KEY_ROTATION_POLICY", "random")
                    .parse()
                    .context("Invalid KEY_ROTATION_POLICY value")?,
                timeout_seconds: env_or_default("YOUTUBE_TIMEOUT_SECONDS", "30")
                    .parse()
                    .unwrap_or(30),
                search_cache_ttl_seconds: env_or_default("SEARCH_CACHE_TTL_SECONDS", "600")
                    .parse()
                    .unwrap_or(600),
                search_cache_capacity: env_or_default("SEARCH_CACHE_CAPACITY", "1000")
                    .parse()
                    .unwrap_or(1_000),
            },

            openai: OpenAiSettings {
                api_key: env::var("OPENAI_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                base_url: env::var("OPENAI_API_BASE_URL").ok(),
                model: env_or_default("OPENAI_MODEL", "gpt-3.5-turbo"),
                timeout_seconds: env_or_default("OPENAI_TIMEOUT_SECONDS", "30")
                    .parse()
                    .unwrap_or(30),
                max_keywords: env_or_default("MAX_KEYWORDS", "5").parse().unwrap_or(5),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.youtube.timeout_seconds == 0 {
            anyhow::bail!("YouTube timeout_seconds must be > 0");
        }

        if self.youtube.api_keys_var.trim().is_empty() {
            anyhow::bail!("YouTube api_keys_var cannot be empty");
        }

        if self.openai.max_keywords == 0 {
            anyhow::bail!("OpenAI max_keywords must be > 0");
        }

        Ok(())
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "creator-scout".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            host: "0.0.0.0".to_string(),
            port: 8000,
            youtube: YouTubeSettings::default(),
            openai: OpenAiSettings::default(),
        }
    }
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
