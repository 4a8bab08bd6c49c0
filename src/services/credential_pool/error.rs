//! Credential configuration errors

use thiserror::Error;

/// Fatal configuration problems detected while loading the key pool
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("No API credentials configured ({origin} is missing or empty)")]
    NoCredentials { origin: String },

    #[error("Unknown rotation policy '{0}', expected 'round_robin' or 'random'")]
    UnknownPolicy(String),
}

impl ConfigurationError {
    pub fn no_credentials(origin: impl Into<String>) -> Self {
        Self::NoCredentials {
            origin: origin.into(),
        }
    }
}
