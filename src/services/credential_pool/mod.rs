//! Credential Pool Module
//!
//! This module hands out API keys for outbound calls so that quota usage is
//! spread across every configured key, and lets callers move past a key that
//! ran out of quota without restarting the whole operation.
//!
//! # Features
//! - Immutable, non-empty pool of keys loaded exactly once
//! - Two rotation policies (RoundRobin, Random)
//! - Lazy, race-free loading from a [`CredentialSource`]
//! - A failover loop that rotates on quota errors and stops after every key
//!   has been tried
//!
//! # Example
//! ```ignore
//! use creator_scout::services::credential_pool::{CredentialRotator, RotationPolicy};
//!
//! let rotator = CredentialRotator::new(vec!["K1", "K2", "K3"], RotationPolicy::RoundRobin)?;
//! assert_eq!(rotator.next(), "K1");
//! assert_eq!(rotator.next(), "K2");
//! ```

mod error;
mod failover;
mod rotator;
mod source;
mod strategy;

pub use error::ConfigurationError;
pub use failover::{with_failover, FailoverError, QuotaClassify};
pub use rotator::{redact, CredentialRotator, RotatorStats};
pub use source::{
    parse_key_list, CredentialSource, EnvCredentialSource, LazyRotator, StaticCredentialSource,
    DEFAULT_KEYS_VAR, DEFAULT_SINGLE_KEY_VAR,
};
pub use strategy::RotationPolicy;
