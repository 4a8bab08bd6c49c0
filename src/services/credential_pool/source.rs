//! Credential sources and lazy loading
//!
//! A [`CredentialSource`] produces the raw key list. [`LazyRotator`] reads it
//! on first use, exactly once, no matter how many tasks race to get there.

use std::env;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::error::ConfigurationError;
use super::rotator::CredentialRotator;
use super::strategy::RotationPolicy;

/// Default environment variable holding comma-separated YouTube keys
pub const DEFAULT_KEYS_VAR: &str = "YOUTUBE_API_KEYS";

/// Single-key variable accepted when the list variable is unset
pub const DEFAULT_SINGLE_KEY_VAR: &str = "YOUTUBE_API_KEY";

// ============================================================================
// Credential Source
// ============================================================================

/// Where the key pool comes from
pub trait CredentialSource: Send + Sync {
    /// Load the keys, failing when none are configured
    fn load(&self) -> Result<Vec<String>, ConfigurationError>;

    /// Human-readable origin used in errors and logs
    fn describe(&self) -> String;
}

/// Split a comma-separated key list, dropping blanks
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keys read from environment variables
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    var: String,
    fallback_var: Option<String>,
}

impl EnvCredentialSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            fallback_var: None,
        }
    }

    /// `YOUTUBE_API_KEYS`, falling back to `YOUTUBE_API_KEY`
    pub fn youtube() -> Self {
        Self::new(DEFAULT_KEYS_VAR).with_fallback(DEFAULT_SINGLE_KEY_VAR)
    }

    /// Variable consulted when the primary one is unset or blank
    pub fn with_fallback(mut self, var: impl Into<String>) -> Self {
        self.fallback_var = Some(var.into());
        self
    }

    fn read(var: &str) -> Vec<String> {
        env::var(var).map(|raw| parse_key_list(&raw)).unwrap_or_default()
    }
}

impl CredentialSource for EnvCredentialSource {
    fn load(&self) -> Result<Vec<String>, ConfigurationError> {
        let mut keys = Self::read(&self.var);
        if keys.is_empty() {
            if let Some(fallback) = &self.fallback_var {
                keys = Self::read(fallback);
            }
        }
        if keys.is_empty() {
            return Err(ConfigurationError::no_credentials(self.describe()));
        }
        Ok(keys)
    }

    fn describe(&self) -> String {
        match &self.fallback_var {
            Some(fallback) => format!("{} / {}", self.var, fallback),
            None => self.var.clone(),
        }
    }
}

/// A fixed key list, typically taken from already-loaded settings
#[derive(Debug, Clone)]
pub struct StaticCredentialSource {
    keys: Vec<String>,
}

impl StaticCredentialSource {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl CredentialSource for StaticCredentialSource {
    fn load(&self) -> Result<Vec<String>, ConfigurationError> {
        if self.keys.iter().all(|key| key.trim().is_empty()) {
            return Err(ConfigurationError::no_credentials(self.describe()));
        }
        Ok(self.keys.clone())
    }

    fn describe(&self) -> String {
        "static credential list".to_string()
    }
}

// ============================================================================
// Lazy Rotator
// ============================================================================

/// A rotator built from its source on first use
///
/// The first successful load wins and is kept for the life of the value. A
/// failed load is returned to that caller and not cached.
pub struct LazyRotator {
    source: Box<dyn CredentialSource>,
    policy: RotationPolicy,
    cell: OnceCell<Arc<CredentialRotator>>,
}

impl LazyRotator {
    pub fn new(source: impl CredentialSource + 'static, policy: RotationPolicy) -> Self {
        Self {
            source: Box::new(source),
            policy,
            cell: OnceCell::new(),
        }
    }

    /// Wrap a rotator that was already built at startup
    pub fn ready(rotator: CredentialRotator) -> Self {
        let policy = rotator.policy();
        let keys = rotator.all();
        Self {
            source: Box::new(StaticCredentialSource::new(keys)),
            policy,
            cell: OnceCell::new_with(Some(Arc::new(rotator))),
        }
    }

    /// Get the rotator, loading the source if this is the first call
    pub async fn get(&self) -> Result<Arc<CredentialRotator>, ConfigurationError> {
        let rotator = self
            .cell
            .get_or_try_init(|| async {
                let keys = self.source.load()?;
                let rotator = CredentialRotator::new(keys, self.policy).map_err(|_| {
                    ConfigurationError::no_credentials(self.source.describe())
                })?;
                tracing::info!(
                    origin = %self.source.describe(),
                    key_count = rotator.len(),
                    policy = %rotator.policy(),
                    "Loaded API credential pool"
                );
                Ok::<_, ConfigurationError>(Arc::new(rotator))
            })
            .await?;
        Ok(Arc::clone(rotator))
    }

    /// The rotator if it has already been loaded
    pub fn loaded(&self) -> Option<Arc<CredentialRotator>> {
        self.cell.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }
}

impl std::fmt::Debug for LazyRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyRotator")
            .field("source", &self.source.describe())
            .field("policy", &self.policy)
            .field("rotator", &self.cell.get())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that counts how often it is read
    struct CountingSource {
        keys: Vec<String>,
        loads: Arc<AtomicUsize>,
    }

    impl CredentialSource for CountingSource {
        fn load(&self) -> Result<Vec<String>, ConfigurationError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.keys.is_empty() {
                return Err(ConfigurationError::no_credentials("counting"));
            }
            Ok(self.keys.clone())
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    #[test]
    fn test_parse_key_list() {
        assert_eq!(parse_key_list("a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_key_list(" , ").is_empty());
        assert!(parse_key_list("").is_empty());
    }

    #[test]
    fn test_env_source_reads_list() {
        env::set_var("CREATOR_SCOUT_TEST_KEYS_LIST", "k1,k2, k3");
        let source = EnvCredentialSource::new("CREATOR_SCOUT_TEST_KEYS_LIST");
        assert_eq!(source.load().unwrap(), vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn test_env_source_uses_fallback() {
        env::remove_var("CREATOR_SCOUT_TEST_KEYS_UNSET");
        env::set_var("CREATOR_SCOUT_TEST_SINGLE_KEY", "solo");
        let source = EnvCredentialSource::new("CREATOR_SCOUT_TEST_KEYS_UNSET")
            .with_fallback("CREATOR_SCOUT_TEST_SINGLE_KEY");
        assert_eq!(source.load().unwrap(), vec!["solo"]);
    }

    #[test]
    fn test_env_source_missing_is_error() {
        env::remove_var("CREATOR_SCOUT_TEST_KEYS_MISSING");
        let source = EnvCredentialSource::new("CREATOR_SCOUT_TEST_KEYS_MISSING");
        assert_eq!(
            source.load(),
            Err(ConfigurationError::NoCredentials {
                origin: "CREATOR_SCOUT_TEST_KEYS_MISSING".to_string()
            })
        );
    }

    #[test]
    fn test_youtube_source_describes_both_vars() {
        assert_eq!(
            EnvCredentialSource::youtube().describe(),
            "YOUTUBE_API_KEYS / YOUTUBE_API_KEY"
        );
    }

    #[test]
    fn test_static_source_blank_is_error() {
        let source = StaticCredentialSource::new(vec!["", " "]);
        assert!(source.load().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lazy_rotator_loads_exactly_once_under_race() {
        let loads = Arc::new(AtomicUsize::new(0));
        let lazy = Arc::new(LazyRotator::new(
            CountingSource {
                keys: vec!["K1".to_string(), "K2".to_string()],
                loads: Arc::clone(&loads),
            },
            RotationPolicy::RoundRobin,
        ));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                tokio::spawn(async move { lazy.get().await.map(|r| r.len()) })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 2);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(lazy.is_loaded());
    }

    #[tokio::test]
    async fn test_lazy_rotator_shares_one_instance() {
        let lazy = LazyRotator::new(
            StaticCredentialSource::new(vec!["K1", "K2"]),
            RotationPolicy::RoundRobin,
        );
        let first = lazy.get().await.unwrap();
        let second = lazy.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Shared cursor across handles
        assert_eq!(first.next(), "K1");
        assert_eq!(second.next(), "K2");
    }

    #[tokio::test]
    async fn test_lazy_rotator_failed_load_not_cached() {
        let loads = Arc::new(AtomicUsize::new(0));
        let lazy = LazyRotator::new(
            CountingSource {
                keys: vec![],
                loads: Arc::clone(&loads),
            },
            RotationPolicy::Random,
        );

        assert!(lazy.get().await.is_err());
        assert!(lazy.get().await.is_err());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert!(!lazy.is_loaded());
        assert!(lazy.loaded().is_none());
    }

    #[tokio::test]
    async fn test_ready_rotator_is_loaded() {
        let rotator = CredentialRotator::round_robin(vec!["K1"]).unwrap();
        let lazy = LazyRotator::ready(rotator);
        assert!(lazy.is_loaded());
        assert_eq!(lazy.get().await.unwrap().next(), "K1");
    }
}
