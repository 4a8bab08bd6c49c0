//! Credential rotator
//!
//! The `CredentialRotator` owns the immutable key pool and hands out one key
//! per outbound call according to its [`RotationPolicy`].

use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

use super::error::ConfigurationError;
use super::strategy::{RotationPolicy, RoundRobinCursor};

/// Number of leading characters kept when a key is shown in logs
const REDACT_PREFIX_LEN: usize = 6;

// ============================================================================
// Credential Rotator
// ============================================================================

/// A non-empty pool of API keys with a selection policy
///
/// Construct once at startup and share behind an `Arc`; every method takes
/// `&self` and is safe to call from any number of tasks.
pub struct CredentialRotator {
    /// Keys in configured order, never empty
    credentials: Vec<String>,
    /// Selection policy
    policy: RotationPolicy,
    /// Cursor for round-robin selection
    cursor: RoundRobinCursor,
    /// Total number of keys handed out
    draws: AtomicU64,
}

impl CredentialRotator {
    /// Create a rotator from a list of keys
    ///
    /// Surrounding whitespace is trimmed and blank entries are dropped. Fails
    /// with [`ConfigurationError::NoCredentials`] when nothing is left.
    pub fn new<I, S>(credentials: I, policy: RotationPolicy) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials: Vec<String> = credentials
            .into_iter()
            .map(Into::into)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();

        if credentials.is_empty() {
            return Err(ConfigurationError::no_credentials("credential list"));
        }

        Ok(Self {
            credentials,
            policy,
            cursor: RoundRobinCursor::new(),
            draws: AtomicU64::new(0),
        })
    }

    /// Create a rotator with round-robin policy
    pub fn round_robin<I, S>(credentials: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(credentials, RotationPolicy::RoundRobin)
    }

    /// Create a rotator with random policy
    pub fn random<I, S>(credentials: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(credentials, RotationPolicy::Random)
    }

    /// Get the next key according to the policy
    pub fn next(&self) -> String {
        self.draws.fetch_add(1, Ordering::Relaxed);
        let idx = match self.policy {
            RotationPolicy::RoundRobin => self.cursor.next(self.credentials.len()),
            RotationPolicy::Random => rand::thread_rng().gen_range(0..self.credentials.len()),
        };
        self.credentials[idx].clone()
    }

    /// Copy of every key in configured order
    pub fn all(&self) -> Vec<String> {
        self.credentials.clone()
    }

    /// Number of keys in the pool
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Always false; an empty pool cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// Snapshot of pool statistics
    pub fn stats(&self) -> RotatorStats {
        RotatorStats {
            total: self.credentials.len(),
            policy: self.policy,
            draws: self.draws.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CredentialRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted: Vec<String> = self.credentials.iter().map(|k| redact(k)).collect();
        f.debug_struct("CredentialRotator")
            .field("credentials", &redacted)
            .field("policy", &self.policy)
            .field("cursor", &self.cursor.position())
            .field("draws", &self.draws.load(Ordering::Relaxed))
            .finish()
    }
}

/// Shorten a key for logging, keeping only a recognisable prefix
pub fn redact(key: &str) -> String {
    let prefix: String = key.chars().take(REDACT_PREFIX_LEN).collect();
    if prefix.len() == key.len() {
        "*".repeat(key.chars().count().max(1))
    } else {
        format!("{}***", prefix)
    }
}

// ============================================================================
// Rotator Statistics
// ============================================================================

/// Statistics about a credential rotator
#[derive(Debug, Clone, serde::Serialize)]
pub struct RotatorStats {
    /// Number of keys in the pool
    pub total: usize,
    /// Active rotation policy
    pub policy: RotationPolicy,
    /// Keys handed out since startup
    pub draws: u64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn keys() -> Vec<&'static str> {
        vec!["K1", "K2", "K3"]
    }

    #[test]
    fn test_empty_pool_is_configuration_error() {
        let result = CredentialRotator::round_robin(Vec::<String>::new());
        assert!(matches!(
            result,
            Err(ConfigurationError::NoCredentials { .. })
        ));
    }

    #[test]
    fn test_blank_keys_are_dropped() {
        let result = CredentialRotator::random(vec!["  ", ""]);
        assert!(result.is_err());

        let rotator = CredentialRotator::round_robin(vec![" K1 ", "", "K2"]).unwrap();
        assert_eq!(rotator.all(), vec!["K1".to_string(), "K2".to_string()]);
    }

    #[test]
    fn test_round_robin_one_cycle_in_order() {
        let rotator = CredentialRotator::round_robin(keys()).unwrap();
        let drawn: Vec<String> = (0..rotator.len()).map(|_| rotator.next()).collect();
        assert_eq!(drawn, vec!["K1", "K2", "K3"]);
    }

    #[test]
    fn test_round_robin_two_cycles() {
        let rotator = CredentialRotator::round_robin(keys()).unwrap();
        let drawn: Vec<String> = (0..2 * rotator.len()).map(|_| rotator.next()).collect();
        assert_eq!(drawn, vec!["K1", "K2", "K3", "K1", "K2", "K3"]);
    }

    #[test]
    fn test_round_robin_wraps_to_first() {
        let rotator = CredentialRotator::round_robin(keys()).unwrap();
        assert_eq!(rotator.next(), "K1");
        assert_eq!(rotator.next(), "K2");
        assert_eq!(rotator.next(), "K3");
        assert_eq!(rotator.next(), "K1");
    }

    #[test]
    fn test_round_robin_concurrent_draws_match_serial_run() {
        const THREADS: usize = 8;
        const CALLS: usize = 999;

        let pool: Vec<String> = (0..5).map(|i| format!("key-{}", i)).collect();
        let rotator = Arc::new(CredentialRotator::round_robin(pool.clone()).unwrap());

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let rotator = Arc::clone(&rotator);
                std::thread::spawn(move || (0..CALLS).map(|_| rotator.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut concurrent: HashMap<String, usize> = HashMap::new();
        let mut total = 0;
        for handle in handles {
            for key in handle.join().unwrap() {
                *concurrent.entry(key).or_default() += 1;
                total += 1;
            }
        }

        let control = CredentialRotator::round_robin(pool).unwrap();
        let mut serial: HashMap<String, usize> = HashMap::new();
        for _ in 0..THREADS * CALLS {
            *serial.entry(control.next()).or_default() += 1;
        }

        assert_eq!(total, THREADS * CALLS);
        assert_eq!(concurrent, serial);
        assert_eq!(rotator.stats().draws, (THREADS * CALLS) as u64);
    }

    #[test]
    fn test_random_distribution_is_uniform() {
        const DRAWS: usize = 10_000;

        let rotator = CredentialRotator::random(vec!["A", "B", "C", "D"]).unwrap();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..DRAWS {
            *counts.entry(rotator.next()).or_default() += 1;
        }

        assert_eq!(counts.len(), 4);
        let expected = DRAWS as f64 / 4.0;
        for (key, count) in counts {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(deviation < 0.1, "{} drawn {} times", key, count);
        }
    }

    #[test]
    fn test_random_is_safe_across_threads() {
        let rotator = Arc::new(CredentialRotator::random(keys()).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let rotator = Arc::clone(&rotator);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let key = rotator.next();
                        assert!(["K1", "K2", "K3"].contains(&key.as_str()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(rotator.stats().draws, 2000);
    }

    #[test]
    fn test_all_returns_a_copy() {
        let rotator = CredentialRotator::round_robin(keys()).unwrap();

        let mut copy = rotator.all();
        copy.clear();
        copy.push("INJECTED".to_string());

        let drawn: Vec<String> = (0..3).map(|_| rotator.next()).collect();
        assert_eq!(drawn, vec!["K1", "K2", "K3"]);
        assert_eq!(rotator.all().len(), 3);
    }

    #[test]
    fn test_stats() {
        let rotator = CredentialRotator::random(keys()).unwrap();
        rotator.next();
        rotator.next();

        let stats = rotator.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.policy, RotationPolicy::Random);
        assert_eq!(stats.draws, 2);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let rotator =
            CredentialRotator::round_robin(vec!["AIzaSyDsecretsecretsecret"]).unwrap();
        let debug = format!("{:?}", rotator);
        assert!(!debug.contains("secretsecret"));
        assert!(debug.contains("AIzaSy***"));
    }

    #[test]
    fn test_redact_short_key() {
        assert_eq!(redact("abc"), "***");
        assert_eq!(redact("abcdefgh"), "abcdef***");
    }
}
