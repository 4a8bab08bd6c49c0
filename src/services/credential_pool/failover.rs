//! Quota failover
//!
//! Runs one logical API operation against the key pool, moving to another key
//! whenever the operation fails with a quota-class error:
//!
//! ```text
//! ATTEMPT(key) -> SUCCESS
//! ATTEMPT(key) -> QUOTA_ERROR -> ROTATE -> ATTEMPT(next key)
//! ATTEMPT(key) -> OTHER_ERROR -> FAIL
//! every key tried, all quota errors -> EXHAUSTED
//! ```

use std::collections::HashSet;
use std::future::Future;
use thiserror::Error;

use super::rotator::{redact, CredentialRotator};

/// Errors that can tell whether they were caused by an exhausted quota
pub trait QuotaClassify {
    /// True when switching to another key could make the call succeed
    fn is_quota_error(&self) -> bool;
}

/// Terminal failure of a failover run
#[derive(Error, Debug)]
pub enum FailoverError<E> {
    /// A non-quota error; returned on the first occurrence
    #[error("{0}")]
    Failed(E),

    /// Every key in the pool failed with a quota error
    #[error("All {attempts} credentials exhausted, last error: {last}")]
    Exhausted { attempts: usize, last: E },
}

impl<E> FailoverError<E> {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Execute `operation` with keys from `rotator`, rotating on quota errors
///
/// The first key comes from `rotator.next()`. After a quota error the next
/// key is again taken from `rotator.next()`; if that key was already tried
/// in this run (random policy, or other tasks advancing a shared round-robin
/// cursor), the first untried key from the pool is used instead. The run
/// therefore makes at most one attempt per distinct key.
pub async fn with_failover<T, E, F, Fut>(
    rotator: &CredentialRotator,
    mut operation: F,
) -> Result<T, FailoverError<E>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: QuotaClassify + std::fmt::Display,
{
    let pool_size = rotator.all().into_iter().collect::<HashSet<_>>().len();
    let mut tried: HashSet<String> = HashSet::with_capacity(pool_size);
    let mut credential = rotator.next();

    loop {
        tried.insert(credential.clone());
        let attempts = tried.len();

        let err = match operation(credential.clone()).await {
            Ok(value) => {
                if attempts > 1 {
                    tracing::info!(
                        attempts = attempts,
                        credential = %redact(&credential),
                        "Request succeeded after credential rotation"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_quota_error() {
            return Err(FailoverError::Failed(err));
        }

        if attempts >= pool_size {
            tracing::error!(
                attempts = attempts,
                error = %err,
                "All credentials exhausted by quota errors"
            );
            return Err(FailoverError::Exhausted { attempts, last: err });
        }

        tracing::warn!(
            credential = %redact(&credential),
            attempt = attempts,
            pool_size = pool_size,
            error = %err,
            "Quota error, rotating to next credential"
        );

        credential = next_untried(rotator, &tried);
    }
}

/// Next key from the rotator, or the first key not yet tried in this run
fn next_untried(rotator: &CredentialRotator, tried: &HashSet<String>) -> String {
    let candidate = rotator.next();
    if !tried.contains(&candidate) {
        return candidate;
    }
    rotator
        .all()
        .into_iter()
        .find(|key| !tried.contains(key))
        .unwrap_or(candidate)
}

// ============================================================================
// Tests
// ============================================================================
