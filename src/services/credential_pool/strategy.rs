//! Rotation policies
//!
//! This module defines how the next credential is chosen and holds the
//! shared cursor used by round-robin rotation.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::ConfigurationError;

// ============================================================================
// Rotation Policy
// ============================================================================

/// Rule deciding which credential `next()` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Cycle through the pool in configured order
    RoundRobin,
    /// Uniformly random pick on every call; the cursor is per process, so
    /// this spreads load better across multi-worker deployments
    #[default]
    Random,
}

impl std::str::FromStr for RotationPolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "round_robin" | "roundrobin" | "round-robin" => Ok(Self::RoundRobin),
            "random" => Ok(Self::Random),
            other => Err(ConfigurationError::UnknownPolicy(other.to_string())),
        }
    }
}

impl std::fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoundRobin => write!(f, "round_robin"),
            Self::Random => write!(f, "random"),
        }
    }
}

// ============================================================================
// Round-Robin Cursor
// ============================================================================

/// Shared cursor for round-robin selection
///
/// The stored value is always in `[0, total)` once `next` has been called
/// with a non-zero total.
#[derive(Debug, Default)]
pub struct RoundRobinCursor {
    position: AtomicUsize,
}

impl RoundRobinCursor {
    pub fn new() -> Self {
        Self {
            position: AtomicUsize::new(0),
        }
    }

    /// Return the current position and advance it modulo `total`
    ///
    /// Concurrent callers each receive a distinct pre-increment value.
    pub fn next(&self, total: usize) -> usize {
        if total == 0 {
            return 0;
        }
        let advanced = self
            .position
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |pos| {
                Some((pos + 1) % total)
            });
        // The closure never returns None, so both arms carry the previous value.
        match advanced {
            Ok(previous) | Err(previous) => previous % total,
        }
    }

    /// Current position without advancing
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "round_robin".parse::<RotationPolicy>().unwrap(),
            RotationPolicy::RoundRobin
        );
        assert_eq!(
            "Round-Robin".parse::<RotationPolicy>().unwrap(),
            RotationPolicy::RoundRobin
        );
        assert_eq!(
            "RANDOM".parse::<RotationPolicy>().unwrap(),
            RotationPolicy::Random
        );
        assert_eq!(
            "weighted".parse::<RotationPolicy>(),
            Err(ConfigurationError::UnknownPolicy("weighted".to_string()))
        );
    }

    #[test]
    fn test_policy_display_round_trips() {
        for policy in [RotationPolicy::RoundRobin, RotationPolicy::Random] {
            assert_eq!(policy.to_string().parse::<RotationPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_round_robin_cursor() {
        let cursor = RoundRobinCursor::new();
        assert_eq!(cursor.next(3), 0);
        assert_eq!(cursor.next(3), 1);
        assert_eq!(cursor.next(3), 2);
        assert_eq!(cursor.next(3), 0);
    }

    #[test]
    fn test_cursor_stays_in_range() {
        let cursor = RoundRobinCursor::new();
        for _ in 0..10 {
            cursor.next(4);
            assert!(cursor.position() < 4);
        }
    }

    #[test]
    fn test_cursor_zero_total() {
        let cursor = RoundRobinCursor::new();
        assert_eq!(cursor.next(0), 0);
        assert_eq!(cursor.position(), 0);
    }
}
