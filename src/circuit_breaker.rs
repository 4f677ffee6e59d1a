//! # Circuit Breaker Module
//!
//! Guards the decision sink so a failing audit store stops receiving writes
//! for a while instead of costing a round trip per record.
//!
//! # State Machine
//!
//! - **Closed**: writes pass through
//! - **Open**: `circuit_breaker_threshold` consecutive failures seen, writes
//!   are skipped until `circuit_breaker_reset_secs` have elapsed
//! - After the reset window the breaker closes again and the next write
//!   decides whether it reopens

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::RecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Consecutive-failure circuit breaker
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    reset_after: Duration,
}

impl CircuitBreaker {
    /// Create a breaker from the recovery settings
    ///
    /// ```rust
    /// use ingredients::circuit_breaker::CircuitBreaker;
    /// use ingredients::config::RecoveryConfig;
    ///
    /// let breaker = CircuitBreaker::new(&RecoveryConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            threshold: config.circuit_breaker_threshold.max(1),
            reset_after: Duration::from_secs(config.circuit_breaker_reset_secs),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // A panic while holding the lock cannot leave the counters inconsistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether writes should currently be skipped
    pub fn is_open(&self) -> bool {
        let mut state = self.lock();
        if state.consecutive_failures < self.threshold {
            return false;
        }
        match state.last_failure {
            Some(at) if at.elapsed() < self.reset_after => true,
            _ => {
                *state = BreakerState::default();
                false
            }
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.last_failure = Some(Instant::now());
    }

    pub fn record_success(&self) {
        *self.lock() = BreakerState::default();
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: u32, reset_secs: u64) -> RecoveryConfig {
        RecoveryConfig {
            circuit_breaker_threshold: threshold,
            circuit_breaker_reset_secs: reset_secs,
            ..Default::default()
        }
    }

    #[test]
    fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new(&config(3, 60));
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.is_open());
        breaker.record_failure();
        assert!(breaker.is_open());
        assert_eq!(breaker.failure_count(), 3);
    }

    #[test]
    fn test_success_closes() {
        let breaker = CircuitBreaker::new(&config(1, 60));
        breaker.record_failure();
        assert!(breaker.is_open());
        breaker.record_success();
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn test_resets_after_window() {
        let breaker = CircuitBreaker::new(&config(1, 0));
        breaker.record_failure();
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }
}
