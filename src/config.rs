//! # Engine Configuration Module
//!
//! This module defines configuration structures for the engine: matcher
//! thresholds and confidence tiers, recovery settings for directory loading
//! and decision logging, and batch fan-out limits.

use std::env;
use std::str::FromStr;
use tracing::warn;

// Constants for matcher configuration
pub const REVIEW_THRESHOLD: f64 = 0.85;
pub const EXACT_CONFIDENCE: f64 = 1.0;
pub const ALIAS_CONFIDENCE: f64 = 0.9;
pub const FUZZY_MIN_CONFIDENCE: f64 = 0.6;
pub const FUZZY_MAX_CONFIDENCE: f64 = 0.8;
pub const FUZZY_MAX_RELATIVE_DISTANCE: f64 = 0.3;

// Constants for batch processing
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;
pub const DECISION_CHANNEL_CAPACITY: usize = 256;

/// Matcher thresholds and confidence tiers
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Results below this confidence are flagged for review
    pub review_threshold: f64,
    /// Confidence of a canonical name or plural match
    pub exact_confidence: f64,
    /// Confidence of a registered alias match
    pub alias_confidence: f64,
    /// Lower edge of the fuzzy confidence band
    pub fuzzy_min_confidence: f64,
    /// Upper edge of the fuzzy confidence band
    pub fuzzy_max_confidence: f64,
    /// Largest edit distance, relative to the longer string, still accepted
    pub fuzzy_max_relative_distance: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            review_threshold: REVIEW_THRESHOLD,
            exact_confidence: EXACT_CONFIDENCE,
            alias_confidence: ALIAS_CONFIDENCE,
            fuzzy_min_confidence: FUZZY_MIN_CONFIDENCE,
            fuzzy_max_confidence: FUZZY_MAX_CONFIDENCE,
            fuzzy_max_relative_distance: FUZZY_MAX_RELATIVE_DISTANCE,
        }
    }
}

impl MatcherConfig {
    /// Map a similarity in [0, 1] onto the fuzzy confidence band
    pub fn fuzzy_confidence(&self, similarity: f64) -> f64 {
        let similarity = similarity.clamp(0.0, 1.0);
        let span = self.fuzzy_max_confidence - self.fuzzy_min_confidence;
        (self.fuzzy_min_confidence + span * similarity)
            .clamp(self.fuzzy_min_confidence, self.fuzzy_max_confidence)
    }

    pub fn needs_review(&self, confidence: f64) -> bool {
        confidence < self.review_threshold
    }
}

/// Recovery configuration for directory loading and decision logging
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts after the first load attempt
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for one directory load attempt in seconds
    pub operation_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 200,
            max_retry_delay_ms: 5000,
            operation_timeout_secs: 10,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60,
        }
    }
}

/// Batch ingestion limits
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of lines parsed and matched concurrently
    pub max_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

/// Top-level configuration for the engine
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub matcher: MatcherConfig,
    pub recovery: RecoveryConfig,
    pub batch: BatchConfig,
}

impl EngineConfig {
    /// Build a configuration from defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(threshold) = env_value::<f64>("INGREDIENT_REVIEW_THRESHOLD") {
            config.matcher.review_threshold = threshold.clamp(0.0, 1.0);
        }
        if let Some(concurrency) = env_value::<usize>("INGREDIENT_BATCH_CONCURRENCY") {
            config.batch.max_concurrency = concurrency.max(1);
        }
        if let Some(timeout) = env_value::<u64>("UNIT_LOAD_TIMEOUT_SECS") {
            config.recovery.operation_timeout_secs = timeout;
        }
        if let Some(retries) = env_value::<u32>("UNIT_LOAD_MAX_RETRIES") {
            config.recovery.max_retries = retries;
        }

        config
    }
}

fn env_value<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable configuration value");
            None
        }
    }
}
