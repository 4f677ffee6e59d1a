//! # Decision Log Module
//!
//! Or-pattern equivalence decisions are written to an audit store for later
//! corpus-wide review. Recording is fire-and-forget: [`DecisionLog::record`]
//! never blocks and never fails, and a broken store only produces log lines.

use crate::circuit_breaker::CircuitBreaker;
use crate::config::RecoveryConfig;
use crate::errors::EngineResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One or-pattern equivalence determination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub raw_text: String,
    pub recipe_id: Option<String>,
    pub primary_name: String,
    pub alternative_names: Vec<String>,
    pub equivalent: bool,
    pub reasoning: String,
    pub recorded_at: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn new(raw_text: &str, primary_name: &str, alternative_names: Vec<String>) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            recipe_id: None,
            primary_name: primary_name.to_string(),
            alternative_names,
            equivalent: false,
            reasoning: String::new(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_recipe(mut self, recipe_id: Option<&str>) -> Self {
        self.recipe_id = recipe_id.map(str::to_string);
        self
    }

    pub fn with_determination(mut self, equivalent: bool, reasoning: &str) -> Self {
        self.equivalent = equivalent;
        self.reasoning = reasoning.to_string();
        self
    }
}

/// Write-only, non-blocking decision recorder used by the matcher
pub trait DecisionLog: Send + Sync {
    fn record(&self, record: DecisionRecord);
}

/// Durable destination behind a [`ChannelDecisionLog`]
#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn write(&self, record: &DecisionRecord) -> EngineResult<()>;
}

/// Keeps records in memory; used by tests and the CLI
#[derive(Debug, Default)]
pub struct MemoryDecisionLog {
    records: Mutex<Vec<DecisionRecord>>,
}

impl MemoryDecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl DecisionLog for MemoryDecisionLog {
    fn record(&self, record: DecisionRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

/// Sink that emits each record as a structured log event
#[derive(Debug, Default, Clone)]
pub struct TracingDecisionSink;

#[async_trait]
impl DecisionSink for TracingDecisionSink {
    async fn write(&self, record: &DecisionRecord) -> EngineResult<()> {
        let payload = serde_json::to_string(record)?;
        info!(target: "ingredients::decisions", equivalent = record.equivalent, "{}", payload);
        Ok(())
    }
}

/// Forwards records over a bounded channel to a background writer task
///
/// A full channel or an open circuit breaker drops the record.
#[derive(Debug, Clone)]
pub struct ChannelDecisionLog {
    sender: mpsc::Sender<DecisionRecord>,
}

impl ChannelDecisionLog {
    /// Start the writer task on the current Tokio runtime
    ///
    /// The task ends once every clone of the returned log has been dropped
    /// and the queued records are drained.
    pub fn spawn(
        sink: Arc<dyn DecisionSink>,
        recovery: &RecoveryConfig,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<DecisionRecord>(capacity.max(1));
        let breaker = CircuitBreaker::new(recovery);

        let handle = tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                if breaker.is_open() {
                    warn!(
                        "Decision sink circuit open, dropping record for '{}'",
                        record.raw_text
                    );
                    continue;
                }
                match sink.write(&record).await {
                    Ok(()) => breaker.record_success(),
                    Err(e) => {
                        breaker.record_failure();
                        warn!("Failed to write decision record for '{}': {}", record.raw_text, e);
                    }
                }
            }
            debug!("Decision log writer stopped");
        });

        (Self { sender }, handle)
    }
}

impl DecisionLog for ChannelDecisionLog {
    fn record(&self, record: DecisionRecord) {
        match self.sender.try_send(record) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(record)) => {
                warn!("Decision log queue full, dropping record for '{}'", record.raw_text);
            }
            Err(mpsc::error::TrySendError::Closed(record)) => {
                warn!("Decision log writer stopped, dropping record for '{}'", record.raw_text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EngineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingSink {
        written: Mutex<Vec<DecisionRecord>>,
    }

    #[async_trait]
    impl DecisionSink for RecordingSink {
        async fn write(&self, record: &DecisionRecord) -> EngineResult<()> {
            self.written.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FailingSink {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl DecisionSink for FailingSink {
        async fn write(&self, _record: &DecisionRecord) -> EngineResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::DirectoryUnavailable("audit store down".to_string()))
        }
    }

    fn record(raw: &str) -> DecisionRecord {
        DecisionRecord::new(raw, "butter", vec!["oil".to_string()])
            .with_determination(false, "different families")
    }

    #[test]
    fn test_memory_log_keeps_records() {
        let log = MemoryDecisionLog::new();
        log.record(record("2 tbsp butter or oil"));
        let records = log.records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].equivalent);
        assert_eq!(records[0].alternative_names, vec!["oil".to_string()]);
    }

    #[tokio::test]
    async fn test_channel_log_forwards_in_order() {
        let sink = Arc::new(RecordingSink::default());
        let (log, handle) = ChannelDecisionLog::spawn(sink.clone(), &RecoveryConfig::default(), 16);

        log.record(record("first"));
        log.record(record("second"));
        drop(log);
        handle.await.unwrap();

        let written = sink.written.lock().unwrap();
        let raw: Vec<&str> = written.iter().map(|r| r.raw_text.as_str()).collect();
        assert_eq!(raw, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_failing_sink_trips_breaker_without_propagating() {
        let sink = Arc::new(FailingSink::default());
        let recovery = RecoveryConfig {
            circuit_breaker_threshold: 2,
            circuit_breaker_reset_secs: 60,
            ..Default::default()
        };
        let (log, handle) = ChannelDecisionLog::spawn(sink.clone(), &recovery, 16);

        for i in 0..5 {
            log.record(record(&format!("line {}", i)));
        }
        drop(log);
        handle.await.unwrap();

        assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_record_serializes() {
        let json = serde_json::to_value(record("x").with_recipe(Some("r-1"))).unwrap();
        assert_eq!(json["recipe_id"], "r-1");
        assert_eq!(json["primary_name"], "butter");
    }
}
