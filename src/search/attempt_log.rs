//! Append-only record of every probe
//!
//! Observability only: nothing in the search reads these records back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::core::errors::{Result, SearchError};
use crate::pattern::Code;
use crate::search::oracle::{OutcomeKind, ProbeOutcome};

/// One probe as it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub timestamp: DateTime<Utc>,
    pub worker_id: usize,
    pub index: usize,
    pub code: Code,
    pub outcome: OutcomeKind,
    pub detail: Option<String>,
}

impl AttemptRecord {
    pub fn new(
        worker_id: usize,
        index: usize,
        code: Code,
        outcome: &ProbeOutcome,
        max_detail: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            worker_id,
            index,
            code,
            outcome: outcome.kind(),
            detail: outcome.detail().map(|d| truncate_chars(d, max_detail)),
        }
    }
}

/// Cut `text` to at most `max` characters, on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Destination for attempt records. Must not block for long: it is called
/// from workers between probes.
pub trait AttemptSink: Send + Sync {
    fn record(&self, record: &AttemptRecord);

    fn flush(&self) {}
}

impl<T: AttemptSink + ?Sized> AttemptSink for Arc<T> {
    fn record(&self, record: &AttemptRecord) {
        (**self).record(record);
    }

    fn flush(&self) {
        (**self).flush();
    }
}

/// Emits each record as a `tracing` debug event only.
#[derive(Debug, Default)]
pub struct TracingAttemptLog;

impl AttemptSink for TracingAttemptLog {
    fn record(&self, record: &AttemptRecord) {
        debug!(
            worker = record.worker_id,
            index = record.index,
            code = %record.code,
            outcome = record.outcome.as_str(),
            detail = record.detail.as_deref().unwrap_or(""),
            "probe attempt"
        );
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryAttemptLog {
    records: Mutex<Vec<AttemptRecord>>,
}

impl MemoryAttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AttemptRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttemptSink for MemoryAttemptLog {
    fn record(&self, record: &AttemptRecord) {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.push(record.clone());
    }
}

/// Writes one JSON object per line to a file, truncating it on open.
#[derive(Debug)]
pub struct JsonlAttemptLog {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlAttemptLog {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| SearchError::io(format!("open attempt log {}", path.display()), e))?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl AttemptSink for JsonlAttemptLog {
    fn record(&self, record: &AttemptRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize attempt record: {}", e);
                return;
            }
        };
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(writer, "{}", line) {
            warn!("Failed to write attempt record: {}", e);
        }
    }

    fn flush(&self) {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writer.flush() {
            warn!("Failed to flush attempt log: {}", e);
        }
    }
}

/// Fans records out to several sinks.
#[derive(Default)]
pub struct AttemptLog {
    sinks: Vec<Box<dyn AttemptSink>>,
}

impl AttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl AttemptSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl AttemptSink for AttemptLog {
    fn record(&self, record: &AttemptRecord) {
        for sink in &self.sinks {
            sink.record(record);
        }
    }

    fn flush(&self) {
        for sink in &self.sinks {
            sink.flush();
        }
    }
}
