//! Append-only structured call log shared by all service implementations.
//!
//! One JSON object per line, one record per completed interface call. The
//! logger is an explicitly injected handle rather than ambient state so tests
//! can substitute an in-memory sink and assert on emitted records.
//!
//! Logging failures must never abort the primary operation whose outcome is
//! being recorded: a sink write error falls back to stderr and is otherwise
//! swallowed.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Outcome recorded for a single call or re-attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Failure,
    Retry,
}

/// Immutable value appended to the call log. Never mutated or deleted after
/// being written; ordering is the append order.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub capability: String,
    pub provider: String,
    pub action: String,
    pub status: CallStatus,
    pub details: serde_json::Value,
}

impl LogRecord {
    pub fn new(
        capability: &str,
        provider: &str,
        action: &str,
        status: CallStatus,
        details: serde_json::Value,
    ) -> Self {
        LogRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            capability: capability.to_string(),
            provider: provider.to_string(),
            action: action.to_string(),
            status,
            details,
        }
    }
}

/// Destination for serialized log lines.
pub trait LogSink: Send + Sync {
    fn append(&self, line: &str) -> std::io::Result<()>;
}

/// Line-delimited JSON file sink. The file is opened in append mode on every
/// write, so multiple sequential writers within one process interleave whole
/// lines. Multi-process concurrent append is not supported.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(JsonlSink { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for JsonlSink {
    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

/// In-memory sink for tests.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended lines, in append order.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LogSink for MemorySink {
    fn append(&self, line: &str) -> std::io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
        Ok(())
    }
}

/// Cheap, cloneable handle passed to every concrete service implementation.
#[derive(Clone)]
pub struct CallLogger {
    sink: Arc<dyn LogSink>,
}

impl CallLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        CallLogger { sink }
    }

    /// Logger writing line-delimited JSON to `path`.
    pub fn jsonl<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(CallLogger {
            sink: Arc::new(JsonlSink::new(path)?),
        })
    }

    /// Logger writing to an inspectable in-memory sink. Returns the sink
    /// alongside the handle so tests can assert on emitted records.
    pub fn in_memory() -> (Self, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (
            CallLogger {
                sink: sink.clone(),
            },
            sink,
        )
    }

    /// Append one record. Infallible by contract: serialization of a
    /// well-formed record does not fail, and an unwritable sink degrades to a
    /// best-effort stderr line.
    pub fn record(&self, record: LogRecord) {
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to serialize call log record");
                return;
            }
        };
        if let Err(e) = self.sink.append(&line) {
            tracing::warn!(error = ?e, "Call log sink unavailable, writing to stderr");
            eprintln!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_preserves_append_order() {
        let (logger, sink) = CallLogger::in_memory();
        logger.record(LogRecord::new(
            "storage_service",
            "MockS3",
            "upload_file",
            CallStatus::Success,
            serde_json::json!({"key": "a"}),
        ));
        logger.record(LogRecord::new(
            "storage_service",
            "MockS3",
            "upload_file",
            CallStatus::Failure,
            serde_json::json!({"key": "b"}),
        ));

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"status\":\"success\""));
        assert!(lines[1].contains("\"status\":\"failure\""));

        // Re-reading yields the same sequence.
        assert_eq!(sink.lines(), lines);
    }

    #[test]
    fn jsonl_sink_appends_one_line_per_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs/api_call_log.jsonl");
        let logger = CallLogger::jsonl(&path).expect("sink");
        logger.record(LogRecord::new(
            "search_service",
            "MockGoogle",
            "search",
            CallStatus::Success,
            serde_json::json!({"query": "rust"}),
        ));

        let contents = std::fs::read_to_string(&path).expect("log file");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).expect("valid json");
        assert_eq!(parsed["capability"], "search_service");
        assert_eq!(parsed["action"], "search");
    }
}
