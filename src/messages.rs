//! Output message types
//!
//! The tap emits a flat, ordered sequence of messages: one schema per stream
//! up front, then record messages, with log messages interleaved. Records are
//! plain JSON values; downstream ingestion owns any further conversion.

use crate::types::{JsonValue, LogLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A message emitted during a read
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    /// Schema announcement for a stream
    Schema {
        /// Stream name
        stream: String,
        /// JSON Schema for the stream's records
        schema: JsonValue,
    },
    /// A single record
    Record {
        /// Stream name
        stream: String,
        /// The record payload
        record: JsonValue,
        /// Timestamp when the record was emitted
        emitted_at: DateTime<Utc>,
    },
    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(stream: impl Into<String>, schema: JsonValue) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
        }
    }

    /// Create a record message
    pub fn record(stream: impl Into<String>, record: JsonValue) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            emitted_at: Utc::now(),
        }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a debug log
    pub fn debug(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Debug, message)
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }
}

/// Statistics from a read operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Total pages fetched from the members endpoint
    pub pages_fetched: usize,
    /// Total lists processed
    pub lists_synced: usize,
    /// Errors encountered
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add pages
    pub fn add_pages(&mut self, count: usize) {
        self.pages_fetched += count;
    }

    /// Add a list
    pub fn add_list(&mut self) {
        self.lists_synced += 1;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
