//! Append-only persistence boundary.
//!
//! The storage collaborator owns durable state; the engine only hands it
//! facts: closed strike events and per-cycle condition snapshots. Sink
//! failures are logged by the cycle driver and never abort a refresh.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;
use strikecast_core::{ScoredReading, StrikeEvent};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open events file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append record: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Interface boundary to the excluded storage collaborator.
pub trait StrikeSink: Send + Sync {
    /// Record a strike event that has ended.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the record cannot be appended.
    fn record_closed_event(&self, event: &StrikeEvent) -> Result<(), SinkError>;

    /// Record a point-in-time condition snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the record cannot be appended.
    fn record_snapshot(&self, snapshot: &ScoredReading) -> Result<(), SinkError>;
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SinkRecord<'a> {
    StrikeEvent(&'a StrikeEvent),
    Snapshot(&'a ScoredReading),
}

/// JSON-lines file sink: one record per line, append-only.
pub struct JsonlSink {
    file: Mutex<File>,
}

impl JsonlSink {
    /// Open (or create) the events file for appending.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the file or its parent directory
    /// cannot be created.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let open_err = |source| SinkError::Open {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(open_err)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn append(&self, record: &SinkRecord<'_>) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| SinkError::Write(std::io::Error::other("events file lock poisoned")))?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl StrikeSink for JsonlSink {
    fn record_closed_event(&self, event: &StrikeEvent) -> Result<(), SinkError> {
        self.append(&SinkRecord::StrikeEvent(event))
    }

    fn record_snapshot(&self, snapshot: &ScoredReading) -> Result<(), SinkError> {
        self.append(&SinkRecord::Snapshot(snapshot))
    }
}

/// In-memory sink for tests and ad-hoc inspection.
#[derive(Default)]
pub struct MemorySink {
    closed_events: Mutex<Vec<StrikeEvent>>,
    snapshots: Mutex<Vec<ScoredReading>>,
}

impl MemorySink {
    #[must_use]
    pub fn closed_events(&self) -> Vec<StrikeEvent> {
        self.closed_events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn snapshots(&self) -> Vec<ScoredReading> {
        self.snapshots.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl StrikeSink for MemorySink {
    fn record_closed_event(&self, event: &StrikeEvent) -> Result<(), SinkError> {
        if let Ok(mut events) = self.closed_events.lock() {
            events.push(event.clone());
        }
        Ok(())
    }

    fn record_snapshot(&self, snapshot: &ScoredReading) -> Result<(), SinkError> {
        if let Ok(mut snapshots) = self.snapshots.lock() {
            snapshots.push(snapshot.clone());
        }
        Ok(())
    }
}
