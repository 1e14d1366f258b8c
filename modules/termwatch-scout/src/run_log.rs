//! Poll run log — persisted JSON timeline of every action taken during a run.
//!
//! Each run produces a single `{DATA_DIR}/poll-runs/{run_id}.json` file
//! containing an ordered list of events with timestamps. Saving is
//! best-effort; a failure here never aborts the run.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::scheduler::PollStats;

/// Root data directory, controlled by `DATA_DIR` env var (default: `"data"`).
pub fn data_dir() -> PathBuf {
    PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

pub struct RunLog {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    events: Vec<RunEvent>,
    seq: u32,
}

#[derive(Serialize)]
struct RunEvent {
    seq: u32,
    ts: DateTime<Utc>,
    #[serde(flatten)]
    kind: EventKind,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    SourceScanned {
        source: String,
        matched: u32,
    },
    SourceFailed {
        source: String,
        error: String,
    },
    ItemFlagged {
        kind: String,
        source: String,
        url: String,
    },
    CycleComplete {
        cycle: u32,
        new_items: u32,
        accumulated: u32,
    },
    ReportFlushed {
        path: String,
        items: u32,
    },
}

impl RunLog {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            events: Vec::new(),
            seq: 0,
        }
    }

    pub fn log(&mut self, kind: EventKind) {
        self.events.push(RunEvent {
            seq: self.seq,
            ts: Utc::now(),
            kind,
        });
        self.seq += 1;
    }

    /// Serialize the run log to JSON and write to disk.
    /// Returns the file path on success.
    pub fn save(&self, stats: &PollStats) -> Result<PathBuf> {
        let dir = data_dir().join("poll-runs");
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", self.run_id));

        let output = SerializedRunLog {
            run_id: &self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            stats: SerializedStats::from(stats),
            events: &self.events,
        };

        std::fs::write(&path, serde_json::to_string_pretty(&output)?)?;
        info!(path = %path.display(), events = self.events.len(), "Poll run log saved");

        Ok(path)
    }
}

#[derive(Serialize)]
struct SerializedRunLog<'a> {
    run_id: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    stats: SerializedStats,
    events: &'a [RunEvent],
}

#[derive(Serialize)]
struct SerializedStats {
    cycles: u32,
    items_scanned: u32,
    items_flagged: u32,
    duplicates_dropped: u32,
    source_failures: u32,
}

impl From<&PollStats> for SerializedStats {
    fn from(s: &PollStats) -> Self {
        Self {
            cycles: s.cycles,
            items_scanned: s.items_scanned,
            items_flagged: s.items_flagged,
            duplicates_dropped: s.duplicates_dropped,
            source_failures: s.source_failures,
        }
    }
}
