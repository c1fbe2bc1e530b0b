//! Append-only score ledger.
//!
//! Stored at `<data dir>/ledger.json` as
//! `{days: {"YYYY-MM-DD": {total, events: [...]}}}` and rewritten in full
//! after every recorded event. A missing or corrupt file reads as empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{write_file, LEDGER_FILE};
use crate::error::Result;
use crate::window::WindowKind;

/// One point-earning claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEvent {
    pub time: String,
    pub task_id: String,
    pub task_name: String,
    pub kind: WindowKind,
    pub points: i64,
}

/// Everything earned on one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub events: Vec<LedgerEvent>,
}

impl DayRecord {
    fn push(&mut self, event: LedgerEvent) {
        self.total += event.points;
        self.events.push(event);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub days: BTreeMap<String, DayRecord>,
}

/// Date key (`YYYY-MM-DD`) of `now` in its own offset.
pub fn date_key(now: &DateTime<FixedOffset>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Write-through file ledger.
#[derive(Debug, Clone)]
pub struct ScoreLedger {
    path: PathBuf,
}

impl ScoreLedger {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(LEDGER_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event to today's record and persist. Returns the new
    /// day total.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn record(
        &self,
        points: i64,
        task_id: &str,
        task_name: &str,
        kind: WindowKind,
        now: DateTime<FixedOffset>,
    ) -> Result<i64> {
        let mut doc = self.load();
        let day = doc.days.entry(date_key(&now)).or_default();
        day.push(LedgerEvent {
            time: now.to_rfc3339(),
            task_id: task_id.to_string(),
            task_name: task_name.to_string(),
            kind,
            points,
        });
        let total = day.total;
        self.save(&doc)?;
        Ok(total)
    }

    /// The record for `date_key`, or an empty one.
    pub fn query(&self, date_key: &str) -> DayRecord {
        self.load().days.remove(date_key).unwrap_or_default()
    }

    /// Read the whole document, substituting an empty one on any failure.
    pub fn load(&self) -> LedgerDocument {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LedgerDocument::default(),
            Err(e) => {
                warn!(path = %self.path.display(), "Unreadable ledger, treating as empty: {e}");
                return LedgerDocument::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "Corrupt ledger, treating as empty: {e}");
            LedgerDocument::default()
        })
    }

    fn save(&self, doc: &LedgerDocument) -> Result<()> {
        let content = serde_json::to_string_pretty(doc)?;
        write_file(&self.path, &content)?;
        Ok(())
    }
}
