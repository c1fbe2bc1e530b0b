//! JSON-backed habit configuration.
//!
//! Stored at `<data dir>/habits.json` as `{summaryTime, tasks: [...]}`.
//! A missing or structurally broken file is replaced with the built-in
//! defaults; individual malformed task entries are dropped.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use super::{write_file, HABITS_FILE};
use crate::error::Result;
use crate::habit::{HabitConfig, Mutation, Task};

/// File store for [`HabitConfig`].
#[derive(Debug, Clone)]
pub struct HabitStore {
    path: PathBuf,
}

impl HabitStore {
    /// Store inside `dir` using the standard file name.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(HABITS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load from disk, writing and returning defaults when the file is
    /// missing, unreadable or not shaped like a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error only if the defaults cannot be written.
    pub fn load(&self) -> Result<HabitConfig> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), "Unreadable habit config, using defaults: {e}");
                }
                return self.reset_to_defaults();
            }
        };

        match parse_document(&content) {
            Some(cfg) => Ok(cfg),
            None => {
                warn!(path = %self.path.display(), "Corrupt habit config, restoring defaults");
                self.reset_to_defaults()
            }
        }
    }

    /// Persist the full document.
    pub fn save(&self, config: &HabitConfig) -> Result<()> {
        let content = serde_json::to_string_pretty(config)?;
        write_file(&self.path, &content)?;
        Ok(())
    }

    /// Validate `mutation` against a copy of `config`, persist the copy,
    /// then commit it to `config`. Nothing changes if either step fails.
    pub fn apply(&self, config: &mut HabitConfig, mutation: Mutation) -> Result<()> {
        let mut next = config.clone();
        next.apply(mutation)?;
        self.save(&next)?;
        *config = next;
        Ok(())
    }

    fn reset_to_defaults(&self) -> Result<HabitConfig> {
        let cfg = HabitConfig::default();
        self.save(&cfg)?;
        info!(path = %self.path.display(), "Wrote default habit config");
        Ok(cfg)
    }
}

fn parse_document(content: &str) -> Option<HabitConfig> {
    let root: Value = serde_json::from_str(content).ok()?;
    let obj = root.as_object()?;
    let tasks = obj.get("tasks")?.as_array()?;

    let summary_time = match obj.get("summaryTime").and_then(Value::as_str) {
        Some(s) => s.to_string(),
        None => HabitConfig::default().summary_time,
    };

    let tasks = tasks
        .iter()
        .filter_map(|raw| match serde_json::from_value::<Task>(raw.clone()) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!("Dropping malformed task entry {raw}: {e}");
                None
            }
        })
        .collect();

    Some(HabitConfig {
        summary_time,
        tasks,
    })
}
