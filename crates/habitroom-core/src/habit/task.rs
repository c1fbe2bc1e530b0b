use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::time::TimeOfDay;
use crate::error::ValidationError;

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]{2,32}$").expect("static id pattern"));

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 60;

/// A habit with a main window and a reduced-reward fallback window.
///
/// Times are kept as the `HH:MM` text they were persisted with so a
/// hand-edited file with one bad entry still loads; [`Task::window`]
/// parses them on use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub start: String,
    pub end: String,
    pub fallback_end: String,
    pub main_points: u32,
    pub fallback_points: u32,
}

/// Parsed, ordered window boundaries of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub fallback_end: TimeOfDay,
}

impl Task {
    /// Parse the three boundaries and check `start < end <= fallback_end`.
    pub fn window(&self) -> Result<TaskWindow, ValidationError> {
        parse_window(&self.start, &self.end, &self.fallback_end)
    }

    /// Full rule check used before any task is persisted.
    pub fn validate(&self) -> Result<TaskWindow, ValidationError> {
        validate_id(&self.id)?;
        validate_name(&self.name)?;
        self.window()
    }
}

pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if ID_PATTERN.is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidId(id.to_string()))
    }
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName(name.to_string()))
    }
}

pub fn parse_time(field: &'static str, value: &str) -> Result<TimeOfDay, ValidationError> {
    value.parse().map_err(|_| ValidationError::InvalidTime {
        field,
        value: value.to_string(),
    })
}

pub fn parse_window(start: &str, end: &str, fallback_end: &str) -> Result<TaskWindow, ValidationError> {
    let window = TaskWindow {
        start: parse_time("start", start)?,
        end: parse_time("end", end)?,
        fallback_end: parse_time("fallback end", fallback_end)?,
    };
    if window.start < window.end && window.end <= window.fallback_end {
        Ok(window)
    } else {
        Err(ValidationError::InvalidOrder {
            start: window.start.to_string(),
            end: window.end.to_string(),
            fallback_end: window.fallback_end.to_string(),
        })
    }
}
