//! Habit definitions and the validated mutations an admin can apply.
//!
//! A [`HabitConfig`] is the whole persisted document: the daily summary
//! time plus the ordered task list. Every change goes through
//! [`HabitConfig::apply`], which validates before touching anything.

mod task;
mod time;

pub use task::{parse_time, parse_window, validate_id, validate_name, Task, TaskWindow};
pub use time::{ParseTimeError, TimeOfDay};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The habit configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitConfig {
    #[serde(default = "default_summary_time")]
    pub summary_time: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

fn default_summary_time() -> String {
    "21:00".into()
}

impl Default for HabitConfig {
    fn default() -> Self {
        Self {
            summary_time: default_summary_time(),
            tasks: vec![
                Task {
                    id: "wake".into(),
                    name: "Wake up".into(),
                    start: "07:00".into(),
                    end: "07:10".into(),
                    fallback_end: "07:30".into(),
                    main_points: 3,
                    fallback_points: 1,
                },
                Task {
                    id: "workout".into(),
                    name: "Workout".into(),
                    start: "18:00".into(),
                    end: "18:30".into(),
                    fallback_end: "19:00".into(),
                    main_points: 3,
                    fallback_points: 1,
                },
            ],
        }
    }
}

/// An admin change to the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetTimes {
        id: String,
        start: String,
        end: String,
        fallback_end: String,
    },
    SetPoints {
        id: String,
        main_points: u32,
        fallback_points: u32,
    },
    Rename {
        id: String,
        name: String,
    },
    Add(Task),
    Delete {
        id: String,
    },
    SetSummaryTime(String),
    Reset,
}

impl HabitConfig {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut Task, ValidationError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownId(id.to_string()))
    }

    /// Apply a mutation in place. On error `self` is left untouched.
    pub fn apply(&mut self, mutation: Mutation) -> Result<(), ValidationError> {
        match mutation {
            Mutation::SetTimes {
                id,
                start,
                end,
                fallback_end,
            } => {
                parse_window(&start, &end, &fallback_end)?;
                let task = self.task_mut(&id)?;
                task.start = start;
                task.end = end;
                task.fallback_end = fallback_end;
            }
            Mutation::SetPoints {
                id,
                main_points,
                fallback_points,
            } => {
                let task = self.task_mut(&id)?;
                task.main_points = main_points;
                task.fallback_points = fallback_points;
            }
            Mutation::Rename { id, name } => {
                validate_name(&name)?;
                self.task_mut(&id)?.name = name;
            }
            Mutation::Add(task) => {
                task.validate()?;
                if self.task(&task.id).is_some() {
                    return Err(ValidationError::DuplicateId(task.id));
                }
                self.tasks.push(task);
            }
            Mutation::Delete { id } => {
                let before = self.tasks.len();
                self.tasks.retain(|t| t.id != id);
                if self.tasks.len() == before {
                    return Err(ValidationError::UnknownId(id));
                }
            }
            Mutation::SetSummaryTime(time) => {
                parse_time("summary", &time)?;
                self.summary_time = time;
            }
            Mutation::Reset => *self = Self::default(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> Task {
        Task {
            id: "read".into(),
            name: "Read 20 pages".into(),
            start: "21:00".into(),
            end: "21:30".into(),
            fallback_end: "22:00".into(),
            main_points: 2,
            fallback_points: 1,
        }
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = HabitConfig::default();
        assert!(parse_time("summary", &cfg.summary_time).is_ok());
        for task in &cfg.tasks {
            task.validate().unwrap();
        }
    }

    #[test]
    fn add_then_delete() {
        let mut cfg = HabitConfig::default();
        cfg.apply(Mutation::Add(reading())).unwrap();
        assert_eq!(cfg.task("read"), Some(&reading()));
        assert_eq!(cfg.tasks.last().unwrap().id, "read");

        cfg.apply(Mutation::Delete { id: "read".into() }).unwrap();
        assert!(cfg.task("read").is_none());
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let mut cfg = HabitConfig::default();
        let dup = Task {
            id: "wake".into(),
            ..reading()
        };
        assert_eq!(
            cfg.apply(Mutation::Add(dup)),
            Err(ValidationError::DuplicateId("wake".into()))
        );
        assert_eq!(cfg, HabitConfig::default());
    }

    #[test]
    fn set_times_rejects_bad_order_without_change() {
        let mut cfg = HabitConfig::default();
        let err = cfg
            .apply(Mutation::SetTimes {
                id: "wake".into(),
                start: "07:00".into(),
                end: "07:05".into(),
                fallback_end: "07:04".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidOrder { .. }));
        assert_eq!(cfg.task("wake").unwrap().end, "07:10");
    }

    #[test]
    fn unknown_id_is_reported() {
        let mut cfg = HabitConfig::default();
        let err = cfg
            .apply(Mutation::Rename {
                id: "nope".into(),
                name: "Whatever".into(),
            })
            .unwrap_err();
        assert_eq!(err, ValidationError::UnknownId("nope".into()));
        assert!(cfg.apply(Mutation::Delete { id: "nope".into() }).is_err());
    }

    #[test]
    fn set_points_and_summary_time() {
        let mut cfg = HabitConfig::default();
        cfg.apply(Mutation::SetPoints {
            id: "workout".into(),
            main_points: 5,
            fallback_points: 2,
        })
        .unwrap();
        cfg.apply(Mutation::SetSummaryTime("22:15".into())).unwrap();
        assert_eq!(cfg.task("workout").unwrap().main_points, 5);
        assert_eq!(cfg.summary_time, "22:15");
        assert!(cfg.apply(Mutation::SetSummaryTime("25:00".into())).is_err());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut cfg = HabitConfig::default();
        cfg.apply(Mutation::Delete { id: "wake".into() }).unwrap();
        cfg.apply(Mutation::Reset).unwrap();
        assert_eq!(cfg, HabitConfig::default());
    }
}
