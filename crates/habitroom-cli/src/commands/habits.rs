use std::path::Path;

use clap::Subcommand;
use habitroom_core::admin::{confirmation, render_habits};
use habitroom_core::{HabitStore, Mutation, Task};

use super::CliResult;

/// Offline edits to habits.json. A running bot picks them up on restart.
#[derive(Subcommand)]
pub enum HabitsAction {
    /// List habits
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a habit
    Add {
        id: String,
        /// Main window opens (HH:MM)
        start: String,
        /// Main window closes
        end: String,
        /// Fallback window closes
        fallback_end: String,
        main_points: u32,
        fallback_points: u32,
        /// Display name
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Delete a habit
    Del { id: String },
    /// Change a habit's times
    Set {
        id: String,
        start: String,
        end: String,
        fallback_end: String,
    },
    /// Change a habit's points
    Points {
        id: String,
        main_points: u32,
        fallback_points: u32,
    },
    /// Rename a habit
    Rename {
        id: String,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Change the daily summary time
    SummaryTime { time: String },
    /// Restore the default habits
    Reset,
}

impl HabitsAction {
    fn into_mutation(self) -> Option<Mutation> {
        let mutation = match self {
            HabitsAction::List { .. } => return None,
            HabitsAction::Add {
                id,
                start,
                end,
                fallback_end,
                main_points,
                fallback_points,
                name,
            } => Mutation::Add(Task {
                id,
                name: name.join(" "),
                start,
                end,
                fallback_end,
                main_points,
                fallback_points,
            }),
            HabitsAction::Del { id } => Mutation::Delete { id },
            HabitsAction::Set {
                id,
                start,
                end,
                fallback_end,
            } => Mutation::SetTimes {
                id,
                start,
                end,
                fallback_end,
            },
            HabitsAction::Points {
                id,
                main_points,
                fallback_points,
            } => Mutation::SetPoints {
                id,
                main_points,
                fallback_points,
            },
            HabitsAction::Rename { id, name } => Mutation::Rename {
                id,
                name: name.join(" "),
            },
            HabitsAction::SummaryTime { time } => Mutation::SetSummaryTime(time),
            HabitsAction::Reset => Mutation::Reset,
        };
        Some(mutation)
    }
}

pub fn run(dir: &Path, action: HabitsAction) -> CliResult {
    let store = HabitStore::in_dir(dir);
    let mut config = store.load()?;

    if let HabitsAction::List { json } = action {
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!("{}", render_habits(&config));
        }
        return Ok(());
    }

    if let Some(mutation) = action.into_mutation() {
        store.apply(&mut config, mutation.clone())?;
        println!("{}", confirmation(&mutation, &config));
    }
    Ok(())
}
