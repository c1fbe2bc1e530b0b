//! Admin text commands.
//!
//! Parsing is pure: a message body becomes an [`AdminCommand`] or a
//! [`ValidationError`] carrying the corrective reply. Configuration changes
//! are expressed as [`Mutation`]s so the chat and the offline CLI share one
//! validation path.

use std::fmt::Write;

use crate::error::ValidationError;
use crate::habit::{HabitConfig, Mutation, Task};

pub const SET_USAGE: &str = "/set <id> <start> <end> <fallbackEnd>";
pub const POINTS_USAGE: &str = "/points <id> <mainPoints> <fallbackPoints>";
pub const RENAME_USAGE: &str = "/rename <id> <name...>";
pub const ADD_USAGE: &str =
    "/add <id> <start> <end> <fallbackEnd> <mainPoints> <fallbackPoints> | <name...>";
pub const DEL_USAGE: &str = "/del <id>";
pub const SETSUMMARY_USAGE: &str = "/setsummary <HH:MM>";

pub const HELP: &str = "Commands:
/habits - list habits
/score - today's points
/summary - today's summary
/set <id> <start> <end> <fallbackEnd>
/points <id> <mainPoints> <fallbackPoints>
/rename <id> <name...>
/add <id> <start> <end> <fallbackEnd> <mainPoints> <fallbackPoints> | <name...>
/del <id>
/setsummary <HH:MM>
/reset - restore default habits";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Start,
    Help,
    Habits,
    Score,
    Summary,
    Mutate(Mutation),
}

impl AdminCommand {
    /// Parse a message body. `None` means the text is not a known command.
    pub fn parse(text: &str) -> Option<Result<Self, ValidationError>> {
        let text = text.trim();
        let (head, rest) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (text, ""),
        };
        let name = head.strip_prefix('/')?;
        // Group chats address commands as /cmd@botname.
        let name = name.split('@').next().unwrap_or(name).to_ascii_lowercase();
        let args: Vec<&str> = rest.split_whitespace().collect();

        let parsed = match name.as_str() {
            "start" => Ok(AdminCommand::Start),
            "help" => Ok(AdminCommand::Help),
            "habits" => Ok(AdminCommand::Habits),
            "score" => Ok(AdminCommand::Score),
            "summary" => Ok(AdminCommand::Summary),
            "reset" => Ok(AdminCommand::Mutate(Mutation::Reset)),
            "set" => parse_set(&args),
            "points" => parse_points_args(&args),
            "rename" => parse_rename(&args),
            "add" => parse_add(rest),
            "del" => match args.as_slice() {
                [id] => Ok(AdminCommand::Mutate(Mutation::Delete { id: id.to_string() })),
                _ => Err(ValidationError::Usage(DEL_USAGE)),
            },
            "setsummary" => match args.as_slice() {
                [time] => Ok(AdminCommand::Mutate(Mutation::SetSummaryTime(time.to_string()))),
                _ => Err(ValidationError::Usage(SETSUMMARY_USAGE)),
            },
            _ => return None,
        };
        Some(parsed)
    }
}

pub fn parse_points(value: &str) -> Result<u32, ValidationError> {
    value
        .parse()
        .map_err(|_| ValidationError::InvalidPoints(value.to_string()))
}

fn parse_set(args: &[&str]) -> Result<AdminCommand, ValidationError> {
    let [id, start, end, fallback_end] = args else {
        return Err(ValidationError::Usage(SET_USAGE));
    };
    Ok(AdminCommand::Mutate(Mutation::SetTimes {
        id: id.to_string(),
        start: start.to_string(),
        end: end.to_string(),
        fallback_end: fallback_end.to_string(),
    }))
}

fn parse_points_args(args: &[&str]) -> Result<AdminCommand, ValidationError> {
    let [id, main, fallback] = args else {
        return Err(ValidationError::Usage(POINTS_USAGE));
    };
    Ok(AdminCommand::Mutate(Mutation::SetPoints {
        id: id.to_string(),
        main_points: parse_points(main)?,
        fallback_points: parse_points(fallback)?,
    }))
}

fn parse_rename(args: &[&str]) -> Result<AdminCommand, ValidationError> {
    let [id, name @ ..] = args else {
        return Err(ValidationError::Usage(RENAME_USAGE));
    };
    if name.is_empty() {
        return Err(ValidationError::Usage(RENAME_USAGE));
    }
    Ok(AdminCommand::Mutate(Mutation::Rename {
        id: id.to_string(),
        name: name.join(" "),
    }))
}

fn parse_add(rest: &str) -> Result<AdminCommand, ValidationError> {
    let (fields, name) = rest
        .split_once('|')
        .ok_or(ValidationError::Usage(ADD_USAGE))?;
    let fields: Vec<&str> = fields.split_whitespace().collect();
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    let [id, start, end, fallback_end, main, fallback] = fields.as_slice() else {
        return Err(ValidationError::Usage(ADD_USAGE));
    };
    if name.is_empty() {
        return Err(ValidationError::Usage(ADD_USAGE));
    }
    Ok(AdminCommand::Mutate(Mutation::Add(Task {
        id: id.to_string(),
        name,
        start: start.to_string(),
        end: end.to_string(),
        fallback_end: fallback_end.to_string(),
        main_points: parse_points(main)?,
        fallback_points: parse_points(fallback)?,
    })))
}

/// One line per task, as shown by `/habits`.
pub fn describe_task(task: &Task) -> String {
    format!(
        "{} ({}): {}-{}, fallback until {}, {}/{} points",
        task.name,
        task.id,
        task.start,
        task.end,
        task.fallback_end,
        task.main_points,
        task.fallback_points
    )
}

pub fn render_habits(config: &HabitConfig) -> String {
    let mut out = String::from("Habits:");
    if config.tasks.is_empty() {
        out.push_str("\n(none)");
    }
    for task in &config.tasks {
        let _ = write!(out, "\n• {}", describe_task(task));
    }
    let _ = write!(out, "\nDaily summary at {}", config.summary_time);
    out
}

/// Reply text after `mutation` was applied, producing `config`.
pub fn confirmation(mutation: &Mutation, config: &HabitConfig) -> String {
    let described = |id: &str| {
        config
            .task(id)
            .map(describe_task)
            .unwrap_or_else(|| id.to_string())
    };
    match mutation {
        Mutation::SetTimes { id, .. } => format!("Times updated: {}", described(id)),
        Mutation::SetPoints { id, .. } => format!("Points updated: {}", described(id)),
        Mutation::Rename { id, .. } => format!("Renamed: {}", described(id)),
        Mutation::Add(task) => format!("Added: {}", described(&task.id)),
        Mutation::Delete { id } => format!("Deleted habit '{id}'"),
        Mutation::SetSummaryTime(time) => format!("Daily summary moved to {time}"),
        Mutation::Reset => format!("Habits reset to defaults.\n{}", render_habits(config)),
    }
}
