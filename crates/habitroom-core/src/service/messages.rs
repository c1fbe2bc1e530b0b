//! Outbound chat texts.

use crate::habit::Task;
use crate::window::WindowKind;

pub const STALE_ACTION: &str = "This button is no longer valid.";
pub const MAIN_BUTTON: &str = "Done ✅";
pub const FALLBACK_BUTTON: &str = "Done late ☑️";

pub const GREETING: &str = "Hi! I open a window for each habit every day. \
Press the button before it closes to earn points.";

pub fn main_prompt(task: &Task) -> String {
    format!(
        "⏰ {}\nPress the button by {} for {} points.",
        task.name, task.end, task.main_points
    )
}

pub fn fallback_prompt(task: &Task) -> String {
    format!(
        "⌛ {}: main window missed.\nStill counts until {} for {} points.",
        task.name, task.fallback_end, task.fallback_points
    )
}

pub fn expired(task: &Task) -> String {
    format!("❌ {}: time expired.", task.name)
}

pub fn claimed(kind: WindowKind, task: &Task, points: i64, total: Option<i64>) -> String {
    let head = match kind {
        WindowKind::Main => format!("✅ {}: done! +{points}", task.name),
        WindowKind::Fallback => format!("☑️ {}: done late. +{points}", task.name),
    };
    match total {
        Some(total) => format!("{head}\nToday: {total} points"),
        None => format!("{head}\n(score could not be saved)"),
    }
}

pub fn score(total: i64) -> String {
    format!("Today: {total} points")
}
