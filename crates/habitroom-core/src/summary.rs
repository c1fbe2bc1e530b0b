//! Daily summary rendering.

use std::fmt::Write;

use chrono::DateTime;

use crate::storage::DayRecord;

/// Points earned by one task name on one day, in first-claim order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTotal {
    pub task_name: String,
    pub points: i64,
}

/// Sum a day's events grouped by the task name recorded with each event.
pub fn per_task_totals(day: &DayRecord) -> Vec<TaskTotal> {
    let mut totals: Vec<TaskTotal> = Vec::new();
    for event in &day.events {
        match totals.iter_mut().find(|t| t.task_name == event.task_name) {
            Some(total) => total.points += event.points,
            None => totals.push(TaskTotal {
                task_name: event.task_name.clone(),
                points: event.points,
            }),
        }
    }
    totals
}

/// Render the summary message for `date_key`.
pub fn build_summary(date_key: &str, day: &DayRecord, include_events: bool) -> String {
    let mut out = format!("📊 Summary for {date_key}\nTotal: {} points", day.total);

    if day.events.is_empty() {
        out.push_str("\nNo points earned today.");
        return out;
    }

    for total in per_task_totals(day) {
        let _ = write!(out, "\n• {}: {}", total.task_name, total.points);
    }

    if include_events {
        out.push_str("\n\nEvents:");
        for event in &day.events {
            let _ = write!(
                out,
                "\n{} {} ({}) +{}",
                clock_time(&event.time),
                event.task_name,
                event.kind,
                event.points
            );
        }
    }

    out
}

fn clock_time(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}
