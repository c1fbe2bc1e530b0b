//! Tokio-backed [`TimerPort`]: one sleeping task per registered job.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use croner::Cron;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Job, TimerHandle, TimerPort};
use crate::error::ScheduleError;
use crate::events::BotEvent;

/// Parse `expr` and find its first match strictly after `now`.
pub fn next_fire(
    expr: &str,
    now: &DateTime<FixedOffset>,
) -> Result<DateTime<FixedOffset>, ScheduleError> {
    let cron: Cron = expr.parse().map_err(|e| ScheduleError::InvalidExpression {
        expr: expr.to_string(),
        message: format!("{e}"),
    })?;
    cron.find_next_occurrence(now, false)
        .map_err(|_| ScheduleError::NoOccurrence(expr.to_string()))
}

/// Next match after both `now` and the occurrence that fired last, so a
/// wall clock reading behind `last` cannot repeat it.
pub fn next_fire_after(
    expr: &str,
    now: &DateTime<FixedOffset>,
    last: Option<&DateTime<FixedOffset>>,
) -> Result<DateTime<FixedOffset>, ScheduleError> {
    match last {
        Some(last) if last > now => next_fire(expr, last),
        _ => next_fire(expr, now),
    }
}

/// Sleep until the wall clock reaches `at`. Tokio sleeps on the monotonic
/// clock, so a slewed or stepped wall clock is re-checked after each wake.
async fn sleep_until_wall_clock(at: DateTime<Utc>) {
    while let Ok(wait) = (at - Utc::now()).to_std() {
        if wait.is_zero() {
            break;
        }
        tokio::time::sleep(wait).await;
    }
}

/// Fires jobs by pushing [`BotEvent::Timer`] onto the service queue.
pub struct CronTimerPort {
    queue: UnboundedSender<BotEvent>,
    tasks: HashMap<u64, JoinHandle<()>>,
    next_id: u64,
}

impl CronTimerPort {
    pub fn new(queue: UnboundedSender<BotEvent>) -> Self {
        Self {
            queue,
            tasks: HashMap::new(),
            next_id: 0,
        }
    }
}

impl TimerPort for CronTimerPort {
    /// Must be called from within a tokio runtime.
    fn schedule_recurring(
        &mut self,
        expr: &str,
        offset: FixedOffset,
        job: Job,
    ) -> Result<TimerHandle, ScheduleError> {
        // Validate up front so a bad expression is reported to the caller.
        next_fire(expr, &Utc::now().with_timezone(&offset))?;

        let expr = expr.to_string();
        let queue = self.queue.clone();
        let task = tokio::spawn(async move {
            let mut last: Option<DateTime<FixedOffset>> = None;
            loop {
                let now = Utc::now().with_timezone(&offset);
                let at = match next_fire_after(&expr, &now, last.as_ref()) {
                    Ok(at) => at,
                    Err(e) => {
                        warn!(?job, "Timer stopped: {e}");
                        return;
                    }
                };
                debug!(?job, at = %at, "Timer armed");
                sleep_until_wall_clock(at.with_timezone(&Utc)).await;
                last = Some(at);
                if queue.send(BotEvent::Timer(job.clone())).is_err() {
                    return;
                }
            }
        });

        self.next_id += 1;
        self.tasks.insert(self.next_id, task);
        Ok(TimerHandle(self.next_id))
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle.0) {
            task.abort();
        }
    }
}

impl Drop for CronTimerPort {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.abort();
        }
    }
}
