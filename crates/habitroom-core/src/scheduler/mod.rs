//! Binding between the habit configuration and recurring timers.
//!
//! Each task contributes three daily jobs (open main, close main, close
//! fallback) and the configuration contributes one summary job. The
//! binding owns every registered handle so a rebuild can cancel the whole
//! previous generation before registering the next.

mod cron;

pub use cron::{next_fire, next_fire_after, CronTimerPort};

use chrono::FixedOffset;
use tracing::{info, warn};

use crate::error::ScheduleError;
use crate::habit::{parse_time, HabitConfig, TimeOfDay};

/// Work a timer asks the service to perform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Job {
    OpenMain(String),
    CloseMain(String),
    CloseFallback(String),
    DailySummary,
}

/// Cancellation handle returned by a [`TimerPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Recurring wall-clock timer registry.
pub trait TimerPort: Send {
    /// Fire `job` every time the five-field `expr` matches in `offset`.
    fn schedule_recurring(
        &mut self,
        expr: &str,
        offset: FixedOffset,
        job: Job,
    ) -> Result<TimerHandle, ScheduleError>;

    fn cancel(&mut self, handle: TimerHandle);
}

/// Jobs derived from `config`, in registration order. Tasks whose times
/// do not parse are left out with a warning.
pub fn planned_jobs(config: &HabitConfig) -> Vec<(TimeOfDay, Job)> {
    let mut jobs = Vec::with_capacity(config.tasks.len() * 3 + 1);

    for task in &config.tasks {
        match task.window() {
            Ok(window) => {
                jobs.push((window.start, Job::OpenMain(task.id.clone())));
                jobs.push((window.end, Job::CloseMain(task.id.clone())));
                jobs.push((window.fallback_end, Job::CloseFallback(task.id.clone())));
            }
            Err(e) => warn!(task = %task.id, "Skipping schedule for task: {e}"),
        }
    }

    match parse_time("summary", &config.summary_time) {
        Ok(at) => jobs.push((at, Job::DailySummary)),
        Err(e) => warn!("Skipping daily summary: {e}"),
    }

    jobs
}

/// Keeps the registered timers in step with the configuration.
pub struct ScheduleBinding<T: TimerPort> {
    port: T,
    offset: FixedOffset,
    handles: Vec<TimerHandle>,
}

impl<T: TimerPort> ScheduleBinding<T> {
    pub fn new(port: T, offset: FixedOffset) -> Self {
        Self {
            port,
            offset,
            handles: Vec::new(),
        }
    }

    /// Cancel every timer, then register one per planned job.
    /// Returns how many were registered.
    pub fn rebuild(&mut self, config: &HabitConfig) -> usize {
        for handle in self.handles.drain(..) {
            self.port.cancel(handle);
        }

        for (at, job) in planned_jobs(config) {
            let expr = at.cron_expression();
            match self.port.schedule_recurring(&expr, self.offset, job.clone()) {
                Ok(handle) => self.handles.push(handle),
                Err(e) => warn!(?job, %expr, "Failed to register timer: {e}"),
            }
        }

        info!(timers = self.handles.len(), offset = %self.offset, "Schedule rebuilt");
        self.handles.len()
    }
}
