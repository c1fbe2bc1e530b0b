//! The event-driven habit service.
//!
//! [`HabitService`] owns all mutable state: the habit configuration, the
//! per-task window machine, the ledger and the schedule binding. It handles
//! one [`BotEvent`] at a time; the caller drains a single queue into
//! [`HabitService::handle`], which is what makes every check-and-set in the
//! window machine race-free.

pub mod messages;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, error, info};

use crate::admin::{self, AdminCommand, HELP};
use crate::error::{CoreError, Result};
use crate::events::{ActionRoute, BotEvent};
use crate::habit::{HabitConfig, Mutation, Task, TimeOfDay};
use crate::notify::{best_effort, ClaimControl, MessageHandle, Notifier, SideEffect};
use crate::scheduler::{Job, ScheduleBinding, TimerPort};
use crate::storage::ledger::date_key;
use crate::storage::{HabitStore, ScoreLedger};
use crate::summary::build_summary;
use crate::window::{
    ClaimDecision, FallbackClosed, MainClosed, WindowKind, WindowMachine, WindowPhase,
};

/// Fixed, process-wide knobs.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub admin_chat_id: i64,
    pub offset: FixedOffset,
    pub summary_include_events: bool,
}

pub struct HabitService<N: Notifier, T: TimerPort> {
    options: ServiceOptions,
    habits: HabitStore,
    config: HabitConfig,
    ledger: ScoreLedger,
    machine: WindowMachine,
    notifier: N,
    schedule: ScheduleBinding<T>,
}

impl<N: Notifier, T: TimerPort> HabitService<N, T> {
    /// Load the habit configuration and assemble the service. Timers are
    /// not registered until [`HabitService::start`].
    pub fn new(
        options: ServiceOptions,
        habits: HabitStore,
        ledger: ScoreLedger,
        notifier: N,
        timers: T,
    ) -> Result<Self> {
        let config = habits.load()?;
        let schedule = ScheduleBinding::new(timers, options.offset);
        Ok(Self {
            options,
            habits,
            config,
            ledger,
            machine: WindowMachine::new(),
            notifier,
            schedule,
        })
    }

    /// Register timers for the loaded configuration.
    pub fn start(&mut self) -> usize {
        self.schedule.rebuild(&self.config)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &HabitConfig {
        &self.config
    }

    pub fn machine(&self) -> &WindowMachine {
        &self.machine
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.options.offset)
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    pub async fn handle(&mut self, event: BotEvent) {
        let now = self.now();
        self.handle_at(event, now).await;
    }

    /// Handle `event` as if the wall clock read `now`.
    pub async fn handle_at(&mut self, event: BotEvent, now: DateTime<FixedOffset>) {
        match event {
            BotEvent::Timer(job) => self.on_timer(job, now).await,
            BotEvent::Action {
                action_id,
                chat_id,
                route,
                source,
            } => self.on_action(&action_id, chat_id, route, source, now).await,
            BotEvent::Command { chat_id, text } => self.on_command(chat_id, &text, now).await,
        }
    }

    async fn on_timer(&mut self, job: Job, now: DateTime<FixedOffset>) {
        let task_id = match &job {
            Job::DailySummary => {
                self.send_summary(now).await;
                return;
            }
            Job::OpenMain(id) | Job::CloseMain(id) | Job::CloseFallback(id) => id,
        };
        let Some(task) = self.config.task(task_id).cloned() else {
            debug!(?job, "Timer for unknown task ignored");
            return;
        };
        match job {
            Job::OpenMain(_) => self.open_main(&task).await,
            Job::CloseMain(_) => self.close_main(&task).await,
            Job::CloseFallback(_) => self.close_fallback(&task).await,
            Job::DailySummary => {}
        }
    }

    // ── Window transitions ───────────────────────────────────────────

    pub async fn open_main(&mut self, task: &Task) {
        self.machine.open_main(&task.id);
        info!(task = %task.id, "Main window opened");

        let control = claim_control(WindowKind::Main, task);
        let sent = best_effort(
            SideEffect::Send,
            self.notifier.send_message(
                self.options.admin_chat_id,
                &messages::main_prompt(task),
                Some(&control),
            ),
        )
        .await;
        if let Some(handle) = sent {
            self.machine.attach_main_message(&task.id, handle);
        }
    }

    pub async fn close_main(&mut self, task: &Task) {
        let stale_main = match self.machine.close_main(&task.id) {
            MainClosed::Claimed => {
                debug!(task = %task.id, "Main window closed after claim");
                return;
            }
            MainClosed::FallbackOpened { stale_main } => stale_main,
        };

        // With `end == fallback_end` both closes share one instant and may
        // arrive in either order, so the miss is final here.
        if !has_fallback_time(task) {
            self.machine.close_fallback(&task.id);
            info!(task = %task.id, "Main window missed, no fallback time");
            if let Some(message) = stale_main {
                self.delete(&message).await;
                self.send(&messages::expired(task)).await;
            }
            return;
        }
        info!(task = %task.id, "Main window missed, fallback opened");

        if let Some(message) = stale_main {
            self.delete(&message).await;
        }
        let control = claim_control(WindowKind::Fallback, task);
        let sent = best_effort(
            SideEffect::Send,
            self.notifier.send_message(
                self.options.admin_chat_id,
                &messages::fallback_prompt(task),
                Some(&control),
            ),
        )
        .await;
        if let Some(handle) = sent {
            self.machine.attach_fallback_message(&task.id, handle);
        }
    }

    pub async fn close_fallback(&mut self, task: &Task) {
        let FallbackClosed::Expired { message } = self.machine.close_fallback(&task.id) else {
            debug!(task = %task.id, "Fallback window closed quietly");
            return;
        };
        info!(task = %task.id, "Fallback window expired");

        self.delete(&message).await;
        self.send(&messages::expired(task)).await;
    }

    // ── Claims ───────────────────────────────────────────────────────

    async fn on_action(
        &mut self,
        action_id: &str,
        chat_id: i64,
        route: Option<ActionRoute>,
        source: Option<MessageHandle>,
        now: DateTime<FixedOffset>,
    ) {
        if chat_id != self.options.admin_chat_id {
            debug!(chat_id, "Button press from non-admin chat ignored");
            self.acknowledge(action_id, None).await;
            return;
        }
        let Some(route) = route else {
            debug!(action_id, "Undecodable action token");
            self.acknowledge(action_id, Some(messages::STALE_ACTION)).await;
            return;
        };
        let Some(task) = self.config.task(&route.task_id).cloned() else {
            debug!(task = %route.task_id, "Action for deleted task ignored");
            self.acknowledge(action_id, None).await;
            return;
        };
        self.claim(&task, route.verb, action_id, source, now).await;
    }

    /// Claim `kind` for `task`. The window machine decides synchronously;
    /// everything after that is bookkeeping and best-effort chat output.
    pub async fn claim(
        &mut self,
        task: &Task,
        kind: WindowKind,
        action_id: &str,
        source: Option<MessageHandle>,
        now: DateTime<FixedOffset>,
    ) {
        let decision = match kind {
            WindowKind::Main => self.machine.claim_main(&task.id),
            WindowKind::Fallback => self.machine.claim_fallback(&task.id),
        };
        let ClaimDecision::Accepted {
            message,
            stale_fallback,
        } = decision
        else {
            debug!(task = %task.id, %kind, "Claim rejected");
            self.acknowledge(action_id, Some(messages::STALE_ACTION)).await;
            return;
        };

        let points = i64::from(match kind {
            WindowKind::Main => task.main_points,
            WindowKind::Fallback => task.fallback_points,
        });
        let total = match self.ledger.record(points, &task.id, &task.name, kind, now) {
            Ok(total) => Some(total),
            Err(e) => {
                error!(task = %task.id, "Failed to persist claim: {e}");
                None
            }
        };
        info!(task = %task.id, %kind, points, ?total, "Claim accepted");

        self.acknowledge(action_id, Some(&format!("+{points}"))).await;
        if let Some(target) = message.or(source) {
            let text = messages::claimed(kind, task, points, total);
            best_effort(SideEffect::Edit, self.notifier.edit_message_text(&target, &text)).await;
        }
        if let Some(stale) = stale_fallback {
            self.delete(&stale).await;
        }
    }

    // ── Admin commands ───────────────────────────────────────────────

    async fn on_command(&mut self, chat_id: i64, text: &str, now: DateTime<FixedOffset>) {
        if chat_id != self.options.admin_chat_id {
            debug!(chat_id, "Message from non-admin chat ignored");
            return;
        }
        let Some(parsed) = AdminCommand::parse(text) else {
            return;
        };
        let reply = match parsed {
            Ok(command) => self.run_command(command, now).await,
            Err(e) => e.to_string(),
        };
        self.send(&reply).await;
    }

    /// Execute an admin command and return the reply text.
    pub async fn run_command(&mut self, command: AdminCommand, now: DateTime<FixedOffset>) -> String {
        match command {
            AdminCommand::Start => format!("{}\n\n{HELP}", messages::GREETING),
            AdminCommand::Help => HELP.to_string(),
            AdminCommand::Habits => admin::render_habits(&self.config),
            AdminCommand::Score => messages::score(self.ledger.query(&date_key(&now)).total),
            AdminCommand::Summary => self.summary_text(now),
            AdminCommand::Mutate(mutation) => match self.apply_mutation(mutation, now).await {
                Ok(reply) => reply,
                Err(CoreError::Validation(e)) => e.to_string(),
                Err(e) => {
                    error!("Failed to save habits: {e}");
                    format!("Could not save habits: {e}")
                }
            },
        }
    }

    /// Validate, persist and schedule a configuration change.
    pub async fn apply_mutation(
        &mut self,
        mutation: Mutation,
        now: DateTime<FixedOffset>,
    ) -> Result<String> {
        self.habits.apply(&mut self.config, mutation.clone())?;

        match &mutation {
            Mutation::Delete { id } => self.machine.forget(id),
            Mutation::Reset => {
                let config = &self.config;
                self.machine.retain(|id| config.task(id).is_some());
            }
            _ => {}
        }

        self.schedule.rebuild(&self.config);
        info!(?mutation, "Habit configuration changed");

        let moved: Vec<Task> = match &mutation {
            Mutation::SetTimes { id, .. } => self.config.task(id).cloned().into_iter().collect(),
            Mutation::Reset => self.config.tasks.clone(),
            _ => Vec::new(),
        };
        for task in &moved {
            self.close_elapsed(task, now).await;
        }

        Ok(admin::confirmation(&mutation, &self.config))
    }

    /// Close windows whose new boundary already passed today. The rebuilt
    /// timers only fire at the next occurrence, which is tomorrow.
    async fn close_elapsed(&mut self, task: &Task, now: DateTime<FixedOffset>) {
        let Ok(window) = task.window() else {
            return;
        };
        let time = TimeOfDay::of(&now);
        if self.machine.phase(&task.id) == WindowPhase::MainOpen && window.end <= time {
            self.close_main(task).await;
        }
        if self.machine.phase(&task.id) == WindowPhase::FallbackOpen && window.fallback_end <= time {
            self.close_fallback(task).await;
        }
    }

    // ── Summary ──────────────────────────────────────────────────────

    fn summary_text(&self, now: DateTime<FixedOffset>) -> String {
        let key = date_key(&now);
        build_summary(
            &key,
            &self.ledger.query(&key),
            self.options.summary_include_events,
        )
    }

    pub async fn send_summary(&mut self, now: DateTime<FixedOffset>) {
        let text = self.summary_text(now);
        info!("Sending daily summary");
        self.send(&text).await;
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn send(&self, text: &str) {
        best_effort(
            SideEffect::Send,
            self.notifier
                .send_message(self.options.admin_chat_id, text, None),
        )
        .await;
    }

    async fn delete(&self, message: &MessageHandle) {
        best_effort(
            SideEffect::Delete,
            self.notifier.delete_message(message.chat_id, message),
        )
        .await;
    }

    async fn acknowledge(&self, action_id: &str, text: Option<&str>) {
        best_effort(
            SideEffect::Acknowledge,
            self.notifier.acknowledge_action(action_id, text),
        )
        .await;
    }
}

fn has_fallback_time(task: &Task) -> bool {
    task.window()
        .map(|window| window.end < window.fallback_end)
        .unwrap_or(true)
}

fn claim_control(kind: WindowKind, task: &Task) -> ClaimControl {
    ClaimControl {
        label: match kind {
            WindowKind::Main => messages::MAIN_BUTTON,
            WindowKind::Fallback => messages::FALLBACK_BUTTON,
        }
        .to_string(),
        action: ActionRoute::new(kind, task.id.clone()).to_string(),
    }
}
