//! Shared fixtures: a recording notifier, an in-memory timer port and a
//! service harness rooted in a temporary directory.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use habitroom_core::{
    ActionRoute, BotEvent, ClaimControl, HabitService, HabitStore, Job, MessageHandle, Notifier,
    NotifyError, ScheduleError, ScoreLedger, ServiceOptions, TimerHandle, TimerPort, WindowKind,
};
use tempfile::TempDir;

pub const ADMIN: i64 = 4242;
pub const STRANGER: i64 = 777;

// ============================================================================
// Recording notifier
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send {
        chat_id: i64,
        text: String,
        action: Option<String>,
        handle: MessageHandle,
    },
    Edit {
        message: MessageHandle,
        text: String,
    },
    Delete {
        message: MessageHandle,
    },
    Ack {
        action_id: String,
        text: Option<String>,
    },
}

/// Records every call. While `failing` is set, every call is still
/// recorded but returns a transport error.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<Call>>,
    next_message_id: AtomicI64,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Texts of all plain and button messages sent, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        control: Option<&ClaimControl>,
    ) -> Result<MessageHandle, NotifyError> {
        let handle = MessageHandle {
            chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.record(Call::Send {
            chat_id,
            text: text.to_string(),
            action: control.map(|c| c.action.clone()),
            handle: handle.clone(),
        })?;
        Ok(handle)
    }

    async fn edit_message_text(&self, message: &MessageHandle, text: &str) -> Result<(), NotifyError> {
        self.record(Call::Edit {
            message: message.clone(),
            text: text.to_string(),
        })
    }

    async fn delete_message(&self, _chat_id: i64, message: &MessageHandle) -> Result<(), NotifyError> {
        self.record(Call::Delete {
            message: message.clone(),
        })
    }

    async fn acknowledge_action(&self, action_id: &str, text: Option<&str>) -> Result<(), NotifyError> {
        self.record(Call::Ack {
            action_id: action_id.to_string(),
            text: text.map(str::to_string),
        })
    }
}

// ============================================================================
// In-memory timers
// ============================================================================

pub type Registered = Arc<Mutex<BTreeMap<u64, (String, Job)>>>;

#[derive(Default)]
pub struct FakeTimers {
    registered: Registered,
    next_id: u64,
}

impl TimerPort for FakeTimers {
    fn schedule_recurring(
        &mut self,
        expr: &str,
        _offset: FixedOffset,
        job: Job,
    ) -> Result<TimerHandle, ScheduleError> {
        self.next_id += 1;
        self.registered
            .lock()
            .unwrap()
            .insert(self.next_id, (expr.to_string(), job));
        Ok(TimerHandle(self.next_id))
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.registered.lock().unwrap().remove(&handle.0);
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn offset() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).unwrap()
}

/// 2026-10-19 at `hour:minute` in the service offset.
pub fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    offset()
        .with_ymd_and_hms(2026, 10, 19, hour, minute, 0)
        .unwrap()
}

pub struct Harness {
    pub dir: TempDir,
    pub service: HabitService<RecordingNotifier, FakeTimers>,
    pub timers: Registered,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let timers = FakeTimers::default();
        let registered = timers.registered.clone();
        let options = ServiceOptions {
            admin_chat_id: ADMIN,
            offset: offset(),
            summary_include_events: false,
        };
        let mut service = HabitService::new(
            options,
            HabitStore::in_dir(dir.path()),
            ScoreLedger::in_dir(dir.path()),
            RecordingNotifier::default(),
            timers,
        )
        .unwrap();
        service.start();
        Self {
            dir,
            service,
            timers: registered,
        }
    }

    pub fn notifier(&self) -> &RecordingNotifier {
        self.service.notifier()
    }

    pub async fn fire(&mut self, job: Job, now: DateTime<FixedOffset>) {
        self.service.handle_at(BotEvent::Timer(job), now).await;
    }

    pub async fn press(&mut self, verb: WindowKind, task_id: &str, now: DateTime<FixedOffset>) {
        self.press_from(ADMIN, verb, task_id, now).await;
    }

    pub async fn press_from(
        &mut self,
        chat_id: i64,
        verb: WindowKind,
        task_id: &str,
        now: DateTime<FixedOffset>,
    ) {
        let event = BotEvent::Action {
            action_id: format!("press-{verb}-{task_id}"),
            chat_id,
            route: Some(ActionRoute::new(verb, task_id)),
            source: None,
        };
        self.service.handle_at(event, now).await;
    }

    /// Send `text` from the admin chat and return the bot's replies.
    pub async fn command(&mut self, text: &str) -> Vec<String> {
        self.command_from(ADMIN, text).await
    }

    pub async fn command_from(&mut self, chat_id: i64, text: &str) -> Vec<String> {
        self.send_command(chat_id, text, at(12, 0)).await
    }

    /// Send `text` from the admin chat as if the clock read `now`.
    pub async fn command_at(&mut self, text: &str, now: DateTime<FixedOffset>) -> Vec<String> {
        self.send_command(ADMIN, text, now).await
    }

    async fn send_command(
        &mut self,
        chat_id: i64,
        text: &str,
        now: DateTime<FixedOffset>,
    ) -> Vec<String> {
        self.notifier().clear();
        let event = BotEvent::Command {
            chat_id,
            text: text.to_string(),
        };
        self.service.handle_at(event, now).await;
        self.notifier().sent_texts()
    }

    pub fn total(&self) -> i64 {
        self.service.ledger().query("2026-10-19").total
    }

    pub fn registered_jobs(&self) -> Vec<(String, Job)> {
        self.timers.lock().unwrap().values().cloned().collect()
    }
}
