//! # Habitroom Core Library
//!
//! Core logic for Habitroom, a single-user habit tracker driven through a
//! chat bot. Every day each habit opens a short main window; claiming it
//! earns the main points. A missed main window is followed by a fallback
//! window worth fewer points. Claims are written to a daily score ledger and
//! a summary is sent once a day.
//!
//! ## Architecture
//!
//! - **Window machine**: a per-task state machine deciding synchronously
//!   whether a claim is accepted
//! - **Storage**: JSON habit configuration and score ledger, TOML settings
//! - **Scheduler**: daily cron timers rebuilt on every configuration change
//! - **Service**: a single-consumer event loop tying the pieces together and
//!   talking to the chat transport through the [`Notifier`] port
//!
//! ## Key Components
//!
//! - [`HabitService`]: event handler owning all mutable state
//! - [`WindowMachine`]: claim and close transitions
//! - [`ScoreLedger`]: append-only daily points
//! - [`HabitStore`]: validated configuration persistence

pub mod admin;
pub mod error;
pub mod events;
pub mod habit;
pub mod notify;
pub mod scheduler;
pub mod service;
pub mod storage;
pub mod summary;
pub mod window;

pub use admin::AdminCommand;
pub use error::{ConfigError, CoreError, NotifyError, ScheduleError, ValidationError};
pub use events::{ActionRoute, BotEvent};
pub use habit::{HabitConfig, Mutation, Task, TimeOfDay};
pub use notify::{ClaimControl, MessageHandle, Notifier};
pub use scheduler::{CronTimerPort, Job, ScheduleBinding, TimerHandle, TimerPort};
pub use service::{HabitService, ServiceOptions};
pub use storage::{DayRecord, HabitStore, LedgerEvent, ScoreLedger, Settings};
pub use window::{WindowKind, WindowMachine, WindowPhase};
