//! Task window state machine.
//!
//! One [`RuntimeState`] per task id, created lazily. Every transition is a
//! synchronous check-and-set; the caller performs the chat side effects the
//! returned outcome asks for. Because the decision is committed before the
//! caller awaits anything, a claim and a close racing for the same task are
//! settled by whichever reaches the machine first.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> MainOpen -> (MainClaimed | FallbackOpen) -> (FallbackClaimed | Expired) -> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut machine = WindowMachine::new();
//! machine.open_main("wake");
//! machine.attach_main_message("wake", handle);
//! match machine.claim_main("wake") { ClaimDecision::Accepted { .. } => {}, _ => {} }
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::notify::MessageHandle;

/// Per-task, per-day window flags and message handles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeState {
    pub main_active: bool,
    pub fallback_active: bool,
    pub main_pressed: bool,
    pub fallback_pressed: bool,
    pub main_message: Option<MessageHandle>,
    pub fallback_message: Option<MessageHandle>,
}

/// Coarse phase derived from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPhase {
    Idle,
    MainOpen,
    MainClaimed,
    FallbackOpen,
    FallbackClaimed,
}

impl RuntimeState {
    pub fn phase(&self) -> WindowPhase {
        if self.main_pressed {
            WindowPhase::MainClaimed
        } else if self.fallback_pressed {
            WindowPhase::FallbackClaimed
        } else if self.main_active {
            WindowPhase::MainOpen
        } else if self.fallback_active {
            WindowPhase::FallbackOpen
        } else {
            WindowPhase::Idle
        }
    }
}

/// Result of a claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimDecision {
    /// Window closed, already claimed, or main already won. Nothing changed.
    Rejected,
    /// Claim committed. `message` is the prompt to edit in place;
    /// `stale_fallback` is a fallback prompt that must be removed.
    Accepted {
        message: Option<MessageHandle>,
        stale_fallback: Option<MessageHandle>,
    },
}

/// Result of closing the main window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainClosed {
    /// Main was claimed; nothing further to do.
    Claimed,
    /// Fallback is now open. `stale_main` is the unclaimed prompt to delete.
    FallbackOpened { stale_main: Option<MessageHandle> },
}

/// Result of closing the fallback window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackClosed {
    Quiet,
    /// The fallback prompt went unanswered and should be replaced by an
    /// expiry notice.
    Expired { message: MessageHandle },
}

/// Runtime state for every task, keyed by task id.
#[derive(Debug, Clone, Default)]
pub struct WindowMachine {
    states: HashMap<String, RuntimeState>,
}

impl WindowMachine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self, task_id: &str) -> Option<&RuntimeState> {
        self.states.get(task_id)
    }

    pub fn phase(&self, task_id: &str) -> WindowPhase {
        self.state(task_id)
            .map(RuntimeState::phase)
            .unwrap_or(WindowPhase::Idle)
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Start a new daily attempt: discard everything from the previous
    /// cycle and open the main window.
    pub fn open_main(&mut self, task_id: &str) {
        let state = self.entry(task_id);
        *state = RuntimeState {
            main_active: true,
            ..RuntimeState::default()
        };
    }

    pub fn attach_main_message(&mut self, task_id: &str, message: MessageHandle) {
        self.entry(task_id).main_message = Some(message);
    }

    pub fn claim_main(&mut self, task_id: &str) -> ClaimDecision {
        let state = self.entry(task_id);
        if !state.main_active || state.main_pressed {
            return ClaimDecision::Rejected;
        }
        state.main_pressed = true;
        state.main_active = false;
        // Disarm fallback for the rest of this cycle.
        state.fallback_active = false;
        ClaimDecision::Accepted {
            message: state.main_message.clone(),
            stale_fallback: state.fallback_message.take(),
        }
    }

    pub fn close_main(&mut self, task_id: &str) -> MainClosed {
        let state = self.entry(task_id);
        state.main_active = false;
        if state.main_pressed {
            return MainClosed::Claimed;
        }
        state.fallback_active = true;
        MainClosed::FallbackOpened {
            stale_main: state.main_message.take(),
        }
    }

    pub fn attach_fallback_message(&mut self, task_id: &str, message: MessageHandle) {
        self.entry(task_id).fallback_message = Some(message);
    }

    pub fn claim_fallback(&mut self, task_id: &str) -> ClaimDecision {
        let state = self.entry(task_id);
        if !state.fallback_active || state.fallback_pressed || state.main_pressed {
            return ClaimDecision::Rejected;
        }
        state.fallback_pressed = true;
        state.fallback_active = false;
        ClaimDecision::Accepted {
            message: state.fallback_message.clone(),
            stale_fallback: None,
        }
    }

    pub fn close_fallback(&mut self, task_id: &str) -> FallbackClosed {
        let state = self.entry(task_id);
        state.fallback_active = false;
        if state.fallback_pressed {
            return FallbackClosed::Quiet;
        }
        match state.fallback_message.take() {
            Some(message) => FallbackClosed::Expired { message },
            None => FallbackClosed::Quiet,
        }
    }

    /// Drop runtime state for a task that no longer exists.
    pub fn forget(&mut self, task_id: &str) {
        self.states.remove(task_id);
    }

    /// Drop runtime state for every task not accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.states.retain(|id, _| keep(id));
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn entry(&mut self, task_id: &str) -> &mut RuntimeState {
        self.states.entry(task_id.to_string()).or_default()
    }
}
