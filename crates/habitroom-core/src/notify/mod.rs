//! Outbound chat port.
//!
//! The core never talks to a chat API directly. It calls a [`Notifier`]
//! and treats every call as best-effort: failures are logged through
//! [`best_effort`] and never undo a state transition or ledger write.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::NotifyError;

/// Opaque reference to a message the bot sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i64,
}

/// A single inline button attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimControl {
    pub label: String,
    /// Encoded action token delivered back when the button is pressed.
    pub action: String,
}

/// Every chat transport implements this trait.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        control: Option<&ClaimControl>,
    ) -> Result<MessageHandle, NotifyError>;

    async fn edit_message_text(&self, message: &MessageHandle, text: &str) -> Result<(), NotifyError>;

    async fn delete_message(&self, chat_id: i64, message: &MessageHandle) -> Result<(), NotifyError>;

    /// Answer a button press. `action_id` identifies the press, not the task.
    async fn acknowledge_action(&self, action_id: &str, text: Option<&str>) -> Result<(), NotifyError>;
}

/// Category of outbound side effect, used to label swallowed failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    Send,
    Edit,
    Delete,
    Acknowledge,
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SideEffect::Send => "send",
            SideEffect::Edit => "edit",
            SideEffect::Delete => "delete",
            SideEffect::Acknowledge => "acknowledge",
        })
    }
}

/// Await a notifier call, logging and discarding any failure.
pub async fn best_effort<T, F>(effect: SideEffect, call: F) -> Option<T>
where
    F: Future<Output = Result<T, NotifyError>>,
{
    match call.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%effect, "Best-effort chat call failed: {e}");
            None
        }
    }
}
