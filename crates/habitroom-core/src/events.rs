use std::fmt;
use std::str::FromStr;

use crate::notify::MessageHandle;
use crate::scheduler::Job;
use crate::window::WindowKind;

/// Every stimulus the service reacts to. Timers and the chat transport
/// both push these onto one queue; the service drains it one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    /// A registered timer fired.
    Timer(Job),
    /// A button press.
    Action {
        /// Transport id of the press, used to answer it.
        action_id: String,
        chat_id: i64,
        /// `None` when the token did not decode.
        route: Option<ActionRoute>,
        /// Message the button was attached to.
        source: Option<MessageHandle>,
    },
    /// A text message.
    Command { chat_id: i64, text: String },
}

/// Decoded action token: which window of which task is being claimed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionRoute {
    pub verb: WindowKind,
    pub task_id: String,
}

impl ActionRoute {
    pub fn new(verb: WindowKind, task_id: impl Into<String>) -> Self {
        Self {
            verb,
            task_id: task_id.into(),
        }
    }
}

impl fmt::Display for ActionRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.verb, self.task_id)
    }
}

impl FromStr for ActionRoute {
    type Err = ();

    /// `"<verb>:<task id>"`, e.g. `"main:wake"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (verb, task_id) = s.split_once(':').ok_or(())?;
        if task_id.is_empty() {
            return Err(());
        }
        Ok(Self::new(verb.parse()?, task_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_tokens_roundtrip() {
        let route = ActionRoute::new(WindowKind::Fallback, "wake");
        assert_eq!(route.to_string(), "fallback:wake");
        assert_eq!("fallback:wake".parse::<ActionRoute>(), Ok(route));
    }

    #[test]
    fn malformed_tokens_do_not_decode() {
        for bad in ["press", "main:", "late:wake", ":wake", ""] {
            assert!(bad.parse::<ActionRoute>().is_err(), "decoded {bad:?}");
        }
    }
}
