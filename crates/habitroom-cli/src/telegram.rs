//! Telegram Bot API transport.
//!
//! [`TelegramClient`] implements the core [`Notifier`] port over plain
//! HTTPS calls, and [`poll_updates`] long-polls `getUpdates`, turning each
//! update into a [`BotEvent`] on the service queue.

use std::time::Duration;

use async_trait::async_trait;
use habitroom_core::{BotEvent, ClaimControl, MessageHandle, Notifier, NotifyError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

const API_BASE: &str = "https://api.telegram.org";
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T, NotifyError> {
        if !self.ok {
            return Err(NotifyError::Api {
                method: method.to_string(),
                description: self.description.unwrap_or_else(|| "no description".into()),
            });
        }
        self.result.ok_or_else(|| NotifyError::Decode {
            method: method.to_string(),
            message: "missing result".into(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    message: Option<IncomingMessage>,
    #[serde(default)]
    callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    message_id: i64,
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

impl IncomingMessage {
    fn handle(&self) -> MessageHandle {
        MessageHandle {
            chat_id: self.chat.id,
            message_id: self.message_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    from: User,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<IncomingMessage>,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self {
            http: Client::new(),
            base: format!("{API_BASE}/bot{token}"),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<T, NotifyError> {
        let mut request = self.http.post(format!("{}/{method}", self.base)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        // Transport errors can echo the URL, which embeds the token.
        let resp = request
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;
        let envelope: ApiResponse<T> = resp.json().await.map_err(|e| NotifyError::Decode {
            method: method.to_string(),
            message: e.without_url().to_string(),
        })?;
        envelope.into_result(method)
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, NotifyError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        let deadline = Duration::from_secs(timeout_secs + 10);
        self.call("getUpdates", &body, Some(deadline)).await
    }
}

/// Request body for `sendMessage`, with a single inline button if given.
fn send_body(chat_id: i64, text: &str, control: Option<&ClaimControl>) -> Value {
    let mut body = json!({ "chat_id": chat_id, "text": text });
    if let Some(control) = control {
        body["reply_markup"] = json!({
            "inline_keyboard": [[{
                "text": control.label,
                "callback_data": control.action,
            }]]
        });
    }
    body
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        control: Option<&ClaimControl>,
    ) -> Result<MessageHandle, NotifyError> {
        let sent: IncomingMessage = self
            .call("sendMessage", &send_body(chat_id, text, control), None)
            .await?;
        Ok(sent.handle())
    }

    async fn edit_message_text(&self, message: &MessageHandle, text: &str) -> Result<(), NotifyError> {
        let body = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });
        // Result is the edited message or `true`; neither is needed.
        self.call::<Value>("editMessageText", &body, None).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message: &MessageHandle) -> Result<(), NotifyError> {
        let body = json!({ "chat_id": chat_id, "message_id": message.message_id });
        self.call::<bool>("deleteMessage", &body, None).await?;
        Ok(())
    }

    async fn acknowledge_action(&self, action_id: &str, text: Option<&str>) -> Result<(), NotifyError> {
        let mut body = json!({ "callback_query_id": action_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call::<bool>("answerCallbackQuery", &body, None).await?;
        Ok(())
    }
}

/// Translate one update into a service event. Updates the service has no
/// use for (stickers, edits, joins) yield `None`.
pub fn update_to_event(update: Update) -> Option<BotEvent> {
    if let Some(query) = update.callback_query {
        let source = query.message.as_ref().map(IncomingMessage::handle);
        let chat_id = source.as_ref().map_or(query.from.id, |m| m.chat_id);
        let route = query.data.as_deref().and_then(|data| data.parse().ok());
        return Some(BotEvent::Action {
            action_id: query.id,
            chat_id,
            route,
            source,
        });
    }

    let message = update.message?;
    Some(BotEvent::Command {
        chat_id: message.chat.id,
        text: message.text?,
    })
}

/// Feed updates into `queue` until the receiver is dropped. Failures back
/// off exponentially up to a minute.
pub async fn poll_updates(client: TelegramClient, timeout_secs: u64, queue: UnboundedSender<BotEvent>) {
    let mut offset = 0;
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match client.get_updates(offset, timeout_secs).await {
            Ok(updates) => {
                backoff = INITIAL_BACKOFF;
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let Some(event) = update_to_event(update) else {
                        continue;
                    };
                    debug!(?event, "Update received");
                    if queue.send(event).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!("Polling failed, retrying in {}s: {e}", backoff.as_secs());
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habitroom_core::{ActionRoute, WindowKind};

    fn update(value: Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn text_message_becomes_command() {
        let event = update_to_event(update(json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "chat": { "id": 4242, "type": "private" },
                "date": 1_760_000_000,
                "text": "/habits"
            }
        })));
        assert_eq!(
            event,
            Some(BotEvent::Command {
                chat_id: 4242,
                text: "/habits".into()
            })
        );
    }

    #[test]
    fn message_without_text_is_skipped() {
        let event = update_to_event(update(json!({
            "update_id": 11,
            "message": { "message_id": 6, "chat": { "id": 4242 }, "sticker": {} }
        })));
        assert_eq!(event, None);
    }

    #[test]
    fn callback_query_becomes_action() {
        let event = update_to_event(update(json!({
            "update_id": 12,
            "callback_query": {
                "id": "cb-1",
                "from": { "id": 99, "is_bot": false, "first_name": "A" },
                "data": "fallback:wake",
                "message": { "message_id": 7, "chat": { "id": 4242 } }
            }
        })));
        assert_eq!(
            event,
            Some(BotEvent::Action {
                action_id: "cb-1".into(),
                chat_id: 4242,
                route: Some(ActionRoute::new(WindowKind::Fallback, "wake")),
                source: Some(MessageHandle {
                    chat_id: 4242,
                    message_id: 7
                }),
            })
        );
    }

    #[test]
    fn callback_without_message_uses_sender_and_keeps_bad_token() {
        let event = update_to_event(update(json!({
            "update_id": 13,
            "callback_query": { "id": "cb-2", "from": { "id": 4242 }, "data": "garbage" }
        })));
        assert_eq!(
            event,
            Some(BotEvent::Action {
                action_id: "cb-2".into(),
                chat_id: 4242,
                route: None,
                source: None,
            })
        );
    }

    #[test]
    fn send_body_attaches_one_button() {
        let control = ClaimControl {
            label: "Done ✅".into(),
            action: "main:wake".into(),
        };
        let body = send_body(1, "hi", Some(&control));
        assert_eq!(body["reply_markup"]["inline_keyboard"][0][0]["callback_data"], "main:wake");
        assert!(send_body(1, "hi", None).get("reply_markup").is_none());
    }

    #[test]
    fn api_errors_carry_description() {
        let resp: ApiResponse<bool> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message to delete not found"
        }))
        .unwrap();
        let err = resp.into_result("deleteMessage").unwrap_err();
        assert_eq!(
            err.to_string(),
            "deleteMessage rejected: Bad Request: message to delete not found"
        );

        let resp: ApiResponse<bool> = serde_json::from_value(json!({ "ok": true })).unwrap();
        assert!(matches!(
            resp.into_result("deleteMessage"),
            Err(NotifyError::Decode { .. })
        ));
    }
}
