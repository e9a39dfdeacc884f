//! Telegram Bot API transport: `getMe` handshake, `getUpdates` long polling
//! with offset tracking, `sendMessage` delivery.
//!
//! The bot token is part of every request URL, so transport errors are
//! stripped of their URL before they reach a log line.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::commands::CommandPayload;
use crate::poller::{TransportError, UpdateTransport};
use crate::reply::{ParseMode, Reply};
use crate::updates::{PlainMessageEvent, TelegramEvent, UpdateEnvelope};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

pub struct BotApiTransport {
    client: reqwest::Client,
    bot_base_url: String,
    poll_timeout_secs: u64,
    offset: AtomicI64,
    pending: Mutex<VecDeque<UpdateEnvelope>>,
}

impl BotApiTransport {
    pub fn new(bot_token: &SecretString, poll_timeout_secs: u64) -> Self {
        Self::with_base_url(DEFAULT_API_BASE, bot_token, poll_timeout_secs)
    }

    /// `base_url` override exists for tests pointed at a local stub server.
    pub fn with_base_url(
        base_url: &str,
        bot_token: &SecretString,
        poll_timeout_secs: u64,
    ) -> Self {
        // client timeout must outlast the server-side long-poll window
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            bot_base_url: format!(
                "{}/bot{}",
                base_url.trim_end_matches('/'),
                bot_token.expose_secret()
            ),
            poll_timeout_secs,
            offset: AtomicI64::new(0),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.bot_base_url, method)
    }

    async fn fetch_batch(&self) -> Result<Vec<ApiUpdate>, TransportError> {
        let request = GetUpdatesRequest {
            offset: self.offset.load(Ordering::Acquire),
            timeout: self.poll_timeout_secs,
            allowed_updates: &["message"],
        };

        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&request)
            .send()
            .await
            .map_err(|error| TransportError::Receive(error.without_url().to_string()))?;

        let payload: ApiResponse<Vec<ApiUpdate>> = response
            .json()
            .await
            .map_err(|error| TransportError::Receive(error.without_url().to_string()))?;

        payload.into_result().map_err(TransportError::Receive)
    }
}

#[async_trait]
impl UpdateTransport for BotApiTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|error| TransportError::Connect(error.without_url().to_string()))?;

        let payload: ApiResponse<ApiUser> = response
            .json()
            .await
            .map_err(|error| TransportError::Connect(error.without_url().to_string()))?;

        let me = payload.into_result().map_err(TransportError::Connect)?;
        info!(
            bot_username = me.username.as_deref().unwrap_or("unknown"),
            "authenticated against the bot api"
        );
        Ok(())
    }

    async fn next_update(&self) -> Result<Option<UpdateEnvelope>, TransportError> {
        loop {
            let mut pending = self.pending.lock().await;
            if let Some(envelope) = pending.pop_front() {
                return Ok(Some(envelope));
            }
            drop(pending);

            // an empty batch just means the long-poll window elapsed
            let batch = self.fetch_batch().await?;
            if batch.is_empty() {
                continue;
            }

            let mut pending = self.pending.lock().await;
            for update in batch {
                self.offset.fetch_max(update.update_id + 1, Ordering::AcqRel);
                pending.push_back(classify_update(update));
            }
        }
    }

    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), TransportError> {
        let request = SendMessageRequest { chat_id, text: &reply.text, parse_mode: reply.parse_mode };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(|error| TransportError::Send(error.without_url().to_string()))?;

        let payload: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|error| TransportError::Send(error.without_url().to_string()))?;

        payload.into_result().map(|_| ()).map_err(TransportError::Send)
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        debug!("bot api transport disconnected");
        Ok(())
    }
}

/// Maps one wire update onto the dispatch envelope. Messages with a leading
/// `/` become commands, other text stays plain, everything else (stickers,
/// channel posts, senderless service messages) is unsupported.
fn classify_update(update: ApiUpdate) -> UpdateEnvelope {
    let update_id = update.update_id;

    let event = match update.message {
        Some(message) => match (message.text, message.from) {
            (Some(text), Some(from)) => {
                let display_name = from.first_name;
                if text.trim_start().starts_with('/') {
                    TelegramEvent::Command(CommandPayload {
                        text,
                        chat_id: message.chat.id,
                        user_id: from.id,
                        display_name,
                        request_id: format!("update-{update_id}"),
                    })
                } else {
                    TelegramEvent::PlainMessage(PlainMessageEvent {
                        chat_id: message.chat.id,
                        user_id: from.id,
                        display_name,
                        text,
                    })
                }
            }
            (Some(_), None) => TelegramEvent::Unsupported { kind: "message-without-sender".to_owned() },
            (None, _) => TelegramEvent::Unsupported { kind: "non-text-message".to_owned() },
        },
        None => TelegramEvent::Unsupported { kind: "non-message-update".to_owned() },
    };

    UpdateEnvelope { update_id, event }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, String> {
        if self.ok {
            self.result.ok_or_else(|| "bot api returned ok without a result".to_owned())
        } else {
            Err(self.description.unwrap_or_else(|| "bot api returned ok=false".to_owned()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiUpdate {
    update_id: i64,
    message: Option<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    text: Option<String>,
    chat: ApiChat,
    #[serde(default)]
    from: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: i64,
    first_name: String,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{classify_update, ApiResponse, ApiUpdate, BotApiTransport, SendMessageRequest};
    use crate::reply::{ParseMode, Reply};
    use crate::updates::TelegramEvent;

    fn parse_update(raw: &str) -> ApiUpdate {
        serde_json::from_str(raw).expect("update fixture should deserialize")
    }

    #[test]
    fn command_messages_map_to_command_events() {
        let update = parse_update(
            r#"{
                "update_id": 8001,
                "message": {
                    "message_id": 42,
                    "text": "/roll@CritBot",
                    "chat": {"id": -100500, "type": "group"},
                    "from": {"id": 7, "is_bot": false, "first_name": "Alice", "username": "alice"}
                }
            }"#,
        );

        let envelope = classify_update(update);
        assert_eq!(envelope.update_id, 8001);
        let TelegramEvent::Command(payload) = envelope.event else {
            panic!("expected a command event");
        };
        assert_eq!(payload.text, "/roll@CritBot");
        assert_eq!(payload.chat_id, -100500);
        assert_eq!(payload.user_id, 7);
        assert_eq!(payload.display_name, "Alice");
        assert_eq!(payload.request_id, "update-8001");
    }

    #[test]
    fn ordinary_text_maps_to_a_plain_message_event() {
        let update = parse_update(
            r#"{
                "update_id": 8002,
                "message": {
                    "message_id": 43,
                    "text": "nice roll!",
                    "chat": {"id": 100},
                    "from": {"id": 8, "first_name": "Bob"}
                }
            }"#,
        );

        let TelegramEvent::PlainMessage(event) = classify_update(update).event else {
            panic!("expected a plain message event");
        };
        assert_eq!(event.text, "nice roll!");
        assert_eq!(event.display_name, "Bob");
    }

    #[test]
    fn sticker_and_senderless_updates_are_unsupported() {
        let sticker = parse_update(
            r#"{"update_id": 8003, "message": {"message_id": 44, "chat": {"id": 100}}}"#,
        );
        assert!(matches!(
            classify_update(sticker).event,
            TelegramEvent::Unsupported { ref kind } if kind == "non-text-message"
        ));

        let senderless = parse_update(
            r#"{"update_id": 8004, "message": {"message_id": 45, "text": "/roll", "chat": {"id": 100}}}"#,
        );
        assert!(matches!(
            classify_update(senderless).event,
            TelegramEvent::Unsupported { ref kind } if kind == "message-without-sender"
        ));

        let bare = parse_update(r#"{"update_id": 8005}"#);
        assert!(matches!(
            classify_update(bare).event,
            TelegramEvent::Unsupported { ref kind } if kind == "non-message-update"
        ));
    }

    #[test]
    fn api_error_response_surfaces_the_description() {
        let response: ApiResponse<Vec<ApiUpdate>> = serde_json::from_str(
            r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#,
        )
        .expect("deserialize");

        assert_eq!(response.into_result().expect_err("must fail"), "Unauthorized");
    }

    #[test]
    fn send_message_request_matches_the_wire_shape() {
        let reply = Reply::markdown("Alice, you rolled: *20*");
        let request =
            SendMessageRequest { chat_id: 100, text: &reply.text, parse_mode: reply.parse_mode };
        let wire = serde_json::to_value(&request).expect("serialize");

        assert_eq!(wire["chat_id"], 100);
        assert_eq!(wire["text"], "Alice, you rolled: *20*");
        assert_eq!(wire["parse_mode"], "Markdown");

        let plain = SendMessageRequest { chat_id: 100, text: "hi", parse_mode: None };
        let wire = serde_json::to_value(&plain).expect("serialize");
        assert!(wire.get("parse_mode").is_none());
    }

    #[test]
    fn parse_mode_roundtrips_through_reply_templates() {
        let reply = crate::reply::roll_reply("Alice", 20, "phrase");
        assert_eq!(reply.parse_mode, Some(ParseMode::Markdown));
    }

    #[test]
    fn base_url_trailing_slash_is_tolerated() {
        let token = SecretString::from("42:token".to_owned());
        let transport = BotApiTransport::with_base_url("http://localhost:8081/", &token, 30);
        assert_eq!(transport.method_url("getMe"), "http://localhost:8081/bot42:token/getMe");
    }
}
