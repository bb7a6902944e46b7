//! Telegram Bot API gateway
//!
//! Long-polls `getUpdates` for inbound messages and sends prompts with
//! `sendMessage`. Replies carrying quick-reply options are rendered as a
//! one-row reply keyboard; plain replies remove any keyboard.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TelegramConfig;

use super::{Gateway, GatewayError, Inbound, Outbound, Outbox};

/// Shared HTTP side of the gateway: client plus the token-scoped base URL
#[derive(Clone)]
struct TelegramApi {
    http: Client,
    base_url: String,
}

impl TelegramApi {
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, GatewayError> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self.http.post(&url).json(&body).send().await?;
        let envelope: ApiEnvelope<T> = response.json().await?;

        if !envelope.ok {
            return Err(GatewayError::Api {
                code: envelope.error_code.unwrap_or(0),
                message: envelope.description.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        envelope.result.ok_or(GatewayError::Api {
            code: 0,
            message: "missing result".to_string(),
        })
    }
}

/// Long-polling gateway over the Telegram Bot API
pub struct TelegramGateway {
    api: TelegramApi,
    /// Next update offset to request
    offset: i64,
    /// Updates already fetched but not yet handed to the engine
    pending: VecDeque<Inbound>,
    poll_timeout_secs: u64,
}

impl TelegramGateway {
    /// Create a gateway from configuration.
    ///
    /// The bot token is read from the environment variable named in config.
    pub fn from_config(config: &TelegramConfig) -> Result<Self, GatewayError> {
        let token = std::env::var(&config.token_env)
            .map_err(|_| GatewayError::Auth(format!("environment variable {} is not set", config.token_env)))?;

        // The HTTP timeout must outlast the long-poll window
        let http = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()?;

        Ok(Self {
            api: TelegramApi {
                http,
                base_url: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token),
            },
            offset: 0,
            pending: VecDeque::new(),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    async fn fetch_updates(&mut self) -> Result<(), GatewayError> {
        let updates: Vec<TgUpdate> = self
            .api
            .call(
                "getUpdates",
                serde_json::json!({
                    "offset": self.offset,
                    "timeout": self.poll_timeout_secs,
                    "allowed_updates": ["message"],
                }),
            )
            .await?;

        debug!(count = updates.len(), "Fetched updates");
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);
            if let Some(message) = update.message {
                self.pending.push_back(inbound_from(message));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn next(&mut self) -> Result<Option<Inbound>, GatewayError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            self.fetch_updates().await?;
        }
    }

    fn outbox(&self) -> Arc<dyn Outbox> {
        Arc::new(TelegramOutbox { api: self.api.clone() })
    }
}

/// Outbound half of the Telegram gateway
pub struct TelegramOutbox {
    api: TelegramApi,
}

#[async_trait]
impl Outbox for TelegramOutbox {
    async fn deliver(&self, outbound: Outbound) -> Result<(), GatewayError> {
        let body = serde_json::json!({
            "chat_id": chat_id_value(&outbound.chat),
            "text": outbound.reply.text,
            "reply_markup": reply_markup(&outbound.reply.options),
        });

        let message: serde_json::Value = self.api.call("sendMessage", body).await?;
        debug!(chat = %outbound.chat, message_id = ?message.get("message_id"), "Sent message");
        Ok(())
    }
}

/// Map an inbound Telegram message to a gateway event.
///
/// A message with no `from` user yields an unresolved operator; the router
/// turns that into a reset rather than an error.
fn inbound_from(message: TgMessage) -> Inbound {
    if message.from.is_none() {
        warn!(chat = message.chat.id, "Message without a sender");
    }
    Inbound {
        chat: message.chat.id.to_string(),
        operator: message.from.map(|user| user.id.to_string()),
        text: message.text,
    }
}

/// Chat ids are numeric for private chats; anything else passes through as
/// a string (channel usernames).
fn chat_id_value(chat: &str) -> serde_json::Value {
    match chat.parse::<i64>() {
        Ok(id) => serde_json::Value::from(id),
        Err(_) => serde_json::Value::from(chat),
    }
}

/// One-row reply keyboard for option replies, keyboard removal otherwise
fn reply_markup(options: &[String]) -> serde_json::Value {
    if options.is_empty() {
        serde_json::json!({ "remove_keyboard": true })
    } else {
        let row: Vec<_> = options.iter().map(|o| serde_json::json!({ "text": o })).collect();
        serde_json::json!({
            "keyboard": [row],
            "resize_keyboard": true,
        })
    }
}

// Telegram API wire types

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TgUpdate {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    chat: TgChat,
    from: Option<TgUser>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
}
