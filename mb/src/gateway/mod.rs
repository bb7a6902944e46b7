//! Message-transport gateway: inbound operator events, outbound prompts
//!
//! The engine only needs "receive text from an identity" and "send text to
//! an identity"; everything transport-specific lives behind the `Gateway`
//! and `Outbox` traits. The Telegram implementation long-polls the Bot API;
//! the channel implementation backs the local chat mode and tests.

pub mod channel;
pub mod telegram;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::flow::Reply;

pub use channel::{ChannelGateway, ChannelOutbox};
pub use telegram::TelegramGateway;

/// Errors from the transport
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Transport API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Transport not configured: {0}")]
    Auth(String),

    #[error("Transport channel closed")]
    Closed,
}

/// One inbound event from the transport.
///
/// `operator` is the resolved sender identity; `None` means the transport
/// could not resolve who sent the event, which is a routine outcome the
/// router handles (reset), not an error. `text` is `None` for non-text
/// payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Conversation key and reply target
    pub chat: String,
    pub operator: Option<String>,
    pub text: Option<String>,
}

/// One outbound prompt for a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub chat: String,
    pub reply: Reply,
}

/// Source of inbound events
#[async_trait]
pub trait Gateway: Send {
    /// Wait for the next inbound event. `Ok(None)` means the stream ended
    /// and the engine should shut down.
    async fn next(&mut self) -> Result<Option<Inbound>, GatewayError>;

    /// A cloneable handle for delivering outbound prompts.
    fn outbox(&self) -> Arc<dyn Outbox>;
}

/// Sink for outbound prompts
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn deliver(&self, outbound: Outbound) -> Result<(), GatewayError>;
}
