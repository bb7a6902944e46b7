//! Mailbot - conversational broadcast mailings
//!
//! An operator chats with the bot to assemble a mailing: a recipient list
//! (one identifier per line, reusable across mailings) and a message body,
//! confirmed before sending. The mailing then fans out through a messaging
//! relay, one recipient at a time.
//!
//! # Core Guarantees
//!
//! - **Durable Conversations**: every record mutation is flushed to the
//!   session snapshot before its replies are sent, so a restart resumes
//!   exactly where the operator left off
//! - **Sequential Per Chat**: events for one conversation are processed
//!   strictly in order; different conversations run concurrently
//! - **At Most One Mailing**: the send transition is committed before the
//!   mailing runs, so a crash mid-mailing never re-offers the same send
//!
//! # Modules
//!
//! - [`flow`] - the conversation state machine (pure step function)
//! - [`state`] - actor owning the durable session store
//! - [`dispatch`] - sequential mailing fan-out
//! - [`engine`] - per-conversation event routing
//! - [`gateway`] - transport seam and the Telegram Bot API implementation
//! - [`sender`] - recipient-messaging client seam
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod flow;
pub mod gateway;
pub mod prompts;
pub mod repl;
pub mod sender;
pub mod state;

// Re-export commonly used types
pub use config::{Config, SenderConfig, StorageConfig, TelegramConfig};
pub use dispatch::{Delivery, DispatchError, Dispatcher, MailingReport};
pub use engine::{Context, Engine};
pub use flow::{Conversation, MailingRequest, Reply, Stage, Step};
pub use gateway::{ChannelGateway, Gateway, GatewayError, Inbound, Outbound, Outbox, TelegramGateway};
pub use sender::{DryRunClient, HttpMessagingClient, MessagingClient, MessagingSession, SendError, SessionError};
pub use state::{StateError, StateManager, StateResponse};
