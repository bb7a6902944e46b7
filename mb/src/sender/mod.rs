//! Recipient-messaging client: delivers the mailing body to recipients
//!
//! A mailing runs inside one session scoped to the whole dispatch call.
//! Opening a session can fail on its own (the relay may require an
//! out-of-band interactive login the first time an operator identity is
//! used); that failure is fatal for the dispatch. Individual deliveries
//! fail per-recipient without ending the session.

pub mod dry_run;
pub mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use dry_run::DryRunClient;
pub use http::HttpMessagingClient;

/// Errors opening or closing a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operator identity has no stored login; an interactive login is
    /// required out of band before mailings can run
    #[error("Interactive login required for operator {0}")]
    LoginRequired(String),

    #[error("Messaging API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Errors delivering to a single recipient
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Client that can open messaging sessions for an operator identity
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn open_session(&self, operator: &str) -> Result<Box<dyn MessagingSession>, SessionError>;
}

/// One open messaging session, released with `close`
#[async_trait]
pub trait MessagingSession: Send {
    /// Deliver the body to one recipient. A failure is scoped to that
    /// recipient; the session stays usable.
    async fn send(&mut self, recipient: &str, body: &str) -> Result<(), SendError>;

    /// Release the session. Must be called on every path out of a dispatch.
    async fn close(self: Box<Self>) -> Result<(), SessionError>;
}
