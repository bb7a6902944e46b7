//! Dry-run messaging client
//!
//! Accepts every session and delivery without touching the network. Used by
//! the local chat mode so the whole engine can run for real with mailings
//! going nowhere.

use async_trait::async_trait;
use tracing::info;

use super::{MessagingClient, MessagingSession, SendError, SessionError};

/// Client whose sessions log deliveries instead of performing them
#[derive(Debug, Default, Clone)]
pub struct DryRunClient;

impl DryRunClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessagingClient for DryRunClient {
    async fn open_session(&self, operator: &str) -> Result<Box<dyn MessagingSession>, SessionError> {
        info!(%operator, "Dry-run session opened");
        Ok(Box::new(DryRunSession {
            operator: operator.to_string(),
        }))
    }
}

struct DryRunSession {
    operator: String,
}

#[async_trait]
impl MessagingSession for DryRunSession {
    async fn send(&mut self, recipient: &str, body: &str) -> Result<(), SendError> {
        info!(
            operator = %self.operator,
            %recipient,
            bytes = body.len(),
            "Dry-run delivery"
        );
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        info!(operator = %self.operator, "Dry-run session closed");
        Ok(())
    }
}
