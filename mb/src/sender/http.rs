//! HTTP implementation of the messaging client
//!
//! Talks to a relay service that owns the actual network accounts:
//! sessions are opened per operator, messages are posted within a session,
//! and the session is deleted on close.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::SenderConfig;

use super::{MessagingClient, MessagingSession, SendError, SessionError};

/// Client for the messaging relay
pub struct HttpMessagingClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SessionOpened {
    session_id: String,
}

impl HttpMessagingClient {
    /// Create a client from configuration
    pub fn from_config(config: &SenderConfig) -> Result<Self, SessionError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MessagingClient for HttpMessagingClient {
    async fn open_session(&self, operator: &str) -> Result<Box<dyn MessagingSession>, SessionError> {
        let url = format!("{}/v1/sessions", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "operator": operator }))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SessionError::LoginRequired(operator.to_string()));
            }
            status if !status.is_success() => {
                return Err(SessionError::Api {
                    code: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                });
            }
            _ => {}
        }

        let opened: SessionOpened = response.json().await?;
        debug!(%operator, session = %opened.session_id, "Messaging session opened");

        Ok(Box::new(HttpMessagingSession {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            session_id: opened.session_id,
        }))
    }
}

/// One open relay session
pub struct HttpMessagingSession {
    http: Client,
    base_url: String,
    session_id: String,
}

#[async_trait]
impl MessagingSession for HttpMessagingSession {
    async fn send(&mut self, recipient: &str, body: &str) -> Result<(), SendError> {
        let url = format!("{}/v1/sessions/{}/messages", self.base_url, self.session_id);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "recipient": recipient, "body": body }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(SendError::Rejected(format!("{}: {}", status, message)));
        }

        debug!(%recipient, session = %self.session_id, "Message delivered");
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        let url = format!("{}/v1/sessions/{}", self.base_url, self.session_id);
        let response = self.http.delete(&url).send().await?;

        if !response.status().is_success() {
            return Err(SessionError::Api {
                code: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        debug!(session = %self.session_id, "Messaging session closed");
        Ok(())
    }
}
