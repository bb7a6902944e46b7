//! Mailing dispatch: sequential fan-out to a recipient list
//!
//! One messaging session spans the whole mailing. Recipients are delivered
//! strictly in input order with a fixed pacing delay between sends; a
//! failed delivery is recorded and the mailing continues. Only a failure to
//! open the session fails the dispatch itself, before any recipient is
//! attempted.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::flow::Reply;
use crate::prompts;
use crate::sender::{MessagingClient, SendError, SessionError};

/// Error that fails a whole dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to open messaging session: {0}")]
    Session(#[from] SessionError),
}

/// Outcome of one recipient's delivery
#[derive(Debug)]
pub struct Delivery {
    pub recipient: String,
    pub outcome: Result<(), SendError>,
}

/// Record of one completed mailing
#[derive(Debug)]
pub struct MailingReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Per-recipient outcomes, in delivery order
    pub deliveries: Vec<Delivery>,
}

impl MailingReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.deliveries.len() - self.delivered()
    }
}

/// Runs mailings against the messaging client
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn MessagingClient>,
    pacing: Duration,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn MessagingClient>, pacing: Duration) -> Self {
        Self { client, pacing }
    }

    /// Deliver `body` to every recipient, in order, one at a time.
    ///
    /// Progress notices and the final completion notice go out through
    /// `progress` as they happen. The session is released on every path.
    pub async fn dispatch(
        &self,
        operator: &str,
        recipients: &[String],
        body: &str,
        progress: &mpsc::Sender<Reply>,
    ) -> Result<MailingReport, DispatchError> {
        let started_at = Utc::now();
        let mut session = self.client.open_session(operator).await?;

        let mut deliveries = Vec::with_capacity(recipients.len());
        for (index, recipient) in recipients.iter().enumerate() {
            let _ = progress.send(Reply::text(prompts::sending_to(recipient))).await;

            let outcome = session.send(recipient, body).await;
            if let Err(e) = &outcome {
                warn!(%recipient, error = %e, "Delivery failed");
            }
            deliveries.push(Delivery {
                recipient: recipient.clone(),
                outcome,
            });

            // Pace consecutive sends for the network's sake
            if index + 1 < recipients.len() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close messaging session");
        }

        let report = MailingReport {
            id: Uuid::now_v7(),
            started_at,
            deliveries,
        };
        let _ = progress
            .send(Reply::text(prompts::mailing_summary(report.delivered(), report.failed())))
            .await;

        info!(
            mailing = %report.id,
            recipients = recipients.len(),
            delivered = report.delivered(),
            failed = report.failed(),
            "Mailing finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::MessagingSession;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Client that records every call for assertions
    #[derive(Default)]
    struct RecordingClient {
        sent: Arc<Mutex<Vec<String>>>,
        fail_for: HashSet<String>,
        refuse_sessions: bool,
        opened: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    struct RecordingSession {
        sent: Arc<Mutex<Vec<String>>>,
        fail_for: HashSet<String>,
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MessagingClient for RecordingClient {
        async fn open_session(&self, operator: &str) -> Result<Box<dyn MessagingSession>, SessionError> {
            if self.refuse_sessions {
                return Err(SessionError::LoginRequired(operator.to_string()));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(RecordingSession {
                sent: self.sent.clone(),
                fail_for: self.fail_for.clone(),
                closed: self.closed.clone(),
            }))
        }
    }

    #[async_trait]
    impl MessagingSession for RecordingSession {
        async fn send(&mut self, recipient: &str, _body: &str) -> Result<(), SendError> {
            self.sent.lock().unwrap().push(recipient.to_string());
            if self.fail_for.contains(recipient) {
                return Err(SendError::Rejected("recipient unavailable".to_string()));
            }
            Ok(())
        }

        async fn close(self: Box<Self>) -> Result<(), SessionError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn recipients(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn drain(rx: &mut mpsc::Receiver<Reply>) -> Vec<String> {
        let mut texts = Vec::new();
        while let Ok(reply) = rx.try_recv() {
            texts.push(reply.text);
        }
        texts
    }

    #[tokio::test]
    async fn test_delivers_in_order_with_progress_and_summary() {
        let client = Arc::new(RecordingClient::default());
        let sent = client.sent.clone();
        let dispatcher = Dispatcher::new(client, Duration::ZERO);
        let (tx, mut rx) = mpsc::channel(64);

        let report = dispatcher
            .dispatch("op-1", &recipients(&["alice", "bob"]), "hello", &tx)
            .await
            .unwrap();

        assert_eq!(*sent.lock().unwrap(), vec!["alice", "bob"]);
        assert_eq!(report.delivered(), 2);
        assert_eq!(report.failed(), 0);

        let texts = drain(&mut rx);
        assert_eq!(
            texts,
            vec![
                prompts::sending_to("alice"),
                prompts::sending_to("bob"),
                prompts::MAILING_DONE.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_continues_past_failed_recipient() {
        let client = Arc::new(RecordingClient {
            fail_for: HashSet::from(["bob".to_string()]),
            ..Default::default()
        });
        let sent = client.sent.clone();
        let closed = client.closed.clone();
        let dispatcher = Dispatcher::new(client, Duration::ZERO);
        let (tx, mut rx) = mpsc::channel(64);

        let report = dispatcher
            .dispatch("op-1", &recipients(&["alice", "bob", "carol"]), "hello", &tx)
            .await
            .unwrap();

        // All three attempted, in order, despite the middle failure
        assert_eq!(*sent.lock().unwrap(), vec!["alice", "bob", "carol"]);
        assert_eq!(report.delivered(), 2);
        assert_eq!(report.failed(), 1);
        assert!(report.deliveries[1].outcome.is_err());
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        let texts = drain(&mut rx);
        assert!(texts.last().unwrap().contains("failed: 1"));
    }

    #[tokio::test]
    async fn test_session_open_failure_attempts_nothing() {
        let client = Arc::new(RecordingClient {
            refuse_sessions: true,
            ..Default::default()
        });
        let sent = client.sent.clone();
        let opened = client.opened.clone();
        let closed = client.closed.clone();
        let dispatcher = Dispatcher::new(client, Duration::ZERO);
        let (tx, mut rx) = mpsc::channel(64);

        let result = dispatcher
            .dispatch("op-1", &recipients(&["alice", "bob"]), "hello", &tx)
            .await;

        assert!(matches!(
            result,
            Err(DispatchError::Session(SessionError::LoginRequired(_)))
        ));
        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(opened.load(Ordering::SeqCst), 0);
        assert_eq!(closed.load(Ordering::SeqCst), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_recipients_each_get_a_delivery() {
        let client = Arc::new(RecordingClient::default());
        let sent = client.sent.clone();
        let dispatcher = Dispatcher::new(client, Duration::ZERO);
        let (tx, _rx) = mpsc::channel(64);

        let report = dispatcher
            .dispatch("op-1", &recipients(&["alice", "alice"]), "hello", &tx)
            .await
            .unwrap();

        assert_eq!(*sent.lock().unwrap(), vec!["alice", "alice"]);
        assert_eq!(report.delivered(), 2);
    }

    #[tokio::test]
    async fn test_empty_recipient_list_still_summarizes() {
        let client = Arc::new(RecordingClient::default());
        let closed = client.closed.clone();
        let dispatcher = Dispatcher::new(client, Duration::ZERO);
        let (tx, mut rx) = mpsc::channel(64);

        let report = dispatcher.dispatch("op-1", &[], "hello", &tx).await.unwrap();

        assert!(report.deliveries.is_empty());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(drain(&mut rx), vec![prompts::MAILING_DONE.to_string()]);
    }
}
