//! StateManager - actor that owns the SessionStore
//!
//! Processes commands via channels for thread-safe access to persistent
//! conversation records. All snapshot writes are globally serialized by
//! actor ownership.

use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use sessionstore::SessionStore;

use crate::flow::Conversation;

use super::messages::{StateCommand, StateError, StateResponse};

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Open the store at the given snapshot path and spawn the actor
    pub fn spawn(snapshot_path: impl AsRef<Path>) -> eyre::Result<Self> {
        let store: SessionStore<Conversation> = SessionStore::open(snapshot_path.as_ref())?;
        info!(
            path = %snapshot_path.as_ref().display(),
            sessions = store.len(),
            "StateManager spawned"
        );

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(store, rx));

        Ok(Self { tx })
    }

    /// Get the record for a conversation key
    pub async fn get(&self, key: &str) -> StateResponse<Option<Conversation>> {
        debug!(%key, "get: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::Get {
                key: key.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)?
    }

    /// Store the record for a conversation key, flushed before this returns
    pub async fn put(&self, key: &str, record: Conversation) -> StateResponse<()> {
        debug!(%key, state = %record.state, "put: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StateCommand::Put {
                key: key.to_string(),
                record,
                reply: reply_tx,
            })
            .await
            .map_err(|_| StateError::ChannelClosed)?;
        reply_rx.await.map_err(|_| StateError::ChannelClosed)?
    }

    /// Shutdown the StateManager
    pub async fn shutdown(&self) -> Result<(), StateError> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelClosed)
    }
}

/// The actor task: owns the store, processes commands until shutdown
async fn actor_loop(mut store: SessionStore<Conversation>, mut rx: mpsc::Receiver<StateCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::Get { key, reply } => {
                let record = store.get(&key).cloned();
                let _ = reply.send(Ok(record));
            }
            StateCommand::Put { key, record, reply } => {
                let result = store.put(key.clone(), record).map_err(|e| {
                    error!(%key, error = %e, "Snapshot write failed");
                    StateError::Store(e.to_string())
                });
                let _ = reply.send(result);
            }
            StateCommand::Shutdown => {
                info!("StateManager shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Stage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let temp = TempDir::new().unwrap();
        let state = StateManager::spawn(temp.path().join("sessions.json")).unwrap();

        assert!(state.get("chat-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let temp = TempDir::new().unwrap();
        let state = StateManager::spawn(temp.path().join("sessions.json")).unwrap();

        let mut record = Conversation::initial();
        record.state = Stage::CollectList;
        state.put("chat-1", record.clone()).await.unwrap();

        assert_eq!(state.get("chat-1").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_records_survive_respawn() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sessions.json");

        let state = StateManager::spawn(&path).unwrap();
        state.put("chat-1", Conversation::initial()).await.unwrap();
        state.shutdown().await.unwrap();

        // Give the actor a moment to drop the store (and its lock)
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let state = StateManager::spawn(&path).unwrap();
        assert_eq!(state.get("chat-1").await.unwrap(), Some(Conversation::initial()));
    }

    #[tokio::test]
    async fn test_failed_put_propagates() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("store");
        let state = StateManager::spawn(dir.join("sessions.json")).unwrap();

        state.put("chat-1", Conversation::initial()).await.unwrap();

        // Remove the backing directory so the next flush fails
        std::fs::remove_dir_all(&dir).unwrap();

        let result = state.put("chat-1", Conversation::initial()).await;
        assert!(matches!(result, Err(StateError::Store(_))));
    }
}
