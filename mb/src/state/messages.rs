//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::flow::Conversation;

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    /// The snapshot write failed; the transition is not committed
    #[error("Store error: {0}")]
    Store(String),

    #[error("State manager channel closed")]
    ChannelClosed,
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    Get {
        key: String,
        reply: oneshot::Sender<StateResponse<Option<Conversation>>>,
    },
    Put {
        key: String,
        record: Conversation,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    Shutdown,
}
