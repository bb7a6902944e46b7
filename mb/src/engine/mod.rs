//! Event routing: one sequential worker per conversation
//!
//! The engine pulls inbound events from the gateway and fans them out to
//! per-conversation workers over channels. Events for one conversation are
//! processed strictly in order; different conversations run concurrently.
//! All collaborators travel in an explicit `Context` - no globals.

mod worker;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::gateway::{Gateway, Inbound, Outbox};
use crate::state::StateManager;

/// How long to back off after a failed gateway poll
const POLL_RETRY: Duration = Duration::from_secs(1);

/// Per-worker event queue depth
const WORKER_QUEUE: usize = 32;

/// Collaborators handed to every worker
pub struct Context {
    pub state: StateManager,
    pub dispatcher: Dispatcher,
    pub outbox: Arc<dyn Outbox>,
}

/// The event router
pub struct Engine {
    state: StateManager,
    dispatcher: Dispatcher,
}

impl Engine {
    pub fn new(state: StateManager, dispatcher: Dispatcher) -> Self {
        Self { state, dispatcher }
    }

    /// Run until the gateway's inbound stream ends, then drain the workers.
    pub async fn run<G: Gateway>(self, mut gateway: G) -> eyre::Result<()> {
        let ctx = Arc::new(Context {
            state: self.state,
            dispatcher: self.dispatcher,
            outbox: gateway.outbox(),
        });

        let mut workers: HashMap<String, mpsc::Sender<Inbound>> = HashMap::new();
        let mut tasks = JoinSet::new();

        info!("Engine started");

        loop {
            match gateway.next().await {
                Ok(Some(event)) => {
                    let tx = match workers.get(&event.chat) {
                        Some(tx) if !tx.is_closed() => tx.clone(),
                        _ => {
                            debug!(chat = %event.chat, "Spawning conversation worker");
                            let (tx, rx) = mpsc::channel(WORKER_QUEUE);
                            tasks.spawn(worker::run(event.chat.clone(), rx, ctx.clone()));
                            workers.insert(event.chat.clone(), tx.clone());
                            tx
                        }
                    };

                    if tx.send(event).await.is_err() {
                        warn!("Conversation worker dropped its queue");
                    }
                }
                Ok(None) => {
                    info!("Inbound stream ended");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Gateway poll failed, retrying");
                    tokio::time::sleep(POLL_RETRY).await;
                }
            }
        }

        // Close worker queues and let in-flight events finish
        drop(workers);
        while tasks.join_next().await.is_some() {}

        info!("Engine stopped");
        Ok(())
    }
}
