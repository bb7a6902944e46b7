//! In-process gateway over mpsc channels
//!
//! Used by the local chat mode and by tests: inbound events are pushed into
//! one channel, outbound prompts drain from another.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{Gateway, GatewayError, Inbound, Outbound, Outbox};

/// Gateway fed from an mpsc channel
pub struct ChannelGateway {
    rx: mpsc::Receiver<Inbound>,
    outbox: Arc<ChannelOutbox>,
}

/// Outbox that forwards prompts into an mpsc channel
pub struct ChannelOutbox {
    tx: mpsc::Sender<Outbound>,
}

impl ChannelGateway {
    /// Build a gateway plus the handles to drive it: a sender for inbound
    /// events and a receiver for outbound prompts.
    pub fn pair(buffer: usize) -> (Self, mpsc::Sender<Inbound>, mpsc::Receiver<Outbound>) {
        let (in_tx, in_rx) = mpsc::channel(buffer);
        let (out_tx, out_rx) = mpsc::channel(buffer);

        let gateway = Self {
            rx: in_rx,
            outbox: Arc::new(ChannelOutbox { tx: out_tx }),
        };
        (gateway, in_tx, out_rx)
    }
}

#[async_trait]
impl Gateway for ChannelGateway {
    async fn next(&mut self) -> Result<Option<Inbound>, GatewayError> {
        // None once every inbound sender is dropped
        Ok(self.rx.recv().await)
    }

    fn outbox(&self) -> Arc<dyn Outbox> {
        self.outbox.clone()
    }
}

#[async_trait]
impl Outbox for ChannelOutbox {
    async fn deliver(&self, outbound: Outbound) -> Result<(), GatewayError> {
        self.tx.send(outbound).await.map_err(|_| GatewayError::Closed)
    }
}
