//! Channel-backed service bridge.
//!
//! Cards hold a [`ChannelBridge`]; the host owns the matching
//! [`BridgeReceiver`] and services each [`BridgeRequest`] in its own loop.
//! The channel is unbounded so a card never blocks on the host.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::warn;

use crate::dispatch::DispatchError;
use crate::dispatch::ServiceBridge;
use crate::dispatch::ServiceCall;

pub type BridgeSender = mpsc::UnboundedSender<BridgeRequest>;
pub type BridgeReceiver = mpsc::UnboundedReceiver<BridgeRequest>;

/// A service call waiting for the host, with a reply slot when the caller
/// awaits the outcome.
#[derive(Debug)]
pub struct BridgeRequest {
    pub call: ServiceCall,
    reply: Option<oneshot::Sender<Result<(), String>>>,
}

impl BridgeRequest {
    pub fn expects_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Complete the request. A no-op for fire-and-forget calls or when the
    /// caller has gone away.
    pub fn respond(self, result: Result<(), String>) {
        if let Some(reply) = self.reply {
            let _ = reply.send(result);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelBridge {
    tx: BridgeSender,
}

impl ChannelBridge {
    pub fn new() -> (Self, BridgeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ServiceBridge for ChannelBridge {
    fn fire(&self, call: ServiceCall) {
        let request = BridgeRequest { call, reply: None };
        if let Err(e) = self.tx.send(request) {
            warn!("Dropping {}: service bridge is closed", e.0.call);
        }
    }

    async fn call(&self, call: ServiceCall) -> Result<(), DispatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = BridgeRequest {
            call,
            reply: Some(reply_tx),
        };
        self.tx.send(request).map_err(|_| DispatchError::Closed)?;

        match reply_rx.await {
            Ok(result) => result.map_err(DispatchError::Rejected),
            Err(_) => Err(DispatchError::NoReply),
        }
    }
}
