use async_trait::async_trait;
use huddle_core::{ConnectionId, ServerMessage};
use huddle_relay::SignalingOutput;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Mock SignalingOutput that captures everything a room emits.
#[derive(Clone)]
pub struct MockSignalingOutput {
    /// Channel to await captured messages on.
    tx: mpsc::UnboundedSender<(ConnectionId, ServerMessage)>,
    /// All captured messages (for verification).
    sent: Arc<Mutex<Vec<(ConnectionId, ServerMessage)>>>,
}

impl MockSignalingOutput {
    pub fn new() -> (
        Self,
        mpsc::UnboundedReceiver<(ConnectionId, ServerMessage)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let output = Self {
            tx,
            sent: Arc::new(Mutex::new(Vec::new())),
        };
        (output, rx)
    }

    pub async fn sent(&self) -> Vec<(ConnectionId, ServerMessage)> {
        self.sent.lock().await.clone()
    }

    /// Everything delivered to one connection, in delivery order.
    pub async fn sent_to(&self, to: &ConnectionId) -> Vec<ServerMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(c, _)| c == to)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send(&self, to: ConnectionId, message: ServerMessage) {
        tracing::debug!("[MockSignaling] send to {}: {:?}", to, message);

        self.sent.lock().await.push((to, message.clone()));
        let _ = self.tx.send((to, message));
    }
}
