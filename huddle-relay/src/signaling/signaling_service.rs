use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use huddle_core::{ConnectionId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Registry of live signaling channels, keyed by connection id.
#[derive(Clone, Default)]
pub struct SignalingService {
    connections: Arc<DashMap<ConnectionId, mpsc::UnboundedSender<Message>>>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_connection(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.connections.insert(connection_id, tx);
    }

    pub fn remove_connection(&self, connection_id: &ConnectionId) {
        self.connections.remove(connection_id);
    }

    pub fn send_message(&self, to: ConnectionId, message: &ServerMessage) {
        let Some(conn) = self.connections.get(&to) else {
            debug!(%to, "Dropping message for unregistered connection");
            return;
        };

        match serde_json::to_string(message) {
            Ok(json) => {
                if conn.send(Message::Text(json.into())).is_err() {
                    debug!(%to, "Connection send task already gone");
                }
            }
            Err(e) => error!("Failed to serialize server message: {}", e),
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send(&self, to: ConnectionId, message: ServerMessage) {
        self.send_message(to, &message);
    }
}
