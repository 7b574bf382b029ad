use async_trait::async_trait;
use huddle_core::{ConnectionId, ServerMessage};

/// Outbound seam between room actors and the transport, so actors never
/// touch sockets and tests can capture what a room emits.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send(&self, to: ConnectionId, message: ServerMessage);
}
