use crate::error::ChannelError;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Outbound half of the signaling channel. Inbound `ServerMessage`s
/// arrive on the receiver returned at connect time; the receiver closing
/// is the session-loss signal.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    async fn send(&self, message: ClientMessage) -> Result<(), ChannelError>;

    async fn close(&self);
}

/// WebSocket signaling channel to the relay. JSON text frames both ways;
/// per-connection ordering comes from the transport.
pub struct WsChannel {
    out_tx: mpsc::UnboundedSender<Message>,
}

impl WsChannel {
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<ServerMessage>), ChannelError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        info!("Connected to relay at {}", url);

        let (mut write, mut read) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::channel::<ServerMessage>(256);

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if write.send(msg).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = read.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(server_msg) => {
                            if in_tx.send(server_msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid server message: {:?}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            // Dropping in_tx here closes the manager's inbound stream,
            // which it treats as total session loss.
            debug!("Relay socket reader finished");
        });

        Ok((Self { out_tx }, in_rx))
    }
}

#[async_trait]
impl SignalingChannel for WsChannel {
    async fn send(&self, message: ClientMessage) -> Result<(), ChannelError> {
        let json = serde_json::to_string(&message).map_err(|_| ChannelError::Closed)?;
        self.out_tx
            .send(Message::Text(json))
            .map_err(|_| ChannelError::Closed)
    }

    async fn close(&self) {
        let _ = self.out_tx.send(Message::Close(None));
    }
}
