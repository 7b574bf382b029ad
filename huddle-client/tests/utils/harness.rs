use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::Level;

use huddle_client::{
    JoinConfig, MediaConnector, PeerManager, PeerManagerHandle, RoomEvent, SignalingChannel,
};
use huddle_core::{ClientMessage, ConnectionId, IceCandidate, MemberInfo, ParticipantId, ServerMessage};

use crate::utils::{MockChannel, MockConnector, MockMediaSource};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn member(participant: &str) -> MemberInfo {
    MemberInfo {
        connection_id: ConnectionId::new(),
        participant_id: ParticipantId::from(participant),
        display_name: participant.to_owned(),
    }
}

pub fn candidate(n: u32) -> IceCandidate {
    IceCandidate {
        candidate: format!("candidate:{n} 1 udp 2122260223 192.0.2.{n} 54400 typ host"),
        sdp_mid: Some("0".to_owned()),
        sdp_m_line_index: Some(0),
    }
}

pub async fn recv_wire(rx: &mut mpsc::UnboundedReceiver<ClientMessage>) -> ClientMessage {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("Timed out waiting for an outbound signaling message")
        .expect("Signaling channel closed")
}

pub async fn recv_event(rx: &mut mpsc::UnboundedReceiver<RoomEvent>) -> RoomEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("Timed out waiting for a room event")
        .expect("Room event channel closed")
}

/// Give the manager loop a beat to chew through whatever is queued.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

/// A joined manager plus both ends of everything around it: the fake
/// relay feed, the captured outbound wire and the emitted room events.
pub struct Harness {
    pub server_tx: mpsc::Sender<ServerMessage>,
    pub handle: PeerManagerHandle,
    pub events: mpsc::UnboundedReceiver<RoomEvent>,
    pub wire: mpsc::UnboundedReceiver<ClientMessage>,
    pub channel: Arc<MockChannel>,
    pub connector: Arc<MockConnector>,
}

pub async fn join_room(disconnect_grace: Duration) -> Harness {
    init_tracing();

    let (server_tx, server_rx) = mpsc::channel(64);
    let (channel, mut wire) = MockChannel::new();
    let connector = MockConnector::new();
    let media = MockMediaSource::default();

    let mut config = JoinConfig::new("r1", "alice", "Alice");
    config.disconnect_grace = disconnect_grace;

    let (handle, events) = PeerManager::join(
        config,
        &media,
        connector.clone() as Arc<dyn MediaConnector>,
        channel.clone() as Arc<dyn SignalingChannel>,
        server_rx,
    )
    .await
    .expect("join failed");

    let announced = recv_wire(&mut wire).await;
    assert!(matches!(announced, ClientMessage::JoinRoom { .. }));

    Harness {
        server_tx,
        handle,
        events,
        wire,
        channel,
        connector,
    }
}

pub async fn join_room_default() -> Harness {
    join_room(Duration::from_millis(200)).await
}

impl Harness {
    /// Feed a participant-joined event and consume the resulting
    /// peer-added event and outbound offer. We were here first, so the
    /// manager offers.
    pub async fn peer_joins(&mut self, participant: &str) -> MemberInfo {
        let m = member(participant);
        self.server_tx
            .send(ServerMessage::ParticipantJoined { member: m.clone() })
            .await
            .expect("manager loop is gone");

        match recv_event(&mut self.events).await {
            RoomEvent::PeerAdded { connection_id, .. } => {
                assert_eq!(connection_id, m.connection_id)
            }
            other => panic!("expected peer-added, got {other:?}"),
        }
        match recv_wire(&mut self.wire).await {
            ClientMessage::Offer { to, .. } => assert_eq!(to, m.connection_id),
            other => panic!("expected an offer, got {other:?}"),
        }

        m
    }

    /// Feed a one-member snapshot and consume the peer-added event. The
    /// manager is the joiner here and must wait for the remote offer.
    pub async fn snapshot_peer(&mut self, participant: &str) -> MemberInfo {
        let m = member(participant);
        self.server_tx
            .send(ServerMessage::ExistingMembers {
                members: vec![m.clone()],
            })
            .await
            .expect("manager loop is gone");

        match recv_event(&mut self.events).await {
            RoomEvent::PeerAdded { connection_id, .. } => {
                assert_eq!(connection_id, m.connection_id)
            }
            other => panic!("expected peer-added, got {other:?}"),
        }

        m
    }
}
