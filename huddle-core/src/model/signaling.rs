use crate::model::connection::ConnectionId;
use crate::model::member::MemberInfo;
use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Trickled ICE payload. Compared by value when deduplicating stale
/// re-deliveries on the receiving side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// Client → relay. Directed kinds name their destination connection;
/// the relay never reads past the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinRoom {
        room_id: RoomId,
        participant_id: ParticipantId,
        display_name: String,
    },
    Offer {
        to: ConnectionId,
        sdp: String,
        participant_id: ParticipantId,
        display_name: String,
    },
    Answer {
        to: ConnectionId,
        sdp: String,
    },
    IceCandidate {
        to: ConnectionId,
        candidate: IceCandidate,
    },
    LeaveRoom,
}

/// Relay → client. `from` on forwarded kinds is injected by the relay
/// from the sending channel, never trusted from the sender's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Broadcast to existing members when someone joins. Receivers take
    /// the offerer role toward the new connection.
    ParticipantJoined { member: MemberInfo },
    /// Snapshot unicast to the joiner; the joiner answers and never
    /// spontaneously offers to anyone listed here.
    ExistingMembers { members: Vec<MemberInfo> },
    Offer {
        from: ConnectionId,
        sdp: String,
        participant_id: ParticipantId,
        display_name: String,
    },
    Answer {
        from: ConnectionId,
        sdp: String,
    },
    IceCandidate {
        from: ConnectionId,
        candidate: IceCandidate,
    },
    ParticipantLeft { connection_id: ConnectionId },
}
