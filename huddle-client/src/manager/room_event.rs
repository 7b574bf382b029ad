use crate::link::RemoteStream;
use huddle_core::{ConnectionId, ParticipantId};

/// What the call view renders from. Emitted in first-seen order by the
/// manager loop, keyed by connection id.
#[derive(Debug)]
pub enum RoomEvent {
    PeerAdded {
        connection_id: ConnectionId,
        participant_id: ParticipantId,
        display_name: String,
    },

    RemoteStream {
        connection_id: ConnectionId,
        stream: RemoteStream,
    },

    PeerLeft {
        connection_id: ConnectionId,
    },

    LocalFlagsChanged {
        audio_enabled: bool,
        video_enabled: bool,
    },

    /// The signaling channel is gone; every link was closed. Resuming
    /// requires an explicit re-join.
    SessionLost,
}
