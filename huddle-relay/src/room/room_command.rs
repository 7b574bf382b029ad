use huddle_core::{ConnectionId, MemberInfo, ServerMessage};

/// Commands arriving at a room actor from the signaling layer.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        member: MemberInfo,
    },

    /// The relay never reads past the destination; `from` is only
    /// checked for membership.
    Forward {
        from: ConnectionId,
        to: ConnectionId,
        message: ServerMessage,
    },

    Leave {
        connection_id: ConnectionId,
    },
}
