mod connection;
mod member;
mod participant;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use member::MemberInfo;
pub use participant::ParticipantId;
pub use room::RoomId;
pub use signaling::{ClientMessage, IceCandidate, IceServerConfig, ServerMessage};
