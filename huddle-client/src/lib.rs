pub mod channel;
pub mod error;
pub mod link;
pub mod manager;
pub mod media;
pub mod session;

pub use channel::{SignalingChannel, WsChannel};
pub use error::{ChannelError, JoinError, LinkError, MediaError};
pub use link::{LinkEvent, MediaConnector, MediaLink, RemoteStream, TransportState, WebRtcConnector};
pub use manager::{JoinConfig, PeerManager, PeerManagerHandle, RoomEvent};
pub use media::{LocalTrack, MediaConstraints, MediaSource, TrackKind, VideoConstraints};
pub use session::LocalSession;
