use crate::error::LinkError;
use crate::media::{LocalTrack, TrackKind};
use async_trait::async_trait;
use huddle_core::{ConnectionId, IceCandidate};
use tokio::sync::mpsc;

/// Coarse transport states reported by a media link. `Active` means
/// media is flowing; `Disconnected` may recover within the grace period,
/// `Failed` and `Closed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Active,
    Disconnected,
    Failed,
    Closed,
}

/// Handle to a remote participant's media, published to the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub id: String,
    pub kind: TrackKind,
}

/// Events a media link feeds back into the manager loop. Link callbacks
/// never touch the link table themselves; every mutation goes through
/// the single dispatch in the manager.
#[derive(Debug)]
pub enum LinkEvent {
    CandidateGenerated(ConnectionId, IceCandidate),
    TrackReceived(ConnectionId, RemoteStream),
    StateChanged(ConnectionId, TransportState),
    /// Internal: a disconnect grace timer fired. Epoch-tagged so a link
    /// that recovered (or re-disconnected) ignores stale timers.
    DisconnectGraceExpired(ConnectionId, u64),
}

/// One secure media connection to one remote participant.
#[async_trait]
pub trait MediaLink: Send + Sync {
    async fn create_offer(&self) -> Result<String, LinkError>;

    async fn apply_remote_offer(&self, sdp: String) -> Result<(), LinkError>;

    async fn create_answer(&self) -> Result<String, LinkError>;

    async fn apply_remote_answer(&self, sdp: String) -> Result<(), LinkError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), LinkError>;

    /// Attach a local track added after link creation. Whether this
    /// results in a renegotiation offer is the manager's decision.
    async fn attach_track(&self, track: &LocalTrack) -> Result<(), LinkError>;

    async fn close(&self);
}

/// Factory seam: builds one `MediaLink` per remote connection with the
/// manager's event sender wired into its callbacks.
#[async_trait]
pub trait MediaConnector: Send + Sync {
    async fn connect(
        &self,
        remote: ConnectionId,
        tracks: &[LocalTrack],
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn MediaLink>, LinkError>;
}
