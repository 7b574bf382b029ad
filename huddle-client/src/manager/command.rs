use crate::media::LocalTrack;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum ManagerCommand {
    ToggleAudio,

    ToggleVideo,

    /// A capture track added mid-call (e.g. screen share). Attached to
    /// every link; only offerer links renegotiate.
    AddLocalTrack(LocalTrack),

    /// `done` fires after tracks are stopped and all links are closed,
    /// so the caller can block on completion.
    Leave { done: oneshot::Sender<()> },
}
