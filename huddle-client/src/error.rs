use thiserror::Error;

/// Why a join never happened. A join either completes fully or not at
/// all; there is no partially-joined state to clean up.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("no usable media device: {0}")]
    MediaUnavailable(#[from] MediaError),

    #[error("signaling channel failed: {0}")]
    Channel(#[from] ChannelError),
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media acquisition failed: {0}")]
    Acquisition(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to connect to relay: {0}")]
    Connect(String),

    #[error("signaling channel closed")]
    Closed,
}

/// Per-link negotiation failures. Never fatal to the process; the
/// manager closes the affected link and leaves its siblings alone.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to create media connection: {0}")]
    Setup(String),

    #[error("failed to apply remote description: {0}")]
    RemoteDescription(String),

    #[error("failed to produce local description: {0}")]
    LocalDescription(String),

    #[error("failed to add ice candidate: {0}")]
    IceCandidate(String),
}
