use crate::error::MediaError;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webrtc::track::track_local::TrackLocal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub ideal_frame_rate: u32,
}

/// Capture constraints handed to the media source. `preferred` asks for
/// the full set; `minimal` is the fallback when a device cannot satisfy
/// it. If both fail, the join fails.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: Option<VideoConstraints>,
}

impl MediaConstraints {
    pub fn preferred() -> Self {
        Self {
            audio: true,
            video: Some(VideoConstraints {
                ideal_width: 1280,
                ideal_height: 720,
                ideal_frame_rate: 30,
            }),
        }
    }

    pub fn minimal() -> Self {
        Self {
            audio: true,
            video: Some(VideoConstraints {
                ideal_width: 0,
                ideal_height: 0,
                ideal_frame_rate: 0,
            }),
        }
    }
}

/// A local capture track. The enabled flag is shared with whatever feeds
/// the track, so muting is a flag flip and never a renegotiation.
#[derive(Clone)]
pub struct LocalTrack {
    pub id: String,
    pub kind: TrackKind,
    enabled: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    source: Option<Arc<dyn TrackLocal + Send + Sync>>,
}

impl LocalTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(AtomicBool::new(false)),
            source: None,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn source(&self) -> Option<&Arc<dyn TrackLocal + Send + Sync>> {
        self.source.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// External collaborator: obtains local capture tracks. The production
/// implementation lives with the embedding application; tests script one.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<Vec<LocalTrack>, MediaError>;
}
