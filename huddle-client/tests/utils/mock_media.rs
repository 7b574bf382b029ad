use async_trait::async_trait;
use huddle_client::{LocalTrack, MediaConstraints, MediaError, MediaSource, TrackKind};

/// Scripted media source: one audio and one video track, with optional
/// failure modes for the fallback paths.
#[derive(Default)]
pub struct MockMediaSource {
    pub fail_preferred: bool,
    pub fail_all: bool,
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<Vec<LocalTrack>, MediaError> {
        if self.fail_all {
            return Err(MediaError::Acquisition("no device".to_owned()));
        }
        if self.fail_preferred && *constraints == MediaConstraints::preferred() {
            return Err(MediaError::Acquisition("constraints too strict".to_owned()));
        }

        Ok(vec![
            LocalTrack::new("mock-audio", TrackKind::Audio),
            LocalTrack::new("mock-video", TrackKind::Video),
        ])
    }
}
