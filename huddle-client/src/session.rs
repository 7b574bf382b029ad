use crate::error::{JoinError, MediaError};
use crate::media::{LocalTrack, MediaConstraints, MediaSource, TrackKind};
use huddle_core::ParticipantId;
use tracing::{info, warn};

/// The local participant's identity, capture tracks and flag state.
/// Created at join time, destroyed at leave time.
#[derive(Debug)]
pub struct LocalSession {
    pub participant_id: ParticipantId,
    pub display_name: String,
    tracks: Vec<LocalTrack>,
    audio_enabled: bool,
    video_enabled: bool,
}

impl LocalSession {
    /// Acquire local media with preferred constraints, falling back to
    /// minimal ones. If neither succeeds the join fails as a whole.
    pub async fn acquire(
        media: &dyn MediaSource,
        participant_id: ParticipantId,
        display_name: String,
    ) -> Result<Self, JoinError> {
        let tracks = match media.acquire(&MediaConstraints::preferred()).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Preferred media constraints failed ({}), retrying minimal", e);
                media.acquire(&MediaConstraints::minimal()).await?
            }
        };

        if tracks.is_empty() {
            return Err(MediaError::Acquisition("no tracks delivered".to_owned()).into());
        }

        info!(%participant_id, track_count = tracks.len(), "Local media acquired");

        Ok(Self {
            participant_id,
            display_name,
            tracks,
            audio_enabled: true,
            video_enabled: true,
        })
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn add_track(&mut self, track: LocalTrack) {
        let enabled = match track.kind {
            TrackKind::Audio => self.audio_enabled,
            TrackKind::Video => self.video_enabled,
        };
        track.set_enabled(enabled);
        self.tracks.push(track);
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    /// Flips the enabled flag on every audio track. No offer/answer
    /// exchange ever results from this.
    pub fn toggle_audio(&mut self) -> bool {
        self.audio_enabled = !self.audio_enabled;
        self.set_kind_enabled(TrackKind::Audio, self.audio_enabled);
        self.audio_enabled
    }

    pub fn toggle_video(&mut self) -> bool {
        self.video_enabled = !self.video_enabled;
        self.set_kind_enabled(TrackKind::Video, self.video_enabled);
        self.video_enabled
    }

    fn set_kind_enabled(&self, kind: TrackKind, enabled: bool) {
        for track in self.tracks.iter().filter(|t| t.kind == kind) {
            track.set_enabled(enabled);
        }
    }

    pub fn stop(&mut self) {
        for track in &self.tracks {
            track.stop();
        }
        self.tracks.clear();
    }
}
