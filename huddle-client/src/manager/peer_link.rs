use crate::link::MediaLink;
use huddle_core::{IceCandidate, ParticipantId};
use std::time::Instant;

/// Which side of a link initiates negotiation. Fixed structurally by the
/// event that created the link: learning of a peer via participant-joined
/// makes us the offerer; the existing-members snapshot or an inbound
/// offer makes us the answerer. The answerer never initiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    Offerer,
    Answerer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Negotiating,
    Connected,
    /// Transport dropped. The link closes when the grace timer carrying
    /// the matching epoch fires, unless the transport recovers first.
    Disconnected { epoch: u64 },
}

/// One mesh edge to a remote connection. Client-local, owned by the
/// manager loop; absent and closed states are absence from the table.
pub struct PeerLink {
    pub role: LinkRole,
    pub state: LinkState,
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub link: Box<dyn MediaLink>,
    pub awaiting_answer: bool,
    pub remote_description_set: bool,
    pub first_seen: Instant,
    pub last_activity: Instant,
    pub disconnect_epoch: u64,
    pending_candidates: Vec<IceCandidate>,
    seen_candidates: Vec<IceCandidate>,
}

impl PeerLink {
    pub fn new(
        role: LinkRole,
        participant_id: ParticipantId,
        display_name: String,
        link: Box<dyn MediaLink>,
    ) -> Self {
        let now = Instant::now();
        Self {
            role,
            state: LinkState::Negotiating,
            participant_id,
            display_name,
            link,
            awaiting_answer: false,
            remote_description_set: false,
            first_seen: now,
            last_activity: now,
            disconnect_epoch: 0,
            pending_candidates: Vec::new(),
            seen_candidates: Vec::new(),
        }
    }

    /// Accept a trickled candidate. Returns it if it can be applied right
    /// away; queues it while the remote description is still missing.
    /// Duplicates are swallowed either way.
    pub fn accept_candidate(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.seen_candidates.contains(&candidate) {
            return None;
        }
        self.seen_candidates.push(candidate.clone());

        if self.remote_description_set {
            Some(candidate)
        } else {
            self.pending_candidates.push(candidate);
            None
        }
    }

    /// Mark the remote description applied and drain the queue in the
    /// order candidates arrived.
    pub fn remote_description_applied(&mut self) -> Vec<IceCandidate> {
        self.remote_description_set = true;
        std::mem::take(&mut self.pending_candidates)
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}
