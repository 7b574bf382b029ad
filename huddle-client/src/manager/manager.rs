use crate::channel::SignalingChannel;
use crate::error::JoinError;
use crate::link::{LinkEvent, MediaConnector, TransportState};
use crate::manager::command::ManagerCommand;
use crate::manager::peer_link::{LinkRole, LinkState, PeerLink};
use crate::manager::room_event::RoomEvent;
use crate::media::{LocalTrack, MediaSource};
use crate::session::LocalSession;
use huddle_core::{
    ClientMessage, ConnectionId, IceCandidate, MemberInfo, ParticipantId, RoomId, ServerMessage,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct JoinConfig {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    pub display_name: String,
    /// How long a disconnected transport may linger before its link is
    /// closed for good.
    pub disconnect_grace: Duration,
}

impl JoinConfig {
    pub fn new(
        room_id: impl Into<RoomId>,
        participant_id: impl Into<ParticipantId>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            participant_id: participant_id.into(),
            display_name: display_name.into(),
            disconnect_grace: Duration::from_secs(5),
        }
    }
}

/// Control handle for a running manager, held by the call view.
#[derive(Clone)]
pub struct PeerManagerHandle {
    commands: mpsc::Sender<ManagerCommand>,
}

impl PeerManagerHandle {
    pub async fn toggle_audio(&self) {
        let _ = self.commands.send(ManagerCommand::ToggleAudio).await;
    }

    pub async fn toggle_video(&self) {
        let _ = self.commands.send(ManagerCommand::ToggleVideo).await;
    }

    pub async fn add_local_track(&self, track: LocalTrack) {
        let _ = self
            .commands
            .send(ManagerCommand::AddLocalTrack(track))
            .await;
    }

    /// Leave the room. Returns once local tracks are stopped and every
    /// link has been closed.
    pub async fn leave(&self) {
        let (done, finished) = oneshot::channel();
        if self
            .commands
            .send(ManagerCommand::Leave { done })
            .await
            .is_ok()
        {
            let _ = finished.await;
        }
    }
}

/// The per-client connection coordinator: one `PeerLink` per other room
/// member, driven by a single event loop. Nothing mutates the link table
/// but this loop, so there are no locks on link state.
pub struct PeerManager {
    session: LocalSession,
    links: HashMap<ConnectionId, PeerLink>,
    channel: Arc<dyn SignalingChannel>,
    connector: Arc<dyn MediaConnector>,
    server_rx: mpsc::Receiver<ServerMessage>,
    link_events_tx: mpsc::Sender<LinkEvent>,
    link_events_rx: mpsc::Receiver<LinkEvent>,
    command_rx: mpsc::Receiver<ManagerCommand>,
    room_events: mpsc::UnboundedSender<RoomEvent>,
    disconnect_grace: Duration,
}

impl PeerManager {
    /// Acquire local media, announce the join and start the event loop.
    /// Fails as a whole if no media can be acquired or the channel is
    /// already gone; there is no partially-joined state.
    pub async fn join(
        config: JoinConfig,
        media: &dyn MediaSource,
        connector: Arc<dyn MediaConnector>,
        channel: Arc<dyn SignalingChannel>,
        server_rx: mpsc::Receiver<ServerMessage>,
    ) -> Result<(PeerManagerHandle, mpsc::UnboundedReceiver<RoomEvent>), JoinError> {
        let session = LocalSession::acquire(
            media,
            config.participant_id.clone(),
            config.display_name.clone(),
        )
        .await?;

        channel
            .send(ClientMessage::JoinRoom {
                room_id: config.room_id.clone(),
                participant_id: config.participant_id,
                display_name: config.display_name,
            })
            .await?;

        let (link_events_tx, link_events_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (room_events_tx, room_events_rx) = mpsc::unbounded_channel();

        let manager = Self {
            session,
            links: HashMap::new(),
            channel,
            connector,
            server_rx,
            link_events_tx,
            link_events_rx,
            command_rx,
            room_events: room_events_tx,
            disconnect_grace: config.disconnect_grace,
        };

        tokio::spawn(manager.run());

        Ok((PeerManagerHandle { commands: command_tx }, room_events_rx))
    }

    pub async fn run(mut self) {
        info!("Peer manager loop started");

        loop {
            tokio::select! {
                msg = self.server_rx.recv() => match msg {
                    Some(m) => self.handle_server_message(m).await,
                    None => {
                        self.handle_session_loss().await;
                        break;
                    }
                },

                Some(evt) = self.link_events_rx.recv() => {
                    self.handle_link_event(evt).await;
                },

                cmd = self.command_rx.recv() => match cmd {
                    Some(ManagerCommand::Leave { done }) => {
                        self.handle_leave().await;
                        let _ = done.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        // Handle dropped: the view navigated away.
                        self.handle_leave().await;
                        break;
                    }
                },
            }
        }

        info!("Peer manager loop finished");
    }

    async fn handle_server_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::ParticipantJoined { member } => {
                self.handle_participant_joined(member).await;
            }

            ServerMessage::ExistingMembers { members } => {
                // We are the joiner: answerer toward everyone already
                // present, never offering first.
                for member in members {
                    self.ensure_answerer_link(member).await;
                }
            }

            ServerMessage::Offer {
                from,
                sdp,
                participant_id,
                display_name,
            } => {
                self.handle_offer(from, sdp, participant_id, display_name)
                    .await;
            }

            ServerMessage::Answer { from, sdp } => self.handle_answer(from, sdp).await,

            ServerMessage::IceCandidate { from, candidate } => {
                self.handle_ice_candidate(from, candidate).await;
            }

            ServerMessage::ParticipantLeft { connection_id } => {
                info!(%connection_id, "Participant left the room");
                self.close_link(connection_id, true).await;
            }
        }
    }

    /// Someone joined while we were already in the room, so the offerer
    /// role is ours; the joiner waits for this offer.
    async fn handle_participant_joined(&mut self, member: MemberInfo) {
        let conn = member.connection_id;
        if self.links.contains_key(&conn) {
            debug!(%conn, "Ignoring duplicate participant-joined");
            return;
        }

        if self.create_link(member, LinkRole::Offerer).await {
            self.send_offer(conn).await;
        }
    }

    async fn ensure_answerer_link(&mut self, member: MemberInfo) {
        if self.links.contains_key(&member.connection_id) {
            return;
        }
        self.create_link(member, LinkRole::Answerer).await;
    }

    async fn handle_offer(
        &mut self,
        from: ConnectionId,
        sdp: String,
        participant_id: ParticipantId,
        display_name: String,
    ) {
        if !self.links.contains_key(&from) {
            // The offer outran the membership event; create the link on
            // demand rather than erroring.
            let member = MemberInfo {
                connection_id: from,
                participant_id,
                display_name,
            };
            if !self.create_link(member, LinkRole::Answerer).await {
                return;
            }
        }

        if self.links.get(&from).map(|l| l.role) == Some(LinkRole::Offerer) {
            // The tie-break makes simultaneous offers impossible; an
            // offer landing here means the remote is non-conforming.
            warn!(%from, "Offer collided with our offerer role, closing link");
            self.close_link(from, true).await;
            return;
        }

        let applied = match self.links.get_mut(&from) {
            Some(entry) => {
                entry.touch();
                entry.link.apply_remote_offer(sdp).await
            }
            None => return,
        };
        if let Err(e) = applied {
            warn!(%from, "Failed to apply remote offer: {}", e);
            self.close_link(from, true).await;
            return;
        }

        self.flush_candidates(from).await;

        let answer = match self.links.get(&from) {
            Some(entry) => entry.link.create_answer().await,
            None => return,
        };
        match answer {
            Ok(sdp) => {
                let msg = ClientMessage::Answer { to: from, sdp };
                if self.channel.send(msg).await.is_err() {
                    warn!(%from, "Failed to send answer over signaling channel");
                }
            }
            Err(e) => {
                warn!(%from, "Failed to create answer: {}", e);
                self.close_link(from, true).await;
            }
        }
    }

    async fn handle_answer(&mut self, from: ConnectionId, sdp: String) {
        let expected = match self.links.get(&from) {
            // Late responses for links torn down meanwhile are dropped.
            None => {
                debug!(%from, "Dropping answer for untracked connection");
                return;
            }
            Some(entry) => entry.role == LinkRole::Offerer && entry.awaiting_answer,
        };
        if !expected {
            warn!(%from, "Answer with no matching offer, closing link");
            self.close_link(from, true).await;
            return;
        }

        let applied = match self.links.get_mut(&from) {
            Some(entry) => {
                entry.touch();
                entry.awaiting_answer = false;
                entry.link.apply_remote_answer(sdp).await
            }
            None => return,
        };
        match applied {
            Ok(()) => self.flush_candidates(from).await,
            Err(e) => {
                warn!(%from, "Failed to apply answer: {}", e);
                self.close_link(from, true).await;
            }
        }
    }

    async fn handle_ice_candidate(&mut self, from: ConnectionId, candidate: IceCandidate) {
        let Some(entry) = self.links.get_mut(&from) else {
            debug!(%from, "Dropping candidate for untracked connection");
            return;
        };
        entry.touch();

        if let Some(ready) = entry.accept_candidate(candidate) {
            if let Err(e) = entry.link.add_ice_candidate(ready).await {
                // Stale candidates are ignored, not reported.
                debug!(%from, "Ignoring unusable candidate: {}", e);
            }
        }
    }

    /// Apply queued candidates in arrival order once the remote
    /// description is in place. A no-op on renegotiations.
    async fn flush_candidates(&mut self, conn: ConnectionId) {
        let Some(entry) = self.links.get_mut(&conn) else {
            return;
        };
        let drained = entry.remote_description_applied();
        for candidate in drained {
            if let Err(e) = entry.link.add_ice_candidate(candidate).await {
                debug!(%conn, "Ignoring unusable queued candidate: {}", e);
            }
        }
    }

    async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::CandidateGenerated(conn, candidate) => {
                if !self.links.contains_key(&conn) {
                    return;
                }
                let msg = ClientMessage::IceCandidate { to: conn, candidate };
                if self.channel.send(msg).await.is_err() {
                    debug!(%conn, "Candidate not sent, channel closed");
                }
            }

            LinkEvent::TrackReceived(conn, stream) => {
                let Some(entry) = self.links.get_mut(&conn) else {
                    return;
                };
                entry.touch();
                entry.state = LinkState::Connected;
                let _ = self.room_events.send(RoomEvent::RemoteStream {
                    connection_id: conn,
                    stream,
                });
            }

            LinkEvent::StateChanged(conn, state) => self.handle_transport_state(conn, state).await,

            LinkEvent::DisconnectGraceExpired(conn, epoch) => {
                let still_down = self.links.get(&conn).map(|l| l.state)
                    == Some(LinkState::Disconnected { epoch });
                if still_down {
                    warn!(%conn, "Link did not recover within grace period");
                    self.close_link(conn, true).await;
                }
            }
        }
    }

    async fn handle_transport_state(&mut self, conn: ConnectionId, state: TransportState) {
        match state {
            TransportState::Connecting => {
                if let Some(entry) = self.links.get_mut(&conn) {
                    entry.touch();
                }
            }

            TransportState::Active => {
                if let Some(entry) = self.links.get_mut(&conn) {
                    entry.touch();
                    if entry.state != LinkState::Connected {
                        info!(%conn, "Link transport active");
                        entry.state = LinkState::Connected;
                    }
                }
            }

            TransportState::Disconnected => {
                let Some(entry) = self.links.get_mut(&conn) else {
                    return;
                };
                entry.disconnect_epoch += 1;
                let epoch = entry.disconnect_epoch;
                entry.state = LinkState::Disconnected { epoch };
                warn!(%conn, "Link transport disconnected, starting grace timer");

                let tx = self.link_events_tx.clone();
                let grace = self.disconnect_grace;
                tokio::spawn(async move {
                    tokio::time::sleep(grace).await;
                    let _ = tx.send(LinkEvent::DisconnectGraceExpired(conn, epoch)).await;
                });
            }

            TransportState::Failed | TransportState::Closed => {
                info!(%conn, "Link transport terminal: {:?}", state);
                self.close_link(conn, true).await;
            }
        }
    }

    async fn handle_command(&mut self, cmd: ManagerCommand) {
        match cmd {
            ManagerCommand::ToggleAudio => {
                let audio_enabled = self.session.toggle_audio();
                let _ = self.room_events.send(RoomEvent::LocalFlagsChanged {
                    audio_enabled,
                    video_enabled: self.session.video_enabled(),
                });
            }

            ManagerCommand::ToggleVideo => {
                let video_enabled = self.session.toggle_video();
                let _ = self.room_events.send(RoomEvent::LocalFlagsChanged {
                    audio_enabled: self.session.audio_enabled(),
                    video_enabled,
                });
            }

            ManagerCommand::AddLocalTrack(track) => {
                self.session.add_track(track.clone());

                let mut renegotiate = Vec::new();
                for (conn, entry) in self.links.iter() {
                    if let Err(e) = entry.link.attach_track(&track).await {
                        warn!(%conn, "Failed to attach local track: {}", e);
                        continue;
                    }
                    // Only the offerer side may re-open negotiation; the
                    // answerer waits for the remote offer.
                    if entry.role == LinkRole::Offerer {
                        renegotiate.push(*conn);
                    }
                }
                for conn in renegotiate {
                    self.send_offer(conn).await;
                }
            }

            // Leave is consumed by the run loop directly.
            ManagerCommand::Leave { .. } => {}
        }
    }

    async fn create_link(&mut self, member: MemberInfo, role: LinkRole) -> bool {
        let conn = member.connection_id;
        let created = self
            .connector
            .connect(conn, self.session.tracks(), self.link_events_tx.clone())
            .await;

        match created {
            Ok(link) => {
                info!(%conn, participant = %member.participant_id, ?role, "Creating peer link");
                self.links.insert(
                    conn,
                    PeerLink::new(
                        role,
                        member.participant_id.clone(),
                        member.display_name.clone(),
                        link,
                    ),
                );
                let _ = self.room_events.send(RoomEvent::PeerAdded {
                    connection_id: conn,
                    participant_id: member.participant_id,
                    display_name: member.display_name,
                });
                true
            }
            Err(e) => {
                warn!(%conn, "Failed to create media connection: {}", e);
                false
            }
        }
    }

    async fn send_offer(&mut self, to: ConnectionId) {
        let created = match self.links.get(&to) {
            Some(entry) => entry.link.create_offer().await,
            None => return,
        };

        match created {
            Ok(sdp) => {
                if let Some(entry) = self.links.get_mut(&to) {
                    entry.awaiting_answer = true;
                }
                let msg = ClientMessage::Offer {
                    to,
                    sdp,
                    participant_id: self.session.participant_id.clone(),
                    display_name: self.session.display_name.clone(),
                };
                if self.channel.send(msg).await.is_err() {
                    warn!(%to, "Failed to send offer over signaling channel");
                }
            }
            Err(e) => {
                warn!(%to, "Offer creation failed: {}", e);
                self.close_link(to, true).await;
            }
        }
    }

    /// Close one link. Touches nothing but the named entry, so a failure
    /// on one mesh edge never disturbs its siblings.
    async fn close_link(&mut self, conn: ConnectionId, notify: bool) {
        let Some(entry) = self.links.remove(&conn) else {
            return;
        };
        debug!(
            %conn,
            seconds_linked = entry.first_seen.elapsed().as_secs(),
            idle_seconds = entry.last_activity.elapsed().as_secs(),
            "Closing peer link"
        );
        entry.link.close().await;

        if notify {
            let _ = self.room_events.send(RoomEvent::PeerLeft {
                connection_id: conn,
            });
        }
    }

    /// The signaling channel is gone: fail safe to "left".
    async fn handle_session_loss(&mut self) {
        warn!("Signaling channel lost, closing session");

        let ids: Vec<ConnectionId> = self.links.keys().copied().collect();
        for conn in ids {
            self.close_link(conn, true).await;
        }
        self.session.stop();
        let _ = self.room_events.send(RoomEvent::SessionLost);
    }

    async fn handle_leave(&mut self) {
        info!("Leaving room");

        let _ = self.channel.send(ClientMessage::LeaveRoom).await;

        let ids: Vec<ConnectionId> = self.links.keys().copied().collect();
        for conn in ids {
            self.close_link(conn, false).await;
        }
        self.session.stop();
        self.channel.close().await;
    }
}
