use crate::error::LinkError;
use crate::link::media_link::{LinkEvent, MediaConnector, MediaLink, RemoteStream, TransportState};
use crate::media::{LocalTrack, TrackKind};
use async_trait::async_trait;
use huddle_core::{ConnectionId, IceCandidate, IceServerConfig};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

/// Builds `webrtc`-crate peer connections for the manager. ICE servers
/// are external configuration handed in at construction.
pub struct WebRtcConnector {
    ice_servers: Vec<IceServerConfig>,
}

impl WebRtcConnector {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl MediaConnector for WebRtcConnector {
    async fn connect(
        &self,
        remote: ConnectionId,
        tracks: &[LocalTrack],
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn MediaLink>, LinkError> {
        let link = WebRtcLink::new(remote, &self.ice_servers, events).await?;

        for track in tracks {
            link.attach_track(track).await?;
        }

        Ok(Box::new(link))
    }
}

pub struct WebRtcLink {
    remote: ConnectionId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcLink {
    pub async fn new(
        remote: ConnectionId,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Self, LinkError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| LinkError::Setup(e.to_string()))?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| LinkError::Setup(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|s| RTCIceServer {
                    urls: s.urls.clone(),
                    username: s.username.clone().unwrap_or_default(),
                    credential: s.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| LinkError::Setup(e.to_string()))?,
        );

        // Connection-state monitoring. Terminal decisions (grace period,
        // closing) belong to the manager, not this callback.
        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!(%remote, "Peer connection state changed: {:?}", s);
                    let mapped = match s {
                        RTCPeerConnectionState::Connecting => Some(TransportState::Connecting),
                        RTCPeerConnectionState::Connected => Some(TransportState::Active),
                        RTCPeerConnectionState::Disconnected => Some(TransportState::Disconnected),
                        RTCPeerConnectionState::Failed => Some(TransportState::Failed),
                        RTCPeerConnectionState::Closed => Some(TransportState::Closed),
                        _ => None,
                    };
                    if let Some(state) = mapped {
                        let _ = tx.send(LinkEvent::StateChanged(remote, state)).await;
                    }
                })
            },
        ));

        // Trickle ICE: locally gathered candidates go out via signaling.
        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx
                    .send(LinkEvent::CandidateGenerated(remote, candidate))
                    .await;
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    _ => TrackKind::Video,
                };
                debug!(%remote, "Remote {:?} track arrived: {}", kind, track.id());

                let stream = RemoteStream {
                    id: track.stream_id(),
                    kind,
                };
                let _ = tx.send(LinkEvent::TrackReceived(remote, stream)).await;
            })
        }));

        Ok(Self {
            remote,
            peer_connection,
        })
    }
}

#[async_trait]
impl MediaLink for WebRtcLink {
    async fn create_offer(&self) -> Result<String, LinkError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(|e| LinkError::LocalDescription(e.to_string()))?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .map_err(|e| LinkError::LocalDescription(e.to_string()))?;
        Ok(offer.sdp)
    }

    async fn apply_remote_offer(&self, sdp: String) -> Result<(), LinkError> {
        let desc = RTCSessionDescription::offer(sdp)
            .map_err(|e| LinkError::RemoteDescription(e.to_string()))?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| LinkError::RemoteDescription(e.to_string()))
    }

    async fn create_answer(&self) -> Result<String, LinkError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| LinkError::LocalDescription(e.to_string()))?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(|e| LinkError::LocalDescription(e.to_string()))?;
        Ok(answer.sdp)
    }

    async fn apply_remote_answer(&self, sdp: String) -> Result<(), LinkError> {
        let desc = RTCSessionDescription::answer(sdp)
            .map_err(|e| LinkError::RemoteDescription(e.to_string()))?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| LinkError::RemoteDescription(e.to_string()))
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), LinkError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| LinkError::IceCandidate(e.to_string()))
    }

    async fn attach_track(&self, track: &LocalTrack) -> Result<(), LinkError> {
        let Some(source) = track.source() else {
            // Track without a native source (tests, placeholder tracks);
            // nothing to feed the transport with.
            return Ok(());
        };
        self.peer_connection
            .add_track(source.clone())
            .await
            .map(|_| ())
            .map_err(|e| LinkError::Setup(e.to_string()))
    }

    async fn close(&self) {
        debug!(remote = %self.remote, "Closing media connection");
        let _ = self.peer_connection.close().await;
    }
}
