use crate::room::room_command::RoomCommand;
use crate::signaling::SignalingOutput;
use huddle_core::{ConnectionId, MemberInfo, RoomId, ServerMessage};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tracing::{debug, info};

struct Membership {
    info: MemberInfo,
    joined_at: SystemTime,
}

/// One actor task per room. Owns the membership table exclusively, so
/// racing joins and disconnects serialize on the command channel and
/// unrelated rooms stay independent.
pub struct Room {
    id: RoomId,
    members: Vec<Membership>,
    created_at: SystemTime,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Room {
    pub fn new(
        id: RoomId,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            id,
            members: Vec::new(),
            created_at: SystemTime::now(),
            command_rx,
            signaling,
        }
    }

    pub async fn run(mut self) {
        info!(room = %self.id, "Room event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        // The manager keeps its sender for the room's lifetime, so this
        // only happens on relay shutdown.
        info!(
            room = %self.id,
            seconds_alive = self.created_at.elapsed().map(|d| d.as_secs()).unwrap_or(0),
            "Room event loop finished"
        );
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { member } => self.handle_join(member).await,

            RoomCommand::Forward { from, to, message } => {
                if !self.is_member(from) {
                    debug!(room = %self.id, %from, "Dropping forward from non-member");
                    return;
                }
                if !self.is_member(to) {
                    // Destination already left; the sender cannot tell
                    // "gone" from "slow", so this is not an error.
                    debug!(room = %self.id, %to, "Dropping forward to departed destination");
                    return;
                }
                self.signaling.send(to, message).await;
            }

            RoomCommand::Leave { connection_id } => {
                let Some(idx) = self
                    .members
                    .iter()
                    .position(|m| m.info.connection_id == connection_id)
                else {
                    // Already removed via the other teardown path.
                    return;
                };
                let removed = self.members.remove(idx);

                info!(
                    room = %self.id,
                    %connection_id,
                    seconds_in_room = removed
                        .joined_at
                        .elapsed()
                        .map(|d| d.as_secs())
                        .unwrap_or(0),
                    "Participant left"
                );
                self.broadcast(ServerMessage::ParticipantLeft { connection_id }, connection_id)
                    .await;
            }
        }
    }

    async fn handle_join(&mut self, member: MemberInfo) {
        info!(
            room = %self.id,
            connection = %member.connection_id,
            participant = %member.participant_id,
            "Participant joining"
        );

        // A rejoin on the same connection replaces the old membership
        // without a participant-left broadcast.
        self.members
            .retain(|m| m.info.connection_id != member.connection_id);

        let existing: Vec<MemberInfo> = self.members.iter().map(|m| m.info.clone()).collect();
        self.signaling
            .send(
                member.connection_id,
                ServerMessage::ExistingMembers { members: existing },
            )
            .await;

        self.broadcast(
            ServerMessage::ParticipantJoined {
                member: member.clone(),
            },
            member.connection_id,
        )
        .await;

        self.members.push(Membership {
            info: member,
            joined_at: SystemTime::now(),
        });
    }

    fn is_member(&self, connection_id: ConnectionId) -> bool {
        self.members
            .iter()
            .any(|m| m.info.connection_id == connection_id)
    }

    async fn broadcast(&self, message: ServerMessage, except: ConnectionId) {
        for m in &self.members {
            if m.info.connection_id != except {
                self.signaling
                    .send(m.info.connection_id, message.clone())
                    .await;
            }
        }
    }
}
