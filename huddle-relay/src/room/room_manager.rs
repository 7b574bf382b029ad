use crate::room::{Room, RoomCommand};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use huddle_core::RoomId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Creates room actors on demand and hands out their command senders.
/// The entry (and the actor) outlives an emptied membership, so the room
/// record persists for the relay's lifetime.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<String, mpsc::Sender<RoomCommand>>>,
    signaling: Arc<dyn SignalingOutput + Send + Sync>,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput + Send + Sync>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
        }
    }

    pub fn get_room_sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        if let Some(sender) = self.rooms.get(&room_id.0) {
            return sender.clone();
        }

        info!("Creating new room: {}", room_id);
        let (tx, rx) = mpsc::channel(100);

        let room = Room::new(room_id.clone(), rx, self.signaling.clone());
        tokio::spawn(room.run());

        self.rooms.insert(room_id.0.clone(), tx.clone());
        tx
    }
}
