pub mod room;
pub mod signaling;

pub use room::{Room, RoomCommand, RoomManager};
pub use signaling::{AppState, SignalingOutput, SignalingService, ws_handler};
