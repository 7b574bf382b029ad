mod command;
mod manager;
mod peer_link;
mod room_event;

pub use command::*;
pub use manager::*;
pub use peer_link::*;
pub use room_event::*;
