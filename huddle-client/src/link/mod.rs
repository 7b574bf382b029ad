mod media_link;
mod webrtc_link;

pub use media_link::*;
pub use webrtc_link::*;
