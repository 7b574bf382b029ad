use crate::model::connection::ConnectionId;
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberInfo {
    pub connection_id: ConnectionId,
    pub participant_id: ParticipantId,
    pub display_name: String,
}
