//! Inbound events delivered by the contact-center platform.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connect::Peer;

/// Platform message kind, carried on the wire as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum MessageType {
    Text,
    CallStartTreatment,
    CallStartNoTreatment,
    File,
    TreatmentStartByUser,
    TreatmentStartBySpecialist,
    TreatmentClose,
    NoFreeSpecialists,
    LineReroutingOtherLine,
    TreatmentCloseActive,
    TreatmentToBot,
    /// Code the bot does not know how to handle.
    Other(i64),
}

impl From<i64> for MessageType {
    fn from(code: i64) -> Self {
        match code {
            1 => Self::Text,
            20 => Self::CallStartTreatment,
            21 => Self::CallStartNoTreatment,
            70 => Self::File,
            80 => Self::TreatmentStartByUser,
            81 => Self::TreatmentStartBySpecialist,
            82 => Self::TreatmentClose,
            83 => Self::NoFreeSpecialists,
            89 => Self::LineReroutingOtherLine,
            90 => Self::TreatmentCloseActive,
            200 => Self::TreatmentToBot,
            other => Self::Other(other),
        }
    }
}

impl From<MessageType> for i64 {
    fn from(kind: MessageType) -> Self {
        match kind {
            MessageType::Text => 1,
            MessageType::CallStartTreatment => 20,
            MessageType::CallStartNoTreatment => 21,
            MessageType::File => 70,
            MessageType::TreatmentStartByUser => 80,
            MessageType::TreatmentStartBySpecialist => 81,
            MessageType::TreatmentClose => 82,
            MessageType::NoFreeSpecialists => 83,
            MessageType::LineReroutingOtherLine => 89,
            MessageType::TreatmentCloseActive => 90,
            MessageType::TreatmentToBot => 200,
            MessageType::Other(code) => code,
        }
    }
}

impl MessageType {
    /// Text or file written by a subscriber.
    #[must_use]
    pub fn is_user_content(self) -> bool {
        matches!(self, Self::Text | Self::File)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default)]
    pub redirect: String,
}

/// One webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub line_id: Uuid,
    pub user_id: Uuid,
    pub message_id: Uuid,
    pub message_type: MessageType,
    /// Author of the message; differs from `user_id` for operator echoes.
    #[serde(default)]
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub message_time: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub data: MessageData,
}

impl InboundMessage {
    #[must_use]
    pub fn peer(&self) -> Peer {
        Peer {
            line_id: self.line_id,
            user_id: self.user_id,
        }
    }

    /// Cache and gate key of the dialogue this message belongs to.
    #[must_use]
    pub fn session_key(&self) -> String {
        session_key(self.user_id, self.line_id)
    }

    /// Text/file content not written by the subscriber (operator echo).
    #[must_use]
    pub fn is_foreign_content(&self) -> bool {
        self.message_type.is_user_content()
            && self.author_id.is_some_and(|author| author != self.user_id)
    }
}

#[must_use]
pub fn session_key(user_id: Uuid, line_id: Uuid) -> String {
    format!("{user_id}:{line_id}")
}
