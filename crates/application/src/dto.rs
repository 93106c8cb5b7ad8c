use domain::{Message, MessageId, MessageKind, Participant};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 消息展示时间格式，例如 `14:03:27`
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub name: String,
    /// 毫秒时间戳
    pub last_seen: i64,
}

impl From<&Participant> for ParticipantDto {
    fn from(participant: &Participant) -> Self {
        Self {
            name: participant.name.as_str().to_owned(),
            last_seen: participant.last_seen.timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub time: String,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: Uuid::from(message.id),
            from: message.from.as_str().to_owned(),
            to: message.to.as_str().to_owned(),
            text: message.text.as_str().to_owned(),
            kind: message.kind,
            time: message.time.format(TIME_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreatedDto {
    pub id: Uuid,
}

impl From<MessageId> for MessageCreatedDto {
    fn from(id: MessageId) -> Self {
        Self { id: id.into() }
    }
}
