use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{MessageId, MessageText, ParticipantName, Recipient, Timestamp};

pub const JOIN_TEXT: &str = "entra na sala...";
pub const LEAVE_TEXT: &str = "sai da sala...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Message,
    PrivateMessage,
    /// 系统生成的进入/离开消息，用户不能直接提交
    Status,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// 公开消息和状态消息对所有人可见
    pub fn is_public(&self) -> bool {
        matches!(self, MessageKind::Message | MessageKind::Status)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(MessageKind::Message),
            "private_message" => Ok(MessageKind::PrivateMessage),
            "status" => Ok(MessageKind::Status),
            other => Err(DomainError::invalid_payload(
                "type",
                format!("unknown message type {other}"),
            )),
        }
    }
}

/// 用户可以修改的字段：收件人、正文、类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEdit {
    pub to: Recipient,
    pub text: MessageText,
    pub kind: MessageKind,
}

impl MessageEdit {
    /// 校验用户提交的字段组合
    pub fn new(to: Recipient, text: MessageText, kind: MessageKind) -> Result<Self, DomainError> {
        match kind {
            MessageKind::Status => {
                return Err(DomainError::invalid_payload(
                    "type",
                    "status messages are system generated",
                ))
            }
            MessageKind::PrivateMessage if to.is_broadcast() => {
                return Err(DomainError::invalid_payload(
                    "to",
                    "private messages need a concrete recipient",
                ))
            }
            _ => {}
        }
        Ok(Self { to, text, kind })
    }
}

/// 尚未入库的消息，id 由存储分配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from: ParticipantName,
    pub to: Recipient,
    pub text: MessageText,
    pub kind: MessageKind,
    pub time: Timestamp,
}

impl NewMessage {
    pub fn authored(from: ParticipantName, content: MessageEdit, now: Timestamp) -> Self {
        Self {
            from,
            to: content.to,
            text: content.text,
            kind: content.kind,
            time: now,
        }
    }

    pub fn joined(name: ParticipantName, now: Timestamp) -> Self {
        Self::status(name, JOIN_TEXT, now)
    }

    pub fn left(name: ParticipantName, now: Timestamp) -> Self {
        Self::status(name, LEAVE_TEXT, now)
    }

    fn status(name: ParticipantName, text: &'static str, now: Timestamp) -> Self {
        Self {
            from: name,
            to: Recipient::broadcast(),
            text: MessageText::system(text),
            kind: MessageKind::Status,
            time: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: ParticipantName,
    pub to: Recipient,
    pub text: MessageText,
    pub kind: MessageKind,
    pub time: Timestamp,
}

impl Message {
    pub fn stored(id: MessageId, draft: NewMessage) -> Self {
        Self {
            id,
            from: draft.from,
            to: draft.to,
            text: draft.text,
            kind: draft.kind,
            time: draft.time,
        }
    }

    /// 私聊只对发送者和收件人可见
    pub fn is_visible_to(&self, name: &ParticipantName) -> bool {
        self.kind.is_public() || &self.from == name || self.to.is(name)
    }

    pub fn is_owned_by(&self, name: &str) -> bool {
        self.from.as_str() == name
    }

    /// id、from、time 不可变
    pub fn apply(&mut self, edit: MessageEdit) {
        self.to = edit.to;
        self.text = edit.text;
        self.kind = edit.kind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn name(value: &str) -> ParticipantName {
        ParticipantName::parse(value).unwrap()
    }

    fn private(from: &str, to: &str) -> Message {
        let edit = MessageEdit::new(
            Recipient::parse(to).unwrap(),
            MessageText::new("secret").unwrap(),
            MessageKind::PrivateMessage,
        )
        .unwrap();
        Message::stored(
            MessageId::generate(),
            NewMessage::authored(name(from), edit, Utc::now()),
        )
    }

    #[test]
    fn private_message_visible_only_to_sender_and_recipient() {
        let message = private("Alice", "Bob");

        assert!(message.is_visible_to(&name("Alice")));
        assert!(message.is_visible_to(&name("Bob")));
        assert!(!message.is_visible_to(&name("Carol")));
    }

    #[test]
    fn status_messages_are_broadcast() {
        let message = Message::stored(MessageId::generate(), NewMessage::left(name("Bob"), Utc::now()));

        assert_eq!(message.kind, MessageKind::Status);
        assert_eq!(message.text.as_str(), LEAVE_TEXT);
        assert!(message.to.is_broadcast());
        assert!(message.is_visible_to(&name("Carol")));
    }

    #[test]
    fn users_cannot_submit_status_messages() {
        let err = MessageEdit::new(
            Recipient::broadcast(),
            MessageText::new("hi").unwrap(),
            MessageKind::Status,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidPayload { .. }));
    }

    #[test]
    fn private_message_to_broadcast_is_rejected() {
        let err = MessageEdit::new(
            Recipient::parse("All").unwrap(),
            MessageText::new("hi").unwrap(),
            MessageKind::PrivateMessage,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid_payload("to", "private messages need a concrete recipient")
        );
    }

    #[test]
    fn apply_keeps_identity_fields() {
        let mut message = private("Alice", "Bob");
        let id = message.id;
        let time = message.time;
        let edit = MessageEdit::new(
            Recipient::broadcast(),
            MessageText::new("now public").unwrap(),
            MessageKind::Message,
        )
        .unwrap();

        message.apply(edit);

        assert_eq!(message.id, id);
        assert_eq!(message.time, time);
        assert_eq!(message.from, name("Alice"));
        assert_eq!(message.kind, MessageKind::Message);
        assert_eq!(message.text.as_str(), "now public");
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [MessageKind::Message, MessageKind::PrivateMessage, MessageKind::Status] {
            assert_eq!(kind.as_str().parse::<MessageKind>().unwrap(), kind);
        }
        assert!("shout".parse::<MessageKind>().is_err());
    }
}
