use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = DateTime<Utc>;

/// 广播收件人，发给所有人的消息和系统状态消息都使用它。
pub const BROADCAST_RECIPIENT: &str = "Todos";

/// 旧客户端使用的广播收件人别名。
pub const BROADCAST_ALIASES: [&str; 2] = [BROADCAST_RECIPIENT, "All"];

/// 消息唯一标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<MessageId> for Uuid {
    fn from(value: MessageId) -> Self {
        value.0
    }
}

impl FromStr for MessageId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| DomainError::MessageNotFound)
    }
}

/// 经过验证的参与者名字，区分大小写。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(DomainError::invalid_name("name cannot be empty"));
        }
        // 广播标记不能作为名字，否则无法给这个人发私聊
        if BROADCAST_ALIASES.contains(&value.as_str()) {
            return Err(DomainError::invalid_name(format!("{value} is reserved")));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ParticipantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 消息收件人：广播标记或某个参与者的名字。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient(String);

impl Recipient {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(DomainError::invalid_payload("to", "cannot be empty"));
        }
        Ok(Self(value))
    }

    pub fn broadcast() -> Self {
        Self(BROADCAST_RECIPIENT.to_owned())
    }

    pub fn is_broadcast(&self) -> bool {
        BROADCAST_ALIASES.contains(&self.0.as_str())
    }

    /// 非广播收件人对应的参与者名字
    pub fn participant(&self) -> Option<ParticipantName> {
        if self.is_broadcast() {
            return None;
        }
        ParticipantName::parse(self.0.clone()).ok()
    }

    pub fn is(&self, name: &ParticipantName) -> bool {
        self.0 == name.as_str()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 消息正文内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(DomainError::invalid_payload("text", "cannot be empty"));
        }
        Ok(Self(value))
    }

    /// 系统消息的固定文本
    pub(crate) fn system(text: &'static str) -> Self {
        Self(text.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
