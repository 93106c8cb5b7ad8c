//! 领域模型错误定义
//!
//! 定义了系统中所有可能的错误类型，提供清晰的错误上下文。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 名字为空或只包含空白
    #[error("invalid name: {reason}")]
    InvalidName { reason: String },

    /// 名字已被在线参与者占用
    #[error("name already registered: {name}")]
    DuplicateName { name: String },

    /// 请求体字段不合法
    #[error("invalid payload: {field}: {reason}")]
    InvalidPayload { field: String, reason: String },

    /// 查询者当前不在聊天室
    #[error("unknown participant: {name}")]
    UnknownParticipant { name: String },

    /// 发送者当前不在聊天室
    #[error("unknown sender: {name}")]
    UnknownSender { name: String },

    #[error("message not found")]
    MessageNotFound,

    /// 非消息作者尝试修改或删除
    #[error("only the author can change this message")]
    Forbidden,
}

impl DomainError {
    pub fn invalid_name(reason: impl Into<String>) -> Self {
        Self::InvalidName {
            reason: reason.into(),
        }
    }

    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    pub fn invalid_payload(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_participant(name: impl Into<String>) -> Self {
        Self::UnknownParticipant { name: name.into() }
    }

    pub fn unknown_sender(name: impl Into<String>) -> Self {
        Self::UnknownSender { name: name.into() }
    }
}

/// 存储层错误
///
/// 参与者表和消息表的实现（内存或数据库）都只返回这几种错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    /// 消息存在，但请求者不是作者
    #[error("requester does not own the record")]
    Forbidden,
    #[error("storage failure: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
