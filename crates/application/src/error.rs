use domain::{DomainError, RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    /// 底层存储不可用（连接失败、超时等）
    #[error("store unavailable: {message}")]
    StoreUnavailable { message: String },
}

impl ApplicationError {
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        ApplicationError::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            ApplicationError::Domain(err) => Some(err),
            ApplicationError::StoreUnavailable { .. } => None,
        }
    }
}

/// 消息表的 NotFound / Forbidden 直接对应领域错误，其余都按存储故障上报。
/// 参与者表的 NotFound / Conflict 含义依赖上下文，由服务自行转换。
impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ApplicationError::Domain(DomainError::MessageNotFound),
            RepositoryError::Forbidden => ApplicationError::Domain(DomainError::Forbidden),
            RepositoryError::Conflict => {
                ApplicationError::store_unavailable("conflicting write rejected by store")
            }
            RepositoryError::Storage { message } => ApplicationError::StoreUnavailable { message },
        }
    }
}
