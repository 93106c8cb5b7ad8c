use application::ApplicationError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_PAYLOAD", message)
    }

    /// 心跳接口对未知参与者返回 404，其余接口返回 422
    pub fn for_heartbeat(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(DomainError::UnknownParticipant { name }) => ApiError::new(
                StatusCode::NOT_FOUND,
                "UNKNOWN_PARTICIPANT",
                format!("{name} is not in the room"),
            ),
            other => other.into(),
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;

        match error {
            AppErr::Domain(err) => {
                let message = err.to_string();
                match err {
                    DomainError::InvalidName { .. } => ApiError::new(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "INVALID_NAME",
                        message,
                    ),
                    DomainError::DuplicateName { .. } => {
                        ApiError::new(StatusCode::CONFLICT, "DUPLICATE_NAME", message)
                    }
                    DomainError::InvalidPayload { .. } => ApiError::invalid_payload(message),
                    DomainError::UnknownParticipant { .. } => ApiError::new(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "UNKNOWN_PARTICIPANT",
                        message,
                    ),
                    DomainError::UnknownSender { .. } => ApiError::new(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "UNKNOWN_SENDER",
                        message,
                    ),
                    DomainError::MessageNotFound => {
                        ApiError::new(StatusCode::NOT_FOUND, "MESSAGE_NOT_FOUND", message)
                    }
                    DomainError::Forbidden => {
                        ApiError::new(StatusCode::UNAUTHORIZED, "FORBIDDEN", message)
                    }
                }
            }
            AppErr::StoreUnavailable { message } => {
                tracing::error!(error = %message, "存储不可用");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_UNAVAILABLE",
                    "store unavailable",
                )
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_payload(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
